//! # cmms-adapter-modbus
//!
//! Modbus/TCP acquisition routine. Reads one 16-bit holding register from a
//! device and hands it to the data-provider runtime as an integer reading.
//!
//! ## How it works
//!
//! Each `get_data` call opens a connection to `(endpoint, port)`, sends a
//! single "Read Holding Registers" request for the configured unit and
//! register, and decodes the answer. The whole exchange is bounded by the
//! configured timeout. Connections are not pooled: providers poll on the
//! scale of minutes.
//!
//! ## Dependency rule
//!
//! Same as other adapters: depends on `cmms-app` and `cmms-domain`.

mod config;
mod error;
pub mod frame;

pub use config::{DEFAULT_PORT, ModbusConfig};
pub use error::{FrameError, ModbusError};

use std::sync::atomic::{AtomicU16, Ordering};

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use cmms_app::ports::{AcquisitionRoutine, Reading};
use cmms_domain::error::AcquisitionError;

use crate::frame::{MBAP_HEADER_LEN, MbapHeader, decode_read_response, encode_read_request};

/// Name under which the routine is registered.
pub const ROUTINE_NAME: &str = "modbus_example";

/// Acquisition routine reading a single holding register over Modbus/TCP.
#[derive(Debug)]
pub struct ModbusTcpRoutine {
    config: ModbusConfig,
    next_transaction: AtomicU16,
}

impl ModbusTcpRoutine {
    /// Create a new routine with the given configuration.
    #[must_use]
    pub fn new(config: ModbusConfig) -> Self {
        Self {
            config,
            next_transaction: AtomicU16::new(1),
        }
    }

    /// Read the configured holding register of the device at `(endpoint, port)`.
    ///
    /// # Errors
    ///
    /// Returns [`ModbusError`] when the endpoint is blank, the connection
    /// fails, the device does not answer in time, or the answer is an
    /// exception or a malformed frame.
    pub async fn read_register(&self, endpoint: &str, port: u16) -> Result<u16, ModbusError> {
        let host = endpoint.trim();
        if host.is_empty() {
            return Err(ModbusError::InvalidEndpoint(endpoint.to_string()));
        }
        let transaction_id = self.next_transaction.fetch_add(1, Ordering::Relaxed);
        let unit_id = self.config.unit_id;

        let exchange = async {
            let mut stream = TcpStream::connect((host, port)).await?;
            stream
                .write_all(&encode_read_request(
                    transaction_id,
                    unit_id,
                    self.config.register,
                    1,
                ))
                .await?;

            let mut head = [0u8; MBAP_HEADER_LEN];
            stream.read_exact(&mut head).await?;
            let header = MbapHeader::parse(head)?;
            header.check_reply_to(transaction_id, unit_id)?;

            let mut pdu = vec![0u8; header.pdu_len()];
            stream.read_exact(&mut pdu).await?;
            let values = decode_read_response(&pdu, 1)?;
            Ok::<u16, ModbusError>(values[0])
        };

        tokio::time::timeout(self.config.timeout(), exchange)
            .await
            .map_err(|_| ModbusError::Timeout(self.config.timeout_ms))?
    }
}

#[async_trait]
impl AcquisitionRoutine for ModbusTcpRoutine {
    async fn get_data(
        &self,
        endpoint: &str,
        port: Option<u16>,
    ) -> Result<Reading, AcquisitionError> {
        let port = port.unwrap_or(DEFAULT_PORT);
        match self.read_register(endpoint, port).await {
            Ok(value) => {
                tracing::debug!(endpoint, port, value, "holding register read");
                Ok(Reading::from(value))
            }
            Err(err) => Err(err.into_acquisition(endpoint)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::net::TcpListener;

    /// Serve one connection, answering the request with `reply(request)`.
    async fn fake_server<F>(reply: F) -> u16
    where
        F: FnOnce([u8; frame::READ_REQUEST_LEN]) -> Vec<u8> + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; frame::READ_REQUEST_LEN];
            socket.read_exact(&mut request).await.unwrap();
            let answer = reply(request);
            socket.write_all(&answer).await.unwrap();
            // keep the socket open until the client is done
            let mut rest = Vec::new();
            let _ = socket.read_to_end(&mut rest).await;
        });
        port
    }

    fn answer(request: [u8; frame::READ_REQUEST_LEN], pdu: &[u8]) -> Vec<u8> {
        let length = u16::try_from(pdu.len() + 1).unwrap();
        let mut out = Vec::new();
        out.extend_from_slice(&request[0..2]);
        out.extend_from_slice(&[0, 0]);
        out.extend_from_slice(&length.to_be_bytes());
        out.push(request[6]);
        out.extend_from_slice(pdu);
        out
    }

    fn routine() -> ModbusTcpRoutine {
        ModbusTcpRoutine::new(ModbusConfig {
            timeout_ms: 500,
            ..ModbusConfig::default()
        })
    }

    #[tokio::test]
    async fn should_read_holding_register_from_device() {
        let port = fake_server(|request| {
            assert_eq!(request[6], 1);
            assert_eq!(request[7], frame::READ_HOLDING_REGISTERS);
            answer(request, &[0x03, 0x02, 0x00, 0x11])
        })
        .await;

        let reading = routine().get_data("127.0.0.1", Some(port)).await.unwrap();
        assert_eq!(reading, Reading::Integer(17));
    }

    #[tokio::test]
    async fn should_address_configured_unit_and_register() {
        let port = fake_server(|request| {
            assert_eq!(request[6], 9);
            assert_eq!(u16::from_be_bytes([request[8], request[9]]), 40);
            answer(request, &[0x03, 0x02, 0x01, 0x00])
        })
        .await;
        let routine = ModbusTcpRoutine::new(ModbusConfig {
            unit_id: 9,
            register: 40,
            timeout_ms: 500,
        });

        assert_eq!(routine.read_register("127.0.0.1", port).await.unwrap(), 256);
    }

    #[tokio::test]
    async fn should_fail_when_device_returns_exception() {
        let port = fake_server(|request| answer(request, &[0x83, 0x02])).await;

        let err = routine().read_register("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, ModbusError::Exception { code: 0x02, .. }));
    }

    #[tokio::test]
    async fn should_fail_when_reply_answers_another_transaction() {
        let port = fake_server(|mut request| {
            request[1] = request[1].wrapping_add(1);
            answer(request, &[0x03, 0x02, 0x00, 0x11])
        })
        .await;

        let err = routine().read_register("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(
            err,
            ModbusError::Frame(FrameError::TransactionMismatch { .. })
        ));
    }

    #[tokio::test]
    async fn should_time_out_when_device_stays_silent() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        let routine = ModbusTcpRoutine::new(ModbusConfig {
            timeout_ms: 50,
            ..ModbusConfig::default()
        });

        let err = routine.read_register("127.0.0.1", port).await.unwrap_err();
        assert!(matches!(err, ModbusError::Timeout(50)));
    }

    #[tokio::test]
    async fn should_report_acquisition_failure_when_unreachable() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let err = routine().get_data("127.0.0.1", Some(port)).await.unwrap_err();
        assert!(matches!(
            err,
            AcquisitionError::AcquisitionFailed { ref endpoint, .. } if endpoint == "127.0.0.1"
        ));
    }

    #[tokio::test]
    async fn should_reject_blank_endpoint() {
        let err = routine().read_register("  ", 502).await.unwrap_err();
        assert!(matches!(err, ModbusError::InvalidEndpoint(_)));
    }
}
