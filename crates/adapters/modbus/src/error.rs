//! Modbus adapter error types.

use cmms_domain::error::AcquisitionError;

/// Errors specific to the Modbus adapter.
#[derive(Debug, thiserror::Error)]
pub enum ModbusError {
    /// The endpoint is blank or cannot be addressed.
    #[error("invalid endpoint `{0}`")]
    InvalidEndpoint(String),

    /// Connecting, writing or reading failed.
    #[error("Modbus I/O error")]
    Io(#[from] std::io::Error),

    /// The device did not answer in time.
    #[error("Modbus request timed out after {0} ms")]
    Timeout(u64),

    /// The response could not be decoded.
    #[error("malformed Modbus frame")]
    Frame(#[source] FrameError),

    /// The device answered with an exception code.
    #[error("Modbus exception {code:#04x} for function {function:#04x}")]
    Exception {
        /// Function code of the request.
        function: u8,
        /// Exception code returned by the device.
        code: u8,
    },
}

/// Details about why a response frame could not be decoded.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum FrameError {
    /// The MBAP length field is outside the valid range.
    #[error("invalid MBAP length {0}")]
    InvalidLength(u16),

    /// The protocol identifier is not Modbus.
    #[error("unexpected protocol id {0}")]
    ProtocolId(u16),

    /// The response answers another request.
    #[error("transaction id {actual} does not match request {expected}")]
    TransactionMismatch {
        /// Transaction id of the request.
        expected: u16,
        /// Transaction id found in the response.
        actual: u16,
    },

    /// The response comes from another unit.
    #[error("unit id {actual} does not match request {expected}")]
    UnitMismatch {
        /// Unit id of the request.
        expected: u8,
        /// Unit id found in the response.
        actual: u8,
    },

    /// The response carries an unexpected function code.
    #[error("unexpected function code {0:#04x}")]
    UnexpectedFunction(u8),

    /// The PDU length does not match its byte count.
    #[error("PDU must be {expected} bytes, got {actual}")]
    WrongLength {
        /// Expected byte count.
        expected: usize,
        /// Actual byte count.
        actual: usize,
    },
}

impl From<FrameError> for ModbusError {
    fn from(err: FrameError) -> Self {
        Self::Frame(err)
    }
}

impl ModbusError {
    /// Convert into an acquisition failure for `endpoint`.
    #[must_use]
    pub fn into_acquisition(self, endpoint: &str) -> AcquisitionError {
        AcquisitionError::AcquisitionFailed {
            endpoint: endpoint.to_string(),
            source: Box::new(self),
        }
    }
}
