//! Modbus/TCP frame codec for the read-holding-registers function.
//!
//! Pure functions over byte slices, no socket needed. Every ADU starts with
//! the 7-byte MBAP header, all fields big-endian:
//!
//! | Offset | Field | Type |
//! |--------|-------|------|
//! | 0–1 | Transaction id | u16 |
//! | 2–3 | Protocol id (always 0) | u16 |
//! | 4–5 | Length of the rest of the frame | u16 |
//! | 6 | Unit id | u8 |

use crate::error::{FrameError, ModbusError};

/// Function code of "Read Holding Registers".
pub const READ_HOLDING_REGISTERS: u8 = 0x03;

/// Size of the MBAP header.
pub const MBAP_HEADER_LEN: usize = 7;

/// Size of a read-holding-registers request ADU.
pub const READ_REQUEST_LEN: usize = 12;

const EXCEPTION_FLAG: u8 = 0x80;
/// Largest PDU allowed by the protocol.
const MAX_PDU_LEN: u16 = 253;

/// Decoded MBAP header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MbapHeader {
    pub transaction_id: u16,
    pub protocol_id: u16,
    /// Byte count of the unit id plus the PDU.
    pub length: u16,
    pub unit_id: u8,
}

impl MbapHeader {
    /// Parse a header, rejecting foreign protocols and impossible lengths.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::ProtocolId`] or [`FrameError::InvalidLength`].
    pub fn parse(bytes: [u8; MBAP_HEADER_LEN]) -> Result<Self, FrameError> {
        let header = Self {
            transaction_id: u16::from_be_bytes([bytes[0], bytes[1]]),
            protocol_id: u16::from_be_bytes([bytes[2], bytes[3]]),
            length: u16::from_be_bytes([bytes[4], bytes[5]]),
            unit_id: bytes[6],
        };
        if header.protocol_id != 0 {
            return Err(FrameError::ProtocolId(header.protocol_id));
        }
        if header.length < 2 || header.length > MAX_PDU_LEN + 1 {
            return Err(FrameError::InvalidLength(header.length));
        }
        Ok(header)
    }

    /// Number of PDU bytes following the header.
    #[must_use]
    pub fn pdu_len(&self) -> usize {
        usize::from(self.length - 1)
    }

    /// Check that this header answers the given request.
    ///
    /// # Errors
    ///
    /// Returns [`FrameError::TransactionMismatch`] or
    /// [`FrameError::UnitMismatch`].
    pub fn check_reply_to(&self, transaction_id: u16, unit_id: u8) -> Result<(), FrameError> {
        if self.transaction_id != transaction_id {
            return Err(FrameError::TransactionMismatch {
                expected: transaction_id,
                actual: self.transaction_id,
            });
        }
        if self.unit_id != unit_id {
            return Err(FrameError::UnitMismatch {
                expected: unit_id,
                actual: self.unit_id,
            });
        }
        Ok(())
    }
}

/// Encode a read-holding-registers request ADU.
#[must_use]
pub fn encode_read_request(
    transaction_id: u16,
    unit_id: u8,
    register: u16,
    quantity: u16,
) -> [u8; READ_REQUEST_LEN] {
    let mut frame = [0u8; READ_REQUEST_LEN];
    frame[0..2].copy_from_slice(&transaction_id.to_be_bytes());
    // protocol id stays 0
    frame[4..6].copy_from_slice(&6u16.to_be_bytes());
    frame[6] = unit_id;
    frame[7] = READ_HOLDING_REGISTERS;
    frame[8..10].copy_from_slice(&register.to_be_bytes());
    frame[10..12].copy_from_slice(&quantity.to_be_bytes());
    frame
}

/// Decode the PDU of a read-holding-registers response.
///
/// | Offset | Field | Type |
/// |--------|-------|------|
/// | 0 | Function code | u8 |
/// | 1 | Byte count | u8 |
/// | 2.. | Register values | u16 BE each |
///
/// An exception response carries the function code with its high bit set
/// followed by a single exception code.
///
/// # Errors
///
/// Returns [`ModbusError::Exception`] when the device reports an exception
/// and [`ModbusError::Frame`] when the PDU is malformed.
pub fn decode_read_response(pdu: &[u8], quantity: u16) -> Result<Vec<u16>, ModbusError> {
    let Some(&function) = pdu.first() else {
        return Err(FrameError::WrongLength {
            expected: 2,
            actual: 0,
        }
        .into());
    };

    if function == READ_HOLDING_REGISTERS | EXCEPTION_FLAG {
        return match pdu {
            [_, code] => Err(ModbusError::Exception {
                function: READ_HOLDING_REGISTERS,
                code: *code,
            }),
            _ => Err(FrameError::WrongLength {
                expected: 2,
                actual: pdu.len(),
            }
            .into()),
        };
    }
    if function != READ_HOLDING_REGISTERS {
        return Err(FrameError::UnexpectedFunction(function).into());
    }

    let data_len = usize::from(quantity) * 2;
    let expected = data_len + 2;
    if pdu.len() != expected || usize::from(pdu[1]) != data_len {
        return Err(FrameError::WrongLength {
            expected,
            actual: pdu.len(),
        }
        .into());
    }

    Ok(pdu[2..]
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
        .collect())
}
