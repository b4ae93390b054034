//! Acquisition port — routines reading one scalar from an external source.
//!
//! Routines are looked up by name at run time through the
//! [`AcquisitionRegistry`](crate::acquisition_registry::AcquisitionRegistry),
//! so the trait is object safe.

use std::fmt;

use async_trait::async_trait;
use cmms_domain::error::AcquisitionError;

/// A raw sample. The engine only ever stores its string form.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading {
    Integer(i64),
    Float(f64),
    Text(String),
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
            Self::Text(value) => f.write_str(value),
        }
    }
}

impl From<u16> for Reading {
    fn from(value: u16) -> Self {
        Self::Integer(i64::from(value))
    }
}

impl From<i64> for Reading {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Reading {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

/// A named data-acquisition routine.
#[async_trait]
pub trait AcquisitionRoutine: Send + Sync {
    /// Read the current value at `endpoint`.
    ///
    /// # Errors
    ///
    /// Returns [`AcquisitionError::AcquisitionFailed`] when the endpoint is
    /// unreachable, malformed, or answers with an error.
    async fn get_data(&self, endpoint: &str, port: Option<u16>)
    -> Result<Reading, AcquisitionError>;
}
