//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`CmmsError`]
//! via `From`, so port boundaries only ever speak one error type.

use crate::period::PeriodParseError;
use crate::trigger::ConditionParseError;

/// Base error type shared by every crate of the workspace.
#[derive(Debug, thiserror::Error)]
pub enum CmmsError {
    /// A domain invariant does not hold for the given input.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The requested record does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A recurrence, condition value or routine reference is unusable.
    #[error("invalid configuration")]
    InvalidConfig(#[from] ConfigInvalidError),

    /// An acquisition routine could not be located or failed to read.
    #[error("acquisition error")]
    Acquisition(#[from] AcquisitionError),

    /// The storage backend failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Persisted data references something that does not exist, or a
    /// multi-row write could not complete.
    #[error("invariant violation")]
    Invariant(#[from] InvariantViolation),
}

/// Violations of domain invariants detected at construction or update time.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    /// A name field is empty.
    #[error("name must not be empty")]
    EmptyName,

    /// A data provider does not name an acquisition routine.
    #[error("file name must not be empty")]
    EmptyFileName,

    /// A data provider does not name an endpoint.
    #[error("endpoint must not be empty")]
    EmptyEndpoint,

    /// A condition field object is attached to something other than a task.
    #[error("field `{field}` belongs to `{group}` and may only be owned by a task")]
    ConditionOwnedByEquipment {
        /// Name of the field being instantiated.
        field: String,
        /// Name of the reserved group the field belongs to.
        group: String,
    },
}

/// The requested record could not be found.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("{entity} `{id}` not found")]
pub struct NotFoundError {
    /// Kind of record, e.g. `"Task"`.
    pub entity: &'static str,
    /// Identifier that was looked up.
    pub id: String,
}

/// Configuration that cannot be used as stored.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigInvalidError {
    /// The recurrence of a data provider does not parse.
    #[error("invalid recurrence")]
    Recurrence(#[source] PeriodParseError),

    /// A trigger condition value does not parse.
    #[error("invalid condition value")]
    Condition(#[source] ConditionParseError),

    /// The recurrence parses but describes an empty interval.
    #[error("recurrence must describe a non-zero interval")]
    ZeroRecurrence,
}

/// Failures of the acquisition-routine contract.
#[derive(Debug, thiserror::Error)]
pub enum AcquisitionError {
    /// No routine is registered under the requested name.
    #[error("acquisition routine `{0}` not found")]
    ModuleNotFound(String),

    /// The file name cannot designate a routine.
    #[error("`{0}` is not a valid acquisition routine name")]
    BadModuleShape(String),

    /// The routine ran but could not produce a value.
    #[error("acquisition from `{endpoint}` failed")]
    AcquisitionFailed {
        /// Endpoint the routine tried to read.
        endpoint: String,
        /// Underlying cause.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl AcquisitionError {
    /// Short kind tag used in diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ModuleNotFound(_) => "module-not-found",
            Self::BadModuleShape(_) => "bad-module-shape",
            Self::AcquisitionFailed { .. } => "acquisition-failed",
        }
    }
}

/// Persisted data is inconsistent with what the engine expects.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum InvariantViolation {
    /// A condition names a source field object that does not exist.
    #[error("source field object `{0}` does not exist")]
    MissingSource(String),

    /// A field object references a field that does not exist.
    #[error("field `{0}` does not exist")]
    MissingField(String),

    /// A data provider targets a field object that does not exist.
    #[error("target field object `{0}` does not exist")]
    MissingTarget(String),
}
