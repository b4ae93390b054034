//! DataProvider — a binding between an external endpoint and a FieldObject.
//!
//! A provider names an acquisition routine (`file_name`), the endpoint it
//! reads, and the field object receiving each sample. When activated, the
//! data-provider runtime polls it every `recurrence`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CmmsError, ConfigInvalidError, ValidationError};
use crate::id::{DataProviderId, EquipmentId, FieldObjectId};
use crate::period::Period;

/// Opaque handle of a scheduled job, persisted on the provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    /// Allocate a fresh handle.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for JobId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A polled external value source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataProvider {
    pub id: DataProviderId,
    pub name: String,
    /// Name of the acquisition routine, with or without extension.
    pub file_name: String,
    pub endpoint: String,
    pub port: Option<u16>,
    /// Field object overwritten with every sample.
    pub field_object_id: FieldObjectId,
    pub equipment_id: EquipmentId,
    /// Polling interval, stored as written (`"1m"`, `"2d 4h"`).
    pub recurrence: String,
    pub is_activated: bool,
    pub job_id: Option<JobId>,
}

impl DataProvider {
    /// Create a builder for constructing a [`DataProvider`].
    #[must_use]
    pub fn builder(field_object_id: FieldObjectId, equipment_id: EquipmentId) -> DataProviderBuilder {
        DataProviderBuilder {
            id: None,
            name: None,
            file_name: None,
            endpoint: None,
            port: None,
            field_object_id,
            equipment_id,
            recurrence: String::new(),
            is_activated: false,
            job_id: None,
        }
    }

    /// Check domain invariants.
    ///
    /// The recurrence is not checked here: a stored provider may carry a
    /// malformed one, which only disqualifies it from scheduling.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] when `name`, `file_name` or
    /// `endpoint` is empty.
    pub fn validate(&self) -> Result<(), CmmsError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if self.file_name.is_empty() {
            return Err(ValidationError::EmptyFileName.into());
        }
        if self.endpoint.is_empty() {
            return Err(ValidationError::EmptyEndpoint.into());
        }
        Ok(())
    }

    /// The polling interval.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigInvalidError::Recurrence`] when `recurrence` does not
    /// parse and [`ConfigInvalidError::ZeroRecurrence`] when it parses to an
    /// empty interval.
    pub fn recurrence_period(&self) -> Result<Period, ConfigInvalidError> {
        let period: Period = self
            .recurrence
            .parse()
            .map_err(ConfigInvalidError::Recurrence)?;
        if period.is_zero() {
            return Err(ConfigInvalidError::ZeroRecurrence);
        }
        Ok(period)
    }
}

/// Step-by-step builder for [`DataProvider`].
#[derive(Debug)]
pub struct DataProviderBuilder {
    id: Option<DataProviderId>,
    name: Option<String>,
    file_name: Option<String>,
    endpoint: Option<String>,
    port: Option<u16>,
    field_object_id: FieldObjectId,
    equipment_id: EquipmentId,
    recurrence: String,
    is_activated: bool,
    job_id: Option<JobId>,
}

impl DataProviderBuilder {
    #[must_use]
    pub fn id(mut self, id: DataProviderId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    #[must_use]
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    #[must_use]
    pub fn recurrence(mut self, recurrence: impl Into<String>) -> Self {
        self.recurrence = recurrence.into();
        self
    }

    #[must_use]
    pub fn activated(mut self, is_activated: bool) -> Self {
        self.is_activated = is_activated;
        self
    }

    #[must_use]
    pub fn job_id(mut self, job_id: JobId) -> Self {
        self.job_id = Some(job_id);
        self
    }

    /// Consume the builder, validate, and return a [`DataProvider`].
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] if a required text field is missing.
    pub fn build(self) -> Result<DataProvider, CmmsError> {
        let provider = DataProvider {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            file_name: self.file_name.unwrap_or_default(),
            endpoint: self.endpoint.unwrap_or_default(),
            port: self.port,
            field_object_id: self.field_object_id,
            equipment_id: self.equipment_id,
            recurrence: self.recurrence,
            is_activated: self.is_activated,
            job_id: self.job_id,
        };
        provider.validate()?;
        Ok(provider)
    }
}
