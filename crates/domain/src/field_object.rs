//! FieldObject — an attribute instance owned by an equipment or a task.
//!
//! The owner is stored as the pair `(owner_kind, owner_id)`; [`Owner`] is the
//! typed view of that pair. The meaning of `value` depends on the
//! [`Field`](crate::field::Field) being instantiated.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{CmmsError, ValidationError};
use crate::field::Field;
use crate::id::{EquipmentId, FieldId, FieldObjectId, FieldValueId, TaskId};

/// Storage tag of an owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OwnerKind {
    Equipment,
    Task,
}

impl OwnerKind {
    /// Short tag persisted next to the owner id.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Self::Equipment => "equipment",
            Self::Task => "task",
        }
    }
}

impl fmt::Display for OwnerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Unknown owner tag.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("unknown owner kind `{0}`")]
pub struct UnknownOwnerKind(pub String);

impl FromStr for OwnerKind {
    type Err = UnknownOwnerKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "equipment" => Ok(Self::Equipment),
            "task" => Ok(Self::Task),
            other => Err(UnknownOwnerKind(other.to_string())),
        }
    }
}

/// The record a field object is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "lowercase")]
pub enum Owner {
    Equipment(EquipmentId),
    Task(TaskId),
}

impl Owner {
    #[must_use]
    pub fn kind(self) -> OwnerKind {
        match self {
            Self::Equipment(_) => OwnerKind::Equipment,
            Self::Task(_) => OwnerKind::Task,
        }
    }

    /// The owner id, untyped.
    #[must_use]
    pub fn uuid(self) -> uuid::Uuid {
        match self {
            Self::Equipment(id) => id.as_uuid(),
            Self::Task(id) => id.as_uuid(),
        }
    }

    /// Rebuild an owner from its storage pair.
    #[must_use]
    pub fn from_parts(kind: OwnerKind, id: uuid::Uuid) -> Self {
        match kind {
            OwnerKind::Equipment => Self::Equipment(EquipmentId::from_uuid(id)),
            OwnerKind::Task => Self::Task(TaskId::from_uuid(id)),
        }
    }
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.uuid())
    }
}

/// A polymorphic attribute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldObject {
    pub id: FieldObjectId,
    pub owner: Owner,
    pub field_id: FieldId,
    pub value: String,
    pub field_value_id: Option<FieldValueId>,
    pub description: Option<String>,
}

impl FieldObject {
    /// Create a builder for constructing a [`FieldObject`].
    #[must_use]
    pub fn builder(owner: Owner, field_id: FieldId) -> FieldObjectBuilder {
        FieldObjectBuilder {
            id: None,
            owner,
            field_id,
            value: String::new(),
            field_value_id: None,
            description: None,
        }
    }

    /// Check that the owner is allowed for the instantiated field.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::ConditionOwnedByEquipment`] when a field of a
    /// reserved condition group is attached to an equipment.
    pub fn validate_owner(&self, field: &Field) -> Result<(), CmmsError> {
        if field.is_condition() && self.owner.kind() != OwnerKind::Task {
            return Err(ValidationError::ConditionOwnedByEquipment {
                field: field.name.clone(),
                group: field.group.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Copy this field object onto another owner under a fresh id.
    #[must_use]
    pub fn copy_to(&self, owner: Owner) -> Self {
        Self {
            id: FieldObjectId::new(),
            owner,
            ..self.clone()
        }
    }
}

/// Step-by-step builder for [`FieldObject`].
#[derive(Debug)]
pub struct FieldObjectBuilder {
    id: Option<FieldObjectId>,
    owner: Owner,
    field_id: FieldId,
    value: String,
    field_value_id: Option<FieldValueId>,
    description: Option<String>,
}

impl FieldObjectBuilder {
    #[must_use]
    pub fn id(mut self, id: FieldObjectId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    #[must_use]
    pub fn field_value_id(mut self, field_value_id: FieldValueId) -> Self {
        self.field_value_id = Some(field_value_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn build(self) -> FieldObject {
        FieldObject {
            id: self.id.unwrap_or_default(),
            owner: self.owner,
            field_id: self.field_id,
            value: self.value,
            field_value_id: self.field_value_id,
            description: self.description,
        }
    }
}
