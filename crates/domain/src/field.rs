//! Field — a named attribute template belonging to a field group.
//!
//! Two groups are reserved by name. The children of [`TRIGGER_CONDITIONS`]
//! enumerate the trigger kinds understood by the engine, the children of
//! [`END_CONDITIONS`] enumerate how a user completes a task.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CmmsError, ValidationError};
use crate::id::FieldId;
use crate::trigger::TriggerKind;

/// Name of the reserved group whose fields are trigger conditions.
pub const TRIGGER_CONDITIONS: &str = "Trigger Conditions";

/// Name of the reserved group whose fields are end conditions.
pub const END_CONDITIONS: &str = "End Conditions";

/// An attribute template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub id: FieldId,
    pub name: String,
    /// Name of the field group this field belongs to.
    pub group: String,
}

impl Field {
    /// Create a field in the given group.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] when `name` is empty.
    pub fn new(name: impl Into<String>, group: impl Into<String>) -> Result<Self, CmmsError> {
        let field = Self {
            id: FieldId::new(),
            name: name.into(),
            group: group.into(),
        };
        if field.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(field)
    }

    /// Whether this field belongs to one of the reserved condition groups.
    #[must_use]
    pub fn is_condition(&self) -> bool {
        self.group == TRIGGER_CONDITIONS || self.group == END_CONDITIONS
    }
}

/// How a task is completed by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndConditionKind {
    Checkbox,
    Numeric,
    Description,
    Photo,
}

impl EndConditionKind {
    /// All kinds, in catalog order.
    pub const ALL: [Self; 4] = [Self::Checkbox, Self::Numeric, Self::Description, Self::Photo];

    /// Name of the field in the `End Conditions` group.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Checkbox => "Checkbox",
            Self::Numeric => "Numeric Value",
            Self::Description => "Description",
            Self::Photo => "Photo",
        }
    }

    /// Resolve a field name of the `End Conditions` group.
    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.field_name() == name)
    }
}

impl fmt::Display for EndConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// What a field means to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldRole {
    /// A recognised trigger condition kind.
    Trigger(TriggerKind),
    /// A recognised end condition kind.
    End(EndConditionKind),
    /// A field of a reserved group whose name is not recognised.
    UnknownCondition,
    /// Any other attribute.
    Attribute,
}

/// Lookup table from field ids to their role.
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    fields: HashMap<FieldId, Field>,
}

impl FieldCatalog {
    /// Build a catalog from every known field.
    #[must_use]
    pub fn new(fields: impl IntoIterator<Item = Field>) -> Self {
        Self {
            fields: fields.into_iter().map(|f| (f.id, f)).collect(),
        }
    }

    /// Look up a field by id.
    #[must_use]
    pub fn get(&self, id: FieldId) -> Option<&Field> {
        self.fields.get(&id)
    }

    /// Find the field of the given group with the given name.
    #[must_use]
    pub fn find(&self, group: &str, name: &str) -> Option<&Field> {
        self.fields
            .values()
            .find(|f| f.group == group && f.name == name)
    }

    /// Field instantiated by trigger conditions of `kind`.
    #[must_use]
    pub fn trigger_field(&self, kind: TriggerKind) -> Option<&Field> {
        self.find(TRIGGER_CONDITIONS, kind.field_name())
    }

    /// Classify a field. Returns `None` when the field is unknown.
    #[must_use]
    pub fn role(&self, id: FieldId) -> Option<FieldRole> {
        let field = self.fields.get(&id)?;
        let role = match field.group.as_str() {
            TRIGGER_CONDITIONS => TriggerKind::from_field_name(&field.name)
                .map_or(FieldRole::UnknownCondition, FieldRole::Trigger),
            END_CONDITIONS => EndConditionKind::from_field_name(&field.name)
                .map_or(FieldRole::UnknownCondition, FieldRole::End),
            _ => FieldRole::Attribute,
        };
        Some(role)
    }

    /// Number of fields in the catalog.
    #[must_use]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// Whether the catalog holds no field.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// The reserved condition fields every installation starts with.
#[must_use]
pub fn reserved_fields() -> Vec<(&'static str, &'static str)> {
    let triggers = TriggerKind::ALL
        .into_iter()
        .map(|kind| (TRIGGER_CONDITIONS, kind.field_name()));
    let ends = EndConditionKind::ALL
        .into_iter()
        .map(|kind| (END_CONDITIONS, kind.field_name()));
    triggers.chain(ends).collect()
}
