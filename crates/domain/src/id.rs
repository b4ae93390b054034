//! Typed identifiers.
//!
//! Every record is keyed by a random UUID. Each kind of record gets its own
//! newtype so a task id can never be handed where a field object id is
//! expected. Ids serialize as the bare hyphenated UUID string, which is also
//! how they are stored and how condition values reference source field
//! objects.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A text that is not a valid identifier for `entity`.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("`{raw}` is not a valid {entity} id")]
pub struct IdParseError {
    pub entity: &'static str,
    pub raw: String,
}

macro_rules! define_id {
    ($(#[doc = $doc:expr])* $name:ident => $entity:literal) => {
        $(#[doc = $doc])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(uuid::Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl $name {
            /// Human name of the identified record, used in error messages.
            pub const ENTITY: &'static str = $entity;

            /// Generate a new random identifier.
            #[must_use]
            pub fn new() -> Self {
                Self::default()
            }

            #[must_use]
            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub fn as_uuid(self) -> uuid::Uuid {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }

        impl FromStr for $name {
            type Err = IdParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s.trim())
                    .map(Self)
                    .map_err(|_| IdParseError {
                        entity: $entity,
                        raw: s.to_string(),
                    })
            }
        }
    };
}

define_id!(
    /// Identifies an [`Equipment`](crate::equipment::Equipment).
    EquipmentId => "equipment"
);

define_id!(EquipmentTypeId => "equipment type");

define_id!(
    /// Identifies a [`Field`](crate::field::Field) of the catalog.
    FieldId => "field"
);

define_id!(
    /// Identifies a canonical enumeration value of a field.
    FieldValueId => "field value"
);

define_id!(
    /// Identifies a [`FieldObject`](crate::field_object::FieldObject). Also the
    /// `source` part of threshold and frequency conditions.
    FieldObjectId => "field object"
);

define_id!(
    /// Identifies a [`Task`](crate::task::Task).
    TaskId => "task"
);

define_id!(
    /// Identifies a [`DataProvider`](crate::data_provider::DataProvider).
    DataProviderId => "data provider"
);

define_id!(TeamId => "team");

define_id!(FileId => "file");

define_id!(UserId => "user");
