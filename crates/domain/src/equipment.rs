//! Equipment — a machine or installation that maintenance tasks target.

use serde::{Deserialize, Serialize};

use crate::error::{CmmsError, ValidationError};
use crate::id::{EquipmentId, EquipmentTypeId};

/// A piece of equipment. The engine treats it as immutable input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Equipment {
    pub id: EquipmentId,
    pub name: String,
    pub equipment_type_id: Option<EquipmentTypeId>,
}

impl Equipment {
    /// Create a builder for constructing an [`Equipment`].
    #[must_use]
    pub fn builder() -> EquipmentBuilder {
        EquipmentBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), CmmsError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Equipment`].
#[derive(Debug, Default)]
pub struct EquipmentBuilder {
    id: Option<EquipmentId>,
    name: Option<String>,
    equipment_type_id: Option<EquipmentTypeId>,
}

impl EquipmentBuilder {
    #[must_use]
    pub fn id(mut self, id: EquipmentId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn equipment_type_id(mut self, equipment_type_id: EquipmentTypeId) -> Self {
        self.equipment_type_id = Some(equipment_type_id);
        self
    }

    /// Consume the builder, validate, and return an [`Equipment`].
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Equipment, CmmsError> {
        let equipment = Equipment {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            equipment_type_id: self.equipment_type_id,
        };
        equipment.validate()?;
        Ok(equipment)
    }
}
