//! Condition evaluator — decides whether a task's trigger fires.
//!
//! Loading is separated from deciding: [`ConditionEvaluator`] reads the
//! trigger conditions of a task and the source readings they reference,
//! then [`first_firing`] picks the first condition that fires. Malformed
//! values and unusable readings never fail an evaluation; they are reported
//! and the condition is treated as not firing.

use std::collections::HashMap;

use cmms_domain::error::{CmmsError, InvariantViolation};
use cmms_domain::field::{FieldCatalog, FieldRole};
use cmms_domain::field_object::{FieldObject, Owner};
use cmms_domain::id::{FieldObjectId, TaskId};
use cmms_domain::task::Task;
use cmms_domain::time::Timestamp;
use cmms_domain::trigger::{Firing, ReadingError, TriggerCondition, TriggerEntry};

use crate::ports::{FieldObjectRepository, FieldRepository};

/// The condition field objects of one task, classified.
#[derive(Debug, Clone, Default)]
pub struct TaskConditions {
    /// Trigger conditions, in storage order.
    pub triggers: Vec<TriggerEntry>,
    /// End conditions, in storage order.
    pub end_conditions: Vec<FieldObject>,
}

/// Loads trigger conditions and their readings.
pub struct ConditionEvaluator<FR, FOR> {
    fields: FR,
    field_objects: FOR,
}

impl<FR, FOR> ConditionEvaluator<FR, FOR>
where
    FR: FieldRepository,
    FOR: FieldObjectRepository,
{
    pub fn new(fields: FR, field_objects: FOR) -> Self {
        Self {
            fields,
            field_objects,
        }
    }

    /// Load the field catalog.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn catalog(&self) -> Result<FieldCatalog, CmmsError> {
        Ok(FieldCatalog::new(self.fields.get_all().await?))
    }

    /// Load and classify the condition field objects of a task.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn conditions(
        &self,
        catalog: &FieldCatalog,
        task_id: TaskId,
    ) -> Result<TaskConditions, CmmsError> {
        let owned = self.field_objects.find_by_owner(Owner::Task(task_id)).await?;
        let mut conditions = TaskConditions::default();

        for fo in owned {
            match catalog.role(fo.field_id) {
                Some(FieldRole::Trigger(kind)) => {
                    let condition = match TriggerCondition::parse(kind, &fo.value) {
                        Ok(condition) => Some(condition),
                        Err(err) => {
                            tracing::warn!(
                                task_id = %task_id,
                                field_object_id = %fo.id,
                                kind = %kind,
                                value = %fo.value,
                                error = %err,
                                "skipping malformed trigger condition"
                            );
                            None
                        }
                    };
                    conditions.triggers.push(TriggerEntry {
                        field_object: fo,
                        condition,
                    });
                }
                Some(FieldRole::End(_)) => conditions.end_conditions.push(fo),
                Some(FieldRole::UnknownCondition) => {
                    tracing::debug!(field_object_id = %fo.id, "ignoring unrecognised condition field");
                }
                Some(FieldRole::Attribute) => {}
                None => {
                    let err = InvariantViolation::MissingField(fo.field_id.to_string());
                    tracing::error!(task_id = %task_id, field_object_id = %fo.id, error = %err, "field object references an unknown field");
                }
            }
        }
        Ok(conditions)
    }

    /// Load the current value of every source referenced by `triggers`.
    ///
    /// Missing sources are reported and left out of the result.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn readings(
        &self,
        triggers: &[TriggerEntry],
    ) -> Result<HashMap<FieldObjectId, String>, CmmsError> {
        let mut readings = HashMap::new();
        for source in triggers
            .iter()
            .filter_map(|entry| entry.condition.and_then(|c| c.source()))
        {
            if readings.contains_key(&source) {
                continue;
            }
            match self.field_objects.get_by_id(source).await? {
                Some(fo) => {
                    readings.insert(source, fo.value);
                }
                None => {
                    let err = InvariantViolation::MissingSource(source.to_string());
                    tracing::error!(error = %err, "trigger condition source is missing");
                }
            }
        }
        Ok(readings)
    }

    /// Evaluate the trigger conditions of `task` at instant `now`.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    #[tracing::instrument(skip(self, catalog, task), fields(task_id = %task.id))]
    pub async fn evaluate_with(
        &self,
        catalog: &FieldCatalog,
        task: &Task,
        now: Timestamp,
    ) -> Result<Option<Firing>, CmmsError> {
        let conditions = self.conditions(catalog, task.id).await?;
        let readings = self.readings(&conditions.triggers).await?;
        Ok(first_firing(task, &conditions.triggers, &readings, now))
    }

    /// Evaluate the trigger conditions of `task`, loading the catalog first.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repositories.
    pub async fn evaluate(&self, task: &Task, now: Timestamp) -> Result<Option<Firing>, CmmsError> {
        let catalog = self.catalog().await?;
        self.evaluate_with(&catalog, task, now).await
    }
}

/// The first condition of `triggers` that fires, if any.
///
/// `readings` maps source field objects to their current value.
#[must_use]
pub fn first_firing(
    task: &Task,
    triggers: &[TriggerEntry],
    readings: &HashMap<FieldObjectId, String>,
    now: Timestamp,
) -> Option<Firing> {
    for entry in triggers {
        let Some(condition) = entry.condition else {
            continue;
        };
        let reading = condition
            .source()
            .and_then(|source| readings.get(&source))
            .map(String::as_str);

        match condition.fires(task.end_date, now, reading) {
            Ok(true) => return Some(Firing::new(entry.field_object.id, condition)),
            Ok(false) | Err(ReadingError::Missing(_)) => {}
            Err(err) => {
                tracing::warn!(
                    task_id = %task.id,
                    field_object_id = %entry.field_object.id,
                    error = %err,
                    "condition source is not numeric"
                );
            }
        }
    }
    None
}
