//! Task — a maintenance work item attached to an equipment.
//!
//! Tasks are created by the CRUD layer or spawned as the successor of a
//! completed recurring task. Templates are prototypes and never trigger.

use serde::{Deserialize, Serialize};

use crate::error::{CmmsError, ValidationError};
use crate::id::{EquipmentId, EquipmentTypeId, FileId, TaskId, TeamId, UserId};
use crate::period::Period;
use crate::time::Date;

/// A maintenance task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: String,
    pub description: String,
    pub end_date: Option<Date>,
    pub duration: Option<Period>,
    pub is_template: bool,
    pub over: bool,
    pub is_triggered: bool,
    pub equipment_id: Option<EquipmentId>,
    pub equipment_type_id: Option<EquipmentTypeId>,
    pub teams: Vec<TeamId>,
    pub files: Vec<FileId>,
    pub created_by: Option<UserId>,
}

impl Task {
    /// Create a builder for constructing a [`Task`].
    #[must_use]
    pub fn builder() -> TaskBuilder {
        TaskBuilder::default()
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

    /// Whether the trigger scheduler should evaluate this task.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        !self.over && !self.is_triggered && !self.is_template
    }

    /// Build the next occurrence of this task.
    ///
    /// The successor shares everything the user configured and starts fresh:
    /// not triggered, not over, no deadline.
    #[must_use]
    pub fn successor(&self) -> Self {
        Self {
            id: TaskId::new(),
            end_date: None,
            is_template: false,
            over: false,
            is_triggered: false,
            ..self.clone()
        }
    }
}

/// Step-by-step builder for [`Task`].
#[derive(Debug, Default)]
pub struct TaskBuilder {
    id: Option<TaskId>,
    name: Option<String>,
    description: Option<String>,
    end_date: Option<Date>,
    duration: Option<Period>,
    is_template: bool,
    over: bool,
    is_triggered: bool,
    equipment_id: Option<EquipmentId>,
    equipment_type_id: Option<EquipmentTypeId>,
    teams: Vec<TeamId>,
    files: Vec<FileId>,
    created_by: Option<UserId>,
}

impl TaskBuilder {
    #[must_use]
    pub fn id(mut self, id: TaskId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn end_date(mut self, end_date: Date) -> Self {
        self.end_date = Some(end_date);
        self
    }

    #[must_use]
    pub fn duration(mut self, duration: Period) -> Self {
        self.duration = Some(duration);
        self
    }

    #[must_use]
    pub fn template(mut self, is_template: bool) -> Self {
        self.is_template = is_template;
        self
    }

    #[must_use]
    pub fn over(mut self, over: bool) -> Self {
        self.over = over;
        self
    }

    #[must_use]
    pub fn triggered(mut self, is_triggered: bool) -> Self {
        self.is_triggered = is_triggered;
        self
    }

    #[must_use]
    pub fn equipment_id(mut self, equipment_id: EquipmentId) -> Self {
        self.equipment_id = Some(equipment_id);
        self
    }

    #[must_use]
    pub fn equipment_type_id(mut self, equipment_type_id: EquipmentTypeId) -> Self {
        self.equipment_type_id = Some(equipment_type_id);
        self
    }

    #[must_use]
    pub fn team(mut self, team: TeamId) -> Self {
        self.teams.push(team);
        self
    }

    #[must_use]
    pub fn file(mut self, file: FileId) -> Self {
        self.files.push(file);
        self
    }

    #[must_use]
    pub fn created_by(mut self, user: UserId) -> Self {
        self.created_by = Some(user);
        self
    }

    /// Consume the builder, validate, and return a [`Task`].
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Task, CmmsError> {
        let task = Task {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            description: self.description.unwrap_or_default(),
            end_date: self.end_date,
            duration: self.duration,
            is_template: self.is_template,
            over: self.over,
            is_triggered: self.is_triggered,
            equipment_id: self.equipment_id,
            equipment_type_id: self.equipment_type_id,
            teams: self.teams,
            files: self.files,
            created_by: self.created_by,
        };
        task.validate()?;
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn should_build_pending_task_by_default() {
        let task = Task::builder().name("Grease bearings").build().unwrap();
        assert!(task.is_pending());
        assert!(task.end_date.is_none());
        assert!(task.teams.is_empty());
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Task::builder().build();
        assert!(matches!(
            result,
            Err(CmmsError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_not_be_pending_when_template_triggered_or_over() {
        let template = Task::builder().name("t").template(true).build().unwrap();
        let triggered = Task::builder().name("t").triggered(true).build().unwrap();
        let over = Task::builder().name("t").over(true).build().unwrap();
        assert!(!template.is_pending());
        assert!(!triggered.is_pending());
        assert!(!over.is_pending());
    }

    #[test]
    fn should_copy_configuration_into_successor() {
        let task = Task::builder()
            .name("Replace filter")
            .description("Filter F-12")
            .end_date(date(2024, 5, 1))
            .duration(Period::new(0, 2, 0))
            .equipment_id(EquipmentId::new())
            .team(TeamId::new())
            .file(FileId::new())
            .created_by(UserId::new())
            .triggered(true)
            .over(true)
            .build()
            .unwrap();

        let next = task.successor();
        assert_ne!(next.id, task.id);
        assert_eq!(next.name, task.name);
        assert_eq!(next.description, task.description);
        assert_eq!(next.duration, task.duration);
        assert_eq!(next.equipment_id, task.equipment_id);
        assert_eq!(next.teams, task.teams);
        assert_eq!(next.files, task.files);
        assert_eq!(next.created_by, task.created_by);
        assert!(next.end_date.is_none());
        assert!(!next.is_triggered);
        assert!(!next.over);
        assert!(next.is_pending());
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let task = Task::builder()
            .name("Inspect")
            .end_date(date(2024, 1, 31))
            .duration(Period::new(0, 1, 30))
            .build()
            .unwrap();
        let json = serde_json::to_string(&task).unwrap();
        let parsed: Task = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, task);
    }
}
