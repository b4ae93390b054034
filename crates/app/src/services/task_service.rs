//! Task service — use-cases for managing tasks and their field objects.

use cmms_domain::error::{CmmsError, ConfigInvalidError, InvariantViolation, NotFoundError};
use cmms_domain::field::{FieldCatalog, FieldRole};
use cmms_domain::field_object::{FieldObject, Owner};
use cmms_domain::id::TaskId;
use cmms_domain::task::Task;
use cmms_domain::trigger::TriggerCondition;

use crate::completion::{CompletionOutcome, TaskCompletion};
use crate::ports::{Clock, FieldObjectRepository, FieldRepository, TaskRepository};

/// Application service for task CRUD and completion.
pub struct TaskService<TR, FR, FOR, C> {
    tasks: TR,
    fields: FR,
    field_objects: FOR,
    completion: TaskCompletion<TR, FR, FOR, C>,
}

impl<TR, FR, FOR, C> TaskService<TR, FR, FOR, C>
where
    TR: TaskRepository + Clone,
    FR: FieldRepository + Clone,
    FOR: FieldObjectRepository + Clone,
    C: Clock,
{
    /// Create a new service backed by the given repositories.
    pub fn new(tasks: TR, fields: FR, field_objects: FOR, clock: C) -> Self {
        let completion =
            TaskCompletion::new(tasks.clone(), fields.clone(), field_objects.clone(), clock);
        Self {
            tasks,
            fields,
            field_objects,
            completion,
        }
    }

    /// Create a new task after validating domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Validation`] if invariants fail, or a
    /// storage error propagated from the repository.
    #[tracing::instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn create_task(&self, task: Task) -> Result<Task, CmmsError> {
        task.validate()?;
        self.tasks.create(task).await
    }

    /// Look up a task by id, returning an error if not found.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::NotFound`] when no task with `id` exists,
    /// or a storage error from the repository.
    pub async fn get_task(&self, id: TaskId) -> Result<Task, CmmsError> {
        self.tasks.get_by_id(id).await?.ok_or_else(|| {
            NotFoundError {
                entity: "Task",
                id: id.to_string(),
            }
            .into()
        })
    }

    /// List all tasks.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn list_tasks(&self) -> Result<Vec<Task>, CmmsError> {
        self.tasks.get_all().await
    }

    /// Update an existing task.
    ///
    /// The stored `over` flag is never written back. An update asking for
    /// `over` goes through [`complete_task`](Self::complete_task) once the
    /// other changes are saved, so a finished task cannot be reopened and a
    /// completion is never repeated.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::NotFound`] if the task does not exist,
    /// [`CmmsError::Validation`] if invariants fail, or a storage error.
    #[tracing::instrument(skip(self, task), fields(task_id = %task.id))]
    pub async fn update_task(&self, task: Task) -> Result<Task, CmmsError> {
        task.validate()?;
        let id = task.id;
        let completes = task.over;
        let saved = self.tasks.update(task).await?;
        if !completes || saved.over {
            return Ok(saved);
        }

        self.complete_task(id).await?;
        self.get_task(id).await
    }

    /// Mark a task over, spawning its successor when it recurs.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::NotFound`] if the task does not exist, or a
    /// storage error from the repositories.
    pub async fn complete_task(&self, id: TaskId) -> Result<CompletionOutcome, CmmsError> {
        self.completion.complete(id).await
    }

    /// Delete a task and the field objects it owns.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    #[tracing::instrument(skip(self))]
    pub async fn delete_task(&self, id: TaskId) -> Result<(), CmmsError> {
        self.tasks.delete(id).await
    }

    /// Attach a field object to a task or an equipment.
    ///
    /// Condition fields may only be owned by a task, and trigger condition
    /// values must follow the grammar of their kind.
    ///
    /// # Errors
    ///
    /// Returns [`CmmsError::Invariant`] if the field or the owning task does
    /// not exist, [`CmmsError::Validation`] for a condition owned by an
    /// equipment, [`CmmsError::InvalidConfig`] for a malformed trigger value,
    /// or a storage error.
    #[tracing::instrument(skip(self, field_object), fields(field_object_id = %field_object.id))]
    pub async fn attach_field_object(
        &self,
        field_object: FieldObject,
    ) -> Result<FieldObject, CmmsError> {
        let catalog = FieldCatalog::new(self.fields.get_all().await?);
        let field = catalog
            .get(field_object.field_id)
            .ok_or_else(|| InvariantViolation::MissingField(field_object.field_id.to_string()))?;
        field_object.validate_owner(field)?;

        if let Owner::Task(task_id) = field_object.owner {
            self.get_task(task_id).await?;
        }
        if let Some(FieldRole::Trigger(kind)) = catalog.role(field.id) {
            TriggerCondition::parse(kind, &field_object.value)
                .map_err(ConfigInvalidError::Condition)?;
        }
        self.field_objects.create(field_object).await
    }

    /// Field objects owned by a task, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns a storage error propagated from the repository.
    pub async fn task_field_objects(&self, id: TaskId) -> Result<Vec<FieldObject>, CmmsError> {
        self.field_objects.find_by_owner(Owner::Task(id)).await
    }
}
