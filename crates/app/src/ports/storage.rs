//! Storage port — repository traits for persistence.

use std::future::Future;
use std::sync::Arc;

use cmms_domain::data_provider::{DataProvider, JobId};
use cmms_domain::equipment::Equipment;
use cmms_domain::error::CmmsError;
use cmms_domain::field::Field;
use cmms_domain::field_object::{FieldObject, Owner};
use cmms_domain::id::{DataProviderId, EquipmentId, FieldObjectId, TaskId};
use cmms_domain::task::Task;
use cmms_domain::time::Date;
use cmms_domain::trigger::Successor;

/// Repository for persisting and querying [`Task`]s.
pub trait TaskRepository {
    /// Create a new task in storage.
    fn create(&self, task: Task) -> impl Future<Output = Result<Task, CmmsError>> + Send;

    /// Get a task by its unique identifier.
    fn get_by_id(&self, id: TaskId)
    -> impl Future<Output = Result<Option<Task>, CmmsError>> + Send;

    /// Get all tasks.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Task>, CmmsError>> + Send;

    /// Get every task that is not over, not triggered and not a template.
    fn list_pending(&self) -> impl Future<Output = Result<Vec<Task>, CmmsError>> + Send;

    /// Update an existing task.
    ///
    /// `over` is left as stored: it only changes through
    /// [`complete_and_spawn`](Self::complete_and_spawn).
    fn update(&self, task: Task) -> impl Future<Output = Result<Task, CmmsError>> + Send;

    /// Mark a pending task as triggered and set its deadline.
    ///
    /// Returns `false`, writing nothing, when the task is no longer pending
    /// or no longer exists.
    fn mark_triggered(
        &self,
        id: TaskId,
        end_date: Option<Date>,
    ) -> impl Future<Output = Result<bool, CmmsError>> + Send;

    /// Delete a task and the field objects it owns.
    fn delete(&self, id: TaskId) -> impl Future<Output = Result<(), CmmsError>> + Send;

    /// Flip `over` from false to true and persist `successor`, atomically.
    ///
    /// Returns `false`, writing nothing, when the task was already over.
    fn complete_and_spawn(
        &self,
        id: TaskId,
        successor: Option<Successor>,
    ) -> impl Future<Output = Result<bool, CmmsError>> + Send;
}

/// Repository for persisting and querying [`FieldObject`]s.
pub trait FieldObjectRepository {
    /// Create a new field object in storage.
    fn create(
        &self,
        field_object: FieldObject,
    ) -> impl Future<Output = Result<FieldObject, CmmsError>> + Send;

    /// Get a field object by its unique identifier.
    fn get_by_id(
        &self,
        id: FieldObjectId,
    ) -> impl Future<Output = Result<Option<FieldObject>, CmmsError>> + Send;

    /// Get the field objects of an owner, in insertion order.
    fn find_by_owner(
        &self,
        owner: Owner,
    ) -> impl Future<Output = Result<Vec<FieldObject>, CmmsError>> + Send;

    /// Update an existing field object.
    fn update(
        &self,
        field_object: FieldObject,
    ) -> impl Future<Output = Result<FieldObject, CmmsError>> + Send;

    /// Delete a field object by its unique identifier.
    fn delete(&self, id: FieldObjectId) -> impl Future<Output = Result<(), CmmsError>> + Send;
}

/// Read access to the [`Field`] catalog.
pub trait FieldRepository {
    /// Create a new field in storage.
    fn create(&self, field: Field) -> impl Future<Output = Result<Field, CmmsError>> + Send;

    /// Get all fields.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Field>, CmmsError>> + Send;
}

/// Repository for persisting and querying [`DataProvider`]s.
pub trait DataProviderRepository {
    /// Create a new data provider in storage.
    fn create(
        &self,
        provider: DataProvider,
    ) -> impl Future<Output = Result<DataProvider, CmmsError>> + Send;

    /// Get a data provider by its unique identifier.
    fn get_by_id(
        &self,
        id: DataProviderId,
    ) -> impl Future<Output = Result<Option<DataProvider>, CmmsError>> + Send;

    /// Get all data providers.
    fn get_all(&self) -> impl Future<Output = Result<Vec<DataProvider>, CmmsError>> + Send;

    /// Get every activated data provider.
    fn get_activated(&self) -> impl Future<Output = Result<Vec<DataProvider>, CmmsError>> + Send;

    /// Update an existing data provider.
    fn update(
        &self,
        provider: DataProvider,
    ) -> impl Future<Output = Result<DataProvider, CmmsError>> + Send;

    /// Record the job handle of a provider.
    fn set_job_id(
        &self,
        id: DataProviderId,
        job_id: Option<JobId>,
    ) -> impl Future<Output = Result<(), CmmsError>> + Send;

    /// Delete a data provider by its unique identifier.
    fn delete(&self, id: DataProviderId) -> impl Future<Output = Result<(), CmmsError>> + Send;
}

/// Repository for persisting and querying [`Equipment`].
pub trait EquipmentRepository {
    /// Create a new equipment in storage.
    fn create(
        &self,
        equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CmmsError>> + Send;

    /// Get an equipment by its unique identifier.
    fn get_by_id(
        &self,
        id: EquipmentId,
    ) -> impl Future<Output = Result<Option<Equipment>, CmmsError>> + Send;

    /// Get all equipment.
    fn get_all(&self) -> impl Future<Output = Result<Vec<Equipment>, CmmsError>> + Send;
}

impl<T: TaskRepository + Send + Sync> TaskRepository for Arc<T> {
    fn create(&self, task: Task) -> impl Future<Output = Result<Task, CmmsError>> + Send {
        (**self).create(task)
    }

    fn get_by_id(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<Option<Task>, CmmsError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Task>, CmmsError>> + Send {
        (**self).get_all()
    }

    fn list_pending(&self) -> impl Future<Output = Result<Vec<Task>, CmmsError>> + Send {
        (**self).list_pending()
    }

    fn update(&self, task: Task) -> impl Future<Output = Result<Task, CmmsError>> + Send {
        (**self).update(task)
    }

    fn mark_triggered(
        &self,
        id: TaskId,
        end_date: Option<Date>,
    ) -> impl Future<Output = Result<bool, CmmsError>> + Send {
        (**self).mark_triggered(id, end_date)
    }

    fn delete(&self, id: TaskId) -> impl Future<Output = Result<(), CmmsError>> + Send {
        (**self).delete(id)
    }

    fn complete_and_spawn(
        &self,
        id: TaskId,
        successor: Option<Successor>,
    ) -> impl Future<Output = Result<bool, CmmsError>> + Send {
        (**self).complete_and_spawn(id, successor)
    }
}

impl<T: FieldObjectRepository + Send + Sync> FieldObjectRepository for Arc<T> {
    fn create(
        &self,
        field_object: FieldObject,
    ) -> impl Future<Output = Result<FieldObject, CmmsError>> + Send {
        (**self).create(field_object)
    }

    fn get_by_id(
        &self,
        id: FieldObjectId,
    ) -> impl Future<Output = Result<Option<FieldObject>, CmmsError>> + Send {
        (**self).get_by_id(id)
    }

    fn find_by_owner(
        &self,
        owner: Owner,
    ) -> impl Future<Output = Result<Vec<FieldObject>, CmmsError>> + Send {
        (**self).find_by_owner(owner)
    }

    fn update(
        &self,
        field_object: FieldObject,
    ) -> impl Future<Output = Result<FieldObject, CmmsError>> + Send {
        (**self).update(field_object)
    }

    fn delete(&self, id: FieldObjectId) -> impl Future<Output = Result<(), CmmsError>> + Send {
        (**self).delete(id)
    }
}

impl<T: FieldRepository + Send + Sync> FieldRepository for Arc<T> {
    fn create(&self, field: Field) -> impl Future<Output = Result<Field, CmmsError>> + Send {
        (**self).create(field)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Field>, CmmsError>> + Send {
        (**self).get_all()
    }
}

impl<T: DataProviderRepository + Send + Sync> DataProviderRepository for Arc<T> {
    fn create(
        &self,
        provider: DataProvider,
    ) -> impl Future<Output = Result<DataProvider, CmmsError>> + Send {
        (**self).create(provider)
    }

    fn get_by_id(
        &self,
        id: DataProviderId,
    ) -> impl Future<Output = Result<Option<DataProvider>, CmmsError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<DataProvider>, CmmsError>> + Send {
        (**self).get_all()
    }

    fn get_activated(&self) -> impl Future<Output = Result<Vec<DataProvider>, CmmsError>> + Send {
        (**self).get_activated()
    }

    fn update(
        &self,
        provider: DataProvider,
    ) -> impl Future<Output = Result<DataProvider, CmmsError>> + Send {
        (**self).update(provider)
    }

    fn set_job_id(
        &self,
        id: DataProviderId,
        job_id: Option<JobId>,
    ) -> impl Future<Output = Result<(), CmmsError>> + Send {
        (**self).set_job_id(id, job_id)
    }

    fn delete(&self, id: DataProviderId) -> impl Future<Output = Result<(), CmmsError>> + Send {
        (**self).delete(id)
    }
}

impl<T: EquipmentRepository + Send + Sync> EquipmentRepository for Arc<T> {
    fn create(
        &self,
        equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CmmsError>> + Send {
        (**self).create(equipment)
    }

    fn get_by_id(
        &self,
        id: EquipmentId,
    ) -> impl Future<Output = Result<Option<Equipment>, CmmsError>> + Send {
        (**self).get_by_id(id)
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Equipment>, CmmsError>> + Send {
        (**self).get_all()
    }
}
