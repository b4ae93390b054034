//! In-memory port implementations shared by the unit tests of this crate.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use cmms_domain::data_provider::{DataProvider, JobId};
use cmms_domain::equipment::Equipment;
use cmms_domain::error::{AcquisitionError, CmmsError, NotFoundError};
use cmms_domain::field::{Field, FieldCatalog, reserved_fields};
use cmms_domain::field_object::{FieldObject, Owner};
use cmms_domain::id::{DataProviderId, EquipmentId, FieldObjectId, TaskId};
use cmms_domain::task::Task;
use cmms_domain::time::{Date, Timestamp};
use cmms_domain::trigger::{Successor, TriggerKind};

use crate::ports::{
    AcquisitionRoutine, Clock, DataProviderRepository, EquipmentRepository, FieldObjectRepository,
    FieldRepository, Reading, TaskRepository,
};

/// Evaluation instant used across the tests: 2024-06-10 09:30 UTC.
pub fn test_now() -> Timestamp {
    Utc.with_ymd_and_hms(2024, 6, 10, 9, 30, 0).unwrap()
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub Timestamp);

impl Default for FixedClock {
    fn default() -> Self {
        Self(test_now())
    }
}

impl Clock for FixedClock {
    fn now(&self) -> Timestamp {
        self.0
    }
}

#[derive(Default)]
struct State {
    tasks: Vec<Task>,
    field_objects: Vec<FieldObject>,
    fields: Vec<Field>,
    providers: HashMap<DataProviderId, DataProvider>,
    equipment: HashMap<EquipmentId, Equipment>,
}

/// One store implementing every repository port, so multi-row writes see
/// a single state.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<State>,
}

impl InMemoryStore {
    /// A store seeded with the reserved condition fields.
    pub fn seeded() -> Self {
        let store = Self::default();
        store.state.lock().unwrap().fields = reserved_fields()
            .into_iter()
            .map(|(group, name)| Field::new(name, group).unwrap())
            .collect();
        store
    }

    pub fn catalog(&self) -> FieldCatalog {
        FieldCatalog::new(self.state.lock().unwrap().fields.clone())
    }

    /// Attach a trigger condition of `kind` to `task`.
    pub fn add_trigger(&self, task: TaskId, kind: TriggerKind, value: &str) -> FieldObject {
        let field = self.catalog().trigger_field(kind).unwrap().id;
        let fo = FieldObject::builder(Owner::Task(task), field)
            .value(value)
            .build();
        self.state.lock().unwrap().field_objects.push(fo.clone());
        fo
    }

    /// Insert any field object.
    pub fn add_field_object(&self, fo: FieldObject) -> FieldObject {
        self.state.lock().unwrap().field_objects.push(fo.clone());
        fo
    }

    pub fn add_task(&self, task: Task) -> Task {
        self.state.lock().unwrap().tasks.push(task.clone());
        task
    }

    pub fn add_provider(&self, provider: DataProvider) -> DataProvider {
        self.state
            .lock()
            .unwrap()
            .providers
            .insert(provider.id, provider.clone());
        provider
    }

    pub fn task(&self, id: TaskId) -> Task {
        let state = self.state.lock().unwrap();
        state.tasks.iter().find(|t| t.id == id).cloned().unwrap()
    }

    pub fn tasks(&self) -> Vec<Task> {
        self.state.lock().unwrap().tasks.clone()
    }

    pub fn field_object(&self, id: FieldObjectId) -> FieldObject {
        let state = self.state.lock().unwrap();
        state
            .field_objects
            .iter()
            .find(|fo| fo.id == id)
            .cloned()
            .unwrap()
    }

    pub fn owned_by(&self, owner: Owner) -> Vec<FieldObject> {
        let state = self.state.lock().unwrap();
        state
            .field_objects
            .iter()
            .filter(|fo| fo.owner == owner)
            .cloned()
            .collect()
    }

    pub fn provider(&self, id: DataProviderId) -> Option<DataProvider> {
        self.state.lock().unwrap().providers.get(&id).cloned()
    }
}

fn not_found(entity: &'static str, id: impl ToString) -> CmmsError {
    NotFoundError {
        entity,
        id: id.to_string(),
    }
    .into()
}

impl TaskRepository for InMemoryStore {
    fn create(&self, task: Task) -> impl Future<Output = Result<Task, CmmsError>> + Send {
        self.state.lock().unwrap().tasks.push(task.clone());
        async { Ok(task) }
    }

    fn get_by_id(
        &self,
        id: TaskId,
    ) -> impl Future<Output = Result<Option<Task>, CmmsError>> + Send {
        let state = self.state.lock().unwrap();
        let result = state.tasks.iter().find(|t| t.id == id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Task>, CmmsError>> + Send {
        let result = self.state.lock().unwrap().tasks.clone();
        async { Ok(result) }
    }

    fn list_pending(&self) -> impl Future<Output = Result<Vec<Task>, CmmsError>> + Send {
        let state = self.state.lock().unwrap();
        let result: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.is_pending())
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn update(&self, task: Task) -> impl Future<Output = Result<Task, CmmsError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.tasks.iter_mut().find(|t| t.id == task.id) {
            Some(slot) => {
                *slot = Task {
                    over: slot.over,
                    ..task
                };
                Ok(slot.clone())
            }
            None => Err(not_found("Task", task.id)),
        };
        async { result }
    }

    fn mark_triggered(
        &self,
        id: TaskId,
        end_date: Option<Date>,
    ) -> impl Future<Output = Result<bool, CmmsError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.tasks.iter_mut().find(|t| t.id == id) {
            Some(slot) if !slot.over && !slot.is_triggered => {
                slot.is_triggered = true;
                slot.end_date = end_date;
                true
            }
            _ => false,
        };
        async move { Ok(result) }
    }

    fn delete(&self, id: TaskId) -> impl Future<Output = Result<(), CmmsError>> + Send {
        let mut state = self.state.lock().unwrap();
        state.tasks.retain(|t| t.id != id);
        state.field_objects.retain(|fo| fo.owner != Owner::Task(id));
        async { Ok(()) }
    }

    fn complete_and_spawn(
        &self,
        id: TaskId,
        successor: Option<Successor>,
    ) -> impl Future<Output = Result<bool, CmmsError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.tasks.iter().position(|t| t.id == id) {
            None => Err(not_found("Task", id)),
            Some(index) if state.tasks[index].over => Ok(false),
            Some(index) => {
                state.tasks[index].over = true;
                if let Some(successor) = successor {
                    state.tasks.push(successor.task);
                    state.field_objects.extend(successor.field_objects);
                }
                Ok(true)
            }
        };
        async { result }
    }
}

impl FieldObjectRepository for InMemoryStore {
    fn create(
        &self,
        field_object: FieldObject,
    ) -> impl Future<Output = Result<FieldObject, CmmsError>> + Send {
        self.state
            .lock()
            .unwrap()
            .field_objects
            .push(field_object.clone());
        async { Ok(field_object) }
    }

    fn get_by_id(
        &self,
        id: FieldObjectId,
    ) -> impl Future<Output = Result<Option<FieldObject>, CmmsError>> + Send {
        let state = self.state.lock().unwrap();
        let result = state.field_objects.iter().find(|fo| fo.id == id).cloned();
        async { Ok(result) }
    }

    fn find_by_owner(
        &self,
        owner: Owner,
    ) -> impl Future<Output = Result<Vec<FieldObject>, CmmsError>> + Send {
        let result = self.owned_by(owner);
        async { Ok(result) }
    }

    fn update(
        &self,
        field_object: FieldObject,
    ) -> impl Future<Output = Result<FieldObject, CmmsError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state
            .field_objects
            .iter_mut()
            .find(|fo| fo.id == field_object.id)
        {
            Some(slot) => {
                *slot = field_object.clone();
                Ok(field_object)
            }
            None => Err(not_found("FieldObject", field_object.id)),
        };
        async { result }
    }

    fn delete(&self, id: FieldObjectId) -> impl Future<Output = Result<(), CmmsError>> + Send {
        self.state
            .lock()
            .unwrap()
            .field_objects
            .retain(|fo| fo.id != id);
        async { Ok(()) }
    }
}

impl FieldRepository for InMemoryStore {
    fn create(&self, field: Field) -> impl Future<Output = Result<Field, CmmsError>> + Send {
        self.state.lock().unwrap().fields.push(field.clone());
        async { Ok(field) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Field>, CmmsError>> + Send {
        let result = self.state.lock().unwrap().fields.clone();
        async { Ok(result) }
    }
}

impl DataProviderRepository for InMemoryStore {
    fn create(
        &self,
        provider: DataProvider,
    ) -> impl Future<Output = Result<DataProvider, CmmsError>> + Send {
        let provider = self.add_provider(provider);
        async { Ok(provider) }
    }

    fn get_by_id(
        &self,
        id: DataProviderId,
    ) -> impl Future<Output = Result<Option<DataProvider>, CmmsError>> + Send {
        let result = self.provider(id);
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<DataProvider>, CmmsError>> + Send {
        let result: Vec<DataProvider> =
            self.state.lock().unwrap().providers.values().cloned().collect();
        async { Ok(result) }
    }

    fn get_activated(&self) -> impl Future<Output = Result<Vec<DataProvider>, CmmsError>> + Send {
        let state = self.state.lock().unwrap();
        let result: Vec<DataProvider> = state
            .providers
            .values()
            .filter(|p| p.is_activated)
            .cloned()
            .collect();
        async { Ok(result) }
    }

    fn update(
        &self,
        provider: DataProvider,
    ) -> impl Future<Output = Result<DataProvider, CmmsError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.providers.get_mut(&provider.id) {
            Some(slot) => {
                *slot = provider.clone();
                Ok(provider)
            }
            None => Err(not_found("DataProvider", provider.id)),
        };
        async { result }
    }

    fn set_job_id(
        &self,
        id: DataProviderId,
        job_id: Option<JobId>,
    ) -> impl Future<Output = Result<(), CmmsError>> + Send {
        let mut state = self.state.lock().unwrap();
        let result = match state.providers.get_mut(&id) {
            Some(slot) => {
                slot.job_id = job_id;
                Ok(())
            }
            None => Err(not_found("DataProvider", id)),
        };
        async { result }
    }

    fn delete(&self, id: DataProviderId) -> impl Future<Output = Result<(), CmmsError>> + Send {
        self.state.lock().unwrap().providers.remove(&id);
        async { Ok(()) }
    }
}

impl EquipmentRepository for InMemoryStore {
    fn create(
        &self,
        equipment: Equipment,
    ) -> impl Future<Output = Result<Equipment, CmmsError>> + Send {
        self.state
            .lock()
            .unwrap()
            .equipment
            .insert(equipment.id, equipment.clone());
        async { Ok(equipment) }
    }

    fn get_by_id(
        &self,
        id: EquipmentId,
    ) -> impl Future<Output = Result<Option<Equipment>, CmmsError>> + Send {
        let result = self.state.lock().unwrap().equipment.get(&id).cloned();
        async { Ok(result) }
    }

    fn get_all(&self) -> impl Future<Output = Result<Vec<Equipment>, CmmsError>> + Send {
        let result: Vec<Equipment> =
            self.state.lock().unwrap().equipment.values().cloned().collect();
        async { Ok(result) }
    }
}

/// Routine answering the same reading every time, counting calls.
pub struct FixedRoutine {
    reading: Reading,
    calls: AtomicUsize,
}

impl FixedRoutine {
    pub fn new(reading: Reading) -> Self {
        Self {
            reading,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AcquisitionRoutine for FixedRoutine {
    async fn get_data(
        &self,
        _endpoint: &str,
        _port: Option<u16>,
    ) -> Result<Reading, AcquisitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.reading.clone())
    }
}

/// Routine whose endpoint is never reachable.
pub struct UnreachableRoutine;

#[async_trait]
impl AcquisitionRoutine for UnreachableRoutine {
    async fn get_data(
        &self,
        endpoint: &str,
        _port: Option<u16>,
    ) -> Result<Reading, AcquisitionError> {
        Err(AcquisitionError::AcquisitionFailed {
            endpoint: endpoint.to_string(),
            source: "connection refused".into(),
        })
    }
}
