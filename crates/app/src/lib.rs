//! # cmms-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound ports):
//!   - `TaskRepository` — CRUD for tasks, atomic completion with successor
//!   - `FieldObjectRepository` — CRUD for field objects, lookup by owner
//!   - `FieldRepository` — read the field catalog
//!   - `DataProviderRepository` — CRUD for data providers, job handles
//!   - `EquipmentRepository` — CRUD for equipment
//!   - `Clock` — the evaluation instant
//!   - `AcquisitionRoutine` — read one scalar from an external endpoint
//! - Define the engine:
//!   - `ConditionEvaluator` — decide whether a task's trigger fires
//!   - `TaskTriggerScheduler` — periodic tick activating pending tasks
//!   - `TaskCompletion` — mark a task over and spawn its successor
//!   - `DataProviderRuntime` — poll data providers into field objects
//! - Define **driving/inbound** services used by the CRUD layer
//!
//! ## Dependency rule
//! Depends on `cmms-domain` only (plus `tokio` for timers and tasks).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod acquisition_registry;
pub mod completion;
pub mod condition_evaluator;
pub mod data_provider_runtime;
pub mod ports;
pub mod scheduler;
pub mod services;

#[cfg(test)]
pub(crate) mod test_support;
