//! Application services — use-cases called by the CRUD layer.
//!
//! Each service struct accepts port trait implementations via generic parameters
//! (constructor injection), keeping this layer decoupled from concrete adapters.

pub mod data_provider_service;
pub mod task_service;
