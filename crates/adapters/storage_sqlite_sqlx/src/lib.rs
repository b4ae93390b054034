//! # cmms-adapter-storage-sqlite-sqlx
//!
//! `SQLite` persistence adapter using [sqlx](https://docs.rs/sqlx).
//!
//! ## Responsibilities
//! - Implement the repository port traits defined in `cmms-app::ports::storage`
//! - Manage `SQLite` connection pool lifecycle
//! - Run database migrations (using sqlx embedded migrations) and seed the
//!   reserved condition fields
//! - Map between domain types and database rows
//!
//! Identifiers, dates and periods are stored as text; the polymorphic owner
//! of a field object is the pair `(owner_kind, owner_id)`.
//!
//! ## Dependency rule
//! Depends on `cmms-app` (for port traits) and `cmms-domain` (for domain types).
//! The `app` and `domain` crates must never reference this adapter.

pub mod data_provider_repo;
pub mod equipment_repo;
pub mod error;
pub mod field_object_repo;
pub mod field_repo;
pub mod pool;
pub mod task_repo;

pub use data_provider_repo::SqliteDataProviderRepository;
pub use equipment_repo::SqliteEquipmentRepository;
pub use field_object_repo::SqliteFieldObjectRepository;
pub use field_repo::SqliteFieldRepository;
pub use pool::{Config, Database};
pub use task_repo::SqliteTaskRepository;
