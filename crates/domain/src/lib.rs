//! # cmms-domain
//!
//! Pure domain model for the maintenance task triggering engine.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, dates and [`Period`](period::Period)s
//! - Define **Equipment** (the machines tasks are attached to)
//! - Define **Fields** and their reserved groups (`Trigger Conditions`, `End Conditions`)
//! - Define **FieldObjects** (attribute instances owned by an equipment or a task)
//! - Define **Tasks** (maintenance work items, templates and spawned successors)
//! - Define **Trigger conditions** (parsed from FieldObject values) and their firing rules
//! - Define **DataProviders** (bindings between an external endpoint and a FieldObject)
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod period;
pub mod time;

pub mod data_provider;
pub mod equipment;
pub mod field;
pub mod field_object;
pub mod task;
pub mod trigger;
