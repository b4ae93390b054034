//! Trigger conditions — when a task must be activated.
//!
//! A trigger condition is a [`FieldObject`](crate::field_object::FieldObject)
//! owned by a task whose field belongs to the `Trigger Conditions` group. Its
//! `value` is a pipe-separated string kept bit-identical in storage and
//! parsed once into a [`TriggerCondition`] when loaded.
//!
//! | Kind | Value |
//! |------|-------|
//! | Recurrence | `period\|delay` |
//! | Above Threshold | `threshold\|source\|delay` |
//! | Under Threshold | `threshold\|source\|delay` |
//! | Frequency | `increment\|source\|delay\|next-trigger` |

mod condition;
mod evaluation;
mod successor;

pub use condition::{ConditionParseError, TriggerCondition, TriggerKind};
pub use evaluation::{EndDateRule, Firing, ReadingError};
pub use successor::{Successor, TriggerEntry, plan_successor};
