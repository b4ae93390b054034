//! Planning the next occurrence of a completed task.

use crate::field_object::{FieldObject, Owner};
use crate::task::Task;
use crate::time::{self, Timestamp};

use super::condition::TriggerCondition;

/// A trigger-condition field object of a task, parsed when possible.
#[derive(Debug, Clone)]
pub struct TriggerEntry {
    pub field_object: FieldObject,
    /// `None` when the stored value does not parse.
    pub condition: Option<TriggerCondition>,
}

/// The task spawned on completion and the field objects it owns.
#[derive(Debug, Clone)]
pub struct Successor {
    pub task: Task,
    pub field_objects: Vec<FieldObject>,
}

/// Plan the successor of `task`, completed at instant `now`.
///
/// Returns `None` unless at least one parsed condition is a recurrence or a
/// frequency. Every trigger condition is copied onto the successor, with
/// frequencies advanced by their increment. End conditions are copied with
/// their value cleared. The deadline is `period` after `now` for the first
/// recurrence; with frequencies only, the successor has no deadline.
#[must_use]
pub fn plan_successor(
    task: &Task,
    triggers: &[TriggerEntry],
    end_conditions: &[FieldObject],
    now: Timestamp,
) -> Option<Successor> {
    let spawns = triggers
        .iter()
        .filter_map(|entry| entry.condition)
        .any(|c| c.spawns_successor());
    if !spawns {
        return None;
    }

    let mut next = task.successor();
    next.end_date = triggers
        .iter()
        .find_map(|entry| match entry.condition {
            Some(TriggerCondition::Recurrence { period, .. }) => Some(period),
            _ => None,
        })
        .map(|period| time::date_after(now, period));

    let owner = Owner::Task(next.id);
    let mut field_objects: Vec<FieldObject> = triggers
        .iter()
        .map(|entry| {
            let mut copy = entry.field_object.copy_to(owner);
            if let Some(condition) = entry.condition {
                copy.value = condition.advanced().to_string();
            }
            copy
        })
        .collect();
    field_objects.extend(end_conditions.iter().map(|fo| {
        let mut copy = fo.copy_to(owner);
        copy.value.clear();
        copy
    }));

    Some(Successor {
        task: next,
        field_objects,
    })
}
