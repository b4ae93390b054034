//! Firing rules and deadline computation.

use serde::{Deserialize, Serialize};

use crate::id::FieldObjectId;
use crate::period::Period;
use crate::task::Task;
use crate::time::{self, Date, Timestamp};

use super::condition::TriggerCondition;

/// The source reading of a threshold or frequency condition is unusable.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ReadingError {
    /// No reading was supplied for a condition that needs one.
    #[error("no reading supplied for source `{0}`")]
    Missing(FieldObjectId),

    /// The reading is not a finite number.
    #[error("reading `{0}` is not numeric")]
    NotNumeric(String),
}

/// How the task deadline moves when a condition fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "delay", rename_all = "snake_case")]
pub enum EndDateRule {
    /// The deadline is left untouched.
    Keep,
    /// The deadline becomes `delay` after the evaluation instant.
    AfterDelay(Period),
}

impl EndDateRule {
    /// The deadline after applying this rule at instant `now`.
    #[must_use]
    pub fn apply(self, current: Option<Date>, now: Timestamp) -> Option<Date> {
        match self {
            Self::Keep => current,
            Self::AfterDelay(delay) => Some(time::date_after(now, delay)),
        }
    }
}

impl TriggerCondition {
    /// Decide whether this condition fires.
    ///
    /// `end_date` is the deadline of the owning task, `reading` the current
    /// value of the source field object (ignored by recurrences). A
    /// recurrence on a task without deadline never fires.
    ///
    /// # Errors
    ///
    /// Returns [`ReadingError`] when a source-based condition gets no reading
    /// or a non-numeric one.
    pub fn fires(
        &self,
        end_date: Option<Date>,
        now: Timestamp,
        reading: Option<&str>,
    ) -> Result<bool, ReadingError> {
        match self {
            Self::Recurrence { delay, .. } => {
                Ok(end_date.is_some_and(|deadline| time::is_within(now, deadline, *delay)))
            }
            Self::AboveThreshold {
                threshold, source, ..
            } => Ok(numeric(*source, reading)? > *threshold),
            Self::UnderThreshold {
                threshold, source, ..
            } => Ok(numeric(*source, reading)? < *threshold),
            Self::Frequency {
                source,
                next_trigger,
                ..
            } => Ok(numeric(*source, reading)? >= *next_trigger),
        }
    }

    /// How the deadline moves when this condition fires.
    #[must_use]
    pub fn end_date_rule(&self) -> EndDateRule {
        match self {
            Self::Recurrence { .. } => EndDateRule::Keep,
            Self::AboveThreshold { delay, .. }
            | Self::UnderThreshold { delay, .. }
            | Self::Frequency { delay, .. } => EndDateRule::AfterDelay(*delay),
        }
    }
}

fn numeric(source: FieldObjectId, reading: Option<&str>) -> Result<f64, ReadingError> {
    let raw = reading.ok_or(ReadingError::Missing(source))?;
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ReadingError::NotNumeric(raw.to_string()))
}

/// A condition that fired for a task.
#[derive(Debug, Clone, PartialEq)]
pub struct Firing {
    /// The field object holding the condition.
    pub field_object_id: FieldObjectId,
    pub condition: TriggerCondition,
    pub end_date_rule: EndDateRule,
}

impl Firing {
    #[must_use]
    pub fn new(field_object_id: FieldObjectId, condition: TriggerCondition) -> Self {
        Self {
            field_object_id,
            condition,
            end_date_rule: condition.end_date_rule(),
        }
    }

    /// Mark `task` as triggered and move its deadline.
    pub fn apply(&self, task: &mut Task, now: Timestamp) {
        task.is_triggered = true;
        task.end_date = self.end_date_rule.apply(task.end_date, now);
    }
}
