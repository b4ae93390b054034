//! Condition kinds and the value grammar.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::FieldObjectId;
use crate::period::{Period, PeriodParseError};

/// The recognised children of the `Trigger Conditions` field group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    Recurrence,
    AboveThreshold,
    UnderThreshold,
    Frequency,
}

impl TriggerKind {
    /// All kinds, in catalog order.
    pub const ALL: [Self; 4] = [
        Self::Recurrence,
        Self::AboveThreshold,
        Self::UnderThreshold,
        Self::Frequency,
    ];

    /// Name of the field in the `Trigger Conditions` group.
    #[must_use]
    pub fn field_name(self) -> &'static str {
        match self {
            Self::Recurrence => "Recurrence",
            Self::AboveThreshold => "Above Threshold",
            Self::UnderThreshold => "Under Threshold",
            Self::Frequency => "Frequency",
        }
    }

    /// Resolve a field name of the `Trigger Conditions` group.
    #[must_use]
    pub fn from_field_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.field_name() == name)
    }

    fn arity(self) -> usize {
        match self {
            Self::Recurrence => 2,
            Self::AboveThreshold | Self::UnderThreshold => 3,
            Self::Frequency => 4,
        }
    }
}

impl fmt::Display for TriggerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.field_name())
    }
}

/// Why a condition value could not be parsed.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum ConditionParseError {
    /// Wrong number of `|`-separated parts.
    #[error("{kind} expects {expected} parts, got {actual}")]
    Arity {
        kind: TriggerKind,
        expected: usize,
        actual: usize,
    },

    /// A numeric part is not a finite number.
    #[error("`{0}` is not a finite number")]
    Number(String),

    /// A frequency increment below zero.
    #[error("frequency increment `{0}` must not be negative")]
    NegativeIncrement(String),

    /// The source part is not a field object id.
    #[error("`{0}` is not a field object id")]
    Source(String),

    /// A period or delay part does not parse.
    #[error("invalid period")]
    Period(#[from] PeriodParseError),
}

/// A parsed trigger condition.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerCondition {
    /// Fires `delay` before the task deadline. Successors are due `period` later.
    Recurrence { period: Period, delay: Period },
    /// Fires while the source reading is strictly above `threshold`.
    AboveThreshold {
        threshold: f64,
        source: FieldObjectId,
        delay: Period,
    },
    /// Fires while the source reading is strictly under `threshold`.
    UnderThreshold {
        threshold: f64,
        source: FieldObjectId,
        delay: Period,
    },
    /// Fires once the source reading reaches `next_trigger`.
    Frequency {
        increment: f64,
        source: FieldObjectId,
        delay: Period,
        next_trigger: f64,
    },
}

impl TriggerCondition {
    /// Parse a stored value for a condition of the given kind.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionParseError`] when the value does not follow the
    /// grammar of `kind`.
    pub fn parse(kind: TriggerKind, value: &str) -> Result<Self, ConditionParseError> {
        let parts: Vec<&str> = value.split('|').map(str::trim).collect();
        if parts.len() != kind.arity() {
            return Err(ConditionParseError::Arity {
                kind,
                expected: kind.arity(),
                actual: parts.len(),
            });
        }

        let condition = match kind {
            TriggerKind::Recurrence => Self::Recurrence {
                period: parts[0].parse()?,
                delay: parts[1].parse()?,
            },
            TriggerKind::AboveThreshold => Self::AboveThreshold {
                threshold: parse_number(parts[0])?,
                source: parse_source(parts[1])?,
                delay: parts[2].parse()?,
            },
            TriggerKind::UnderThreshold => Self::UnderThreshold {
                threshold: parse_number(parts[0])?,
                source: parse_source(parts[1])?,
                delay: parts[2].parse()?,
            },
            TriggerKind::Frequency => Self::Frequency {
                increment: parse_increment(parts[0])?,
                source: parse_source(parts[1])?,
                delay: parts[2].parse()?,
                next_trigger: parse_number(parts[3])?,
            },
        };
        Ok(condition)
    }

    #[must_use]
    pub fn kind(&self) -> TriggerKind {
        match self {
            Self::Recurrence { .. } => TriggerKind::Recurrence,
            Self::AboveThreshold { .. } => TriggerKind::AboveThreshold,
            Self::UnderThreshold { .. } => TriggerKind::UnderThreshold,
            Self::Frequency { .. } => TriggerKind::Frequency,
        }
    }

    /// The field object whose value is compared, if any.
    #[must_use]
    pub fn source(&self) -> Option<FieldObjectId> {
        match self {
            Self::Recurrence { .. } => None,
            Self::AboveThreshold { source, .. }
            | Self::UnderThreshold { source, .. }
            | Self::Frequency { source, .. } => Some(*source),
        }
    }

    /// Whether completing a task carrying this condition spawns a successor.
    #[must_use]
    pub fn spawns_successor(&self) -> bool {
        matches!(self, Self::Recurrence { .. } | Self::Frequency { .. })
    }

    /// The condition as it must be carried by the successor task.
    ///
    /// Frequency conditions move their `next_trigger` one `increment` forward,
    /// keeping the decimal precision of the stored values. Every other kind is
    /// carried unchanged.
    #[must_use]
    pub fn advanced(&self) -> Self {
        match *self {
            Self::Frequency {
                increment,
                source,
                delay,
                next_trigger,
            } => Self::Frequency {
                increment,
                source,
                delay,
                next_trigger: decimal_sum(next_trigger, increment),
            },
            other => other,
        }
    }
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Recurrence { period, delay } => write!(f, "{period}|{delay}"),
            Self::AboveThreshold {
                threshold,
                source,
                delay,
            }
            | Self::UnderThreshold {
                threshold,
                source,
                delay,
            } => write!(f, "{threshold}|{source}|{delay}"),
            Self::Frequency {
                increment,
                source,
                delay,
                next_trigger,
            } => write!(f, "{increment}|{source}|{delay}|{next_trigger}"),
        }
    }
}

fn parse_number(raw: &str) -> Result<f64, ConditionParseError> {
    raw.parse::<f64>()
        .ok()
        .filter(|n| n.is_finite())
        .ok_or_else(|| ConditionParseError::Number(raw.to_string()))
}

fn parse_increment(raw: &str) -> Result<f64, ConditionParseError> {
    let increment = parse_number(raw)?;
    if increment < 0.0 {
        return Err(ConditionParseError::NegativeIncrement(raw.to_string()));
    }
    Ok(increment)
}

/// Decimals in the shortest representation of `value`.
fn decimals(value: f64) -> usize {
    value
        .to_string()
        .split_once('.')
        .map_or(0, |(_, fraction)| fraction.len())
}

/// `a + b` rounded to the decimals of its operands, so `0.2 + 0.1` is `0.3`.
fn decimal_sum(a: f64, b: f64) -> f64 {
    let sum = a + b;
    let scale = decimals(a).max(decimals(b));
    format!("{sum:.scale$}").parse().unwrap_or(sum)
}

fn parse_source(raw: &str) -> Result<FieldObjectId, ConditionParseError> {
    raw.parse()
        .map_err(|_| ConditionParseError::Source(raw.to_string()))
}
