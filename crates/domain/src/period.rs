//! Period — a duration written as days, hours and minutes (`"2d 4h 15m"`).
//!
//! Used by data-provider recurrences and by the delays embedded in trigger
//! condition values. The grammar is `((\d+)d ?)?((\d+)h ?)?((\d+)m ?)?`,
//! case-sensitive, with at least one component present.

use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use chrono::TimeDelta;
use regex::Regex;
use serde::{Deserialize, Serialize};

static PERIOD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:(\d+)d ?)?(?:(\d+)h ?)?(?:(\d+)m ?)?$").expect("period pattern is valid")
});

/// A duration made of day, hour and minute components.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Period {
    pub days: u32,
    pub hours: u32,
    pub minutes: u32,
}

/// Why a string is not a valid [`Period`].
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PeriodParseError {
    /// The input is blank.
    #[error("period is empty")]
    Empty,

    /// The input does not follow the `Nd Nh Nm` grammar.
    #[error("`{0}` does not match the `Nd Nh Nm` grammar")]
    Malformed(String),

    /// A component is too large to be represented.
    #[error("component `{0}` is out of range")]
    OutOfRange(String),
}

impl Period {
    /// Build a period from its components.
    #[must_use]
    pub const fn new(days: u32, hours: u32, minutes: u32) -> Self {
        Self {
            days,
            hours,
            minutes,
        }
    }

    /// A period of whole days.
    #[must_use]
    pub const fn days(days: u32) -> Self {
        Self::new(days, 0, 0)
    }

    /// Whether every component is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.days == 0 && self.hours == 0 && self.minutes == 0
    }

    /// Sum of all components as a single interval.
    #[must_use]
    pub fn to_time_delta(&self) -> TimeDelta {
        TimeDelta::days(i64::from(self.days))
            + TimeDelta::hours(i64::from(self.hours))
            + TimeDelta::minutes(i64::from(self.minutes))
    }

    /// Sum of all components as a [`std::time::Duration`].
    #[must_use]
    pub fn to_std(&self) -> std::time::Duration {
        let minutes = u64::from(self.days) * 24 * 60
            + u64::from(self.hours) * 60
            + u64::from(self.minutes);
        std::time::Duration::from_secs(minutes * 60)
    }
}

impl FromStr for Period {
    type Err = PeriodParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PeriodParseError::Empty);
        }
        let caps = PERIOD_RE
            .captures(trimmed)
            .ok_or_else(|| PeriodParseError::Malformed(trimmed.to_string()))?;

        let component = |index: usize| -> Result<u32, PeriodParseError> {
            caps.get(index).map_or(Ok(0), |m| {
                m.as_str()
                    .parse()
                    .map_err(|_| PeriodParseError::OutOfRange(m.as_str().to_string()))
            })
        };

        Ok(Self {
            days: component(1)?,
            hours: component(2)?,
            minutes: component(3)?,
        })
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.write_str("0m");
        }
        let mut parts = Vec::with_capacity(3);
        if self.days > 0 {
            parts.push(format!("{}d", self.days));
        }
        if self.hours > 0 {
            parts.push(format!("{}h", self.hours));
        }
        if self.minutes > 0 {
            parts.push(format!("{}m", self.minutes));
        }
        f.write_str(&parts.join(" "))
    }
}

impl TryFrom<String> for Period {
    type Error = PeriodParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Period> for String {
    fn from(value: Period) -> Self {
        value.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_parse_single_day_component() {
        assert_eq!("30d".parse::<Period>().unwrap(), Period::days(30));
    }

    #[test]
    fn should_parse_components_with_and_without_spaces() {
        assert_eq!("2d 4h".parse::<Period>().unwrap(), Period::new(2, 4, 0));
        assert_eq!("2d4h15m".parse::<Period>().unwrap(), Period::new(2, 4, 15));
        assert_eq!("15m".parse::<Period>().unwrap(), Period::new(0, 0, 15));
    }

    #[test]
    fn should_ignore_surrounding_whitespace() {
        assert_eq!(" 1h ".parse::<Period>().unwrap(), Period::new(0, 1, 0));
    }

    #[test]
    fn should_reject_empty_input() {
        assert_eq!("".parse::<Period>(), Err(PeriodParseError::Empty));
        assert_eq!("   ".parse::<Period>(), Err(PeriodParseError::Empty));
    }

    #[test]
    fn should_reject_malformed_input() {
        assert!(matches!(
            "not-a-duration".parse::<Period>(),
            Err(PeriodParseError::Malformed(_))
        ));
        assert!(matches!(
            "4h 2d".parse::<Period>(),
            Err(PeriodParseError::Malformed(_))
        ));
        assert!(matches!(
            "2D".parse::<Period>(),
            Err(PeriodParseError::Malformed(_))
        ));
        assert!(matches!(
            "5".parse::<Period>(),
            Err(PeriodParseError::Malformed(_))
        ));
    }

    #[test]
    fn should_reject_component_overflow() {
        assert!(matches!(
            "99999999999d".parse::<Period>(),
            Err(PeriodParseError::OutOfRange(_))
        ));
    }

    #[test]
    fn should_format_in_canonical_order_omitting_zero_parts() {
        assert_eq!(Period::new(2, 0, 15).to_string(), "2d 15m");
        assert_eq!(Period::new(0, 3, 0).to_string(), "3h");
        assert_eq!(Period::default().to_string(), "0m");
    }

    #[test]
    fn should_reparse_formatted_periods() {
        for period in [
            Period::new(1, 2, 3),
            Period::days(30),
            Period::new(0, 0, 1),
            Period::new(0, 23, 0),
            Period::default(),
        ] {
            assert_eq!(period.to_string().parse::<Period>().unwrap(), period);
        }
    }

    #[test]
    fn should_sum_components_into_single_interval() {
        let period = Period::new(1, 2, 3);
        assert_eq!(period.to_time_delta(), TimeDelta::minutes(24 * 60 + 120 + 3));
        assert_eq!(
            period.to_std(),
            std::time::Duration::from_secs((24 * 60 + 120 + 3) * 60)
        );
    }

    #[test]
    fn should_serialize_as_string() {
        let json = serde_json::to_string(&Period::new(0, 4, 0)).unwrap();
        assert_eq!(json, "\"4h\"");
        let parsed: Period = serde_json::from_str("\"2d 4h\"").unwrap();
        assert_eq!(parsed, Period::new(2, 4, 0));
    }
}
