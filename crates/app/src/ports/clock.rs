//! Clock port — the instant used to evaluate conditions and compute deadlines.

use std::sync::Arc;

use cmms_domain::time::{self, Timestamp};

/// Source of the current instant.
pub trait Clock {
    fn now(&self) -> Timestamp;
}

/// Wall clock in UTC.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        time::now()
    }
}

impl<T: Clock + ?Sized> Clock for Arc<T> {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}
