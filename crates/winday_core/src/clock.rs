//! Time source for calendar dates and completion timestamps.
//!
//! Services never read the system clock directly so day boundaries
//! (today / yesterday / analytics windows) stay deterministic in tests.

use chrono::{Local, NaiveDate, Utc};
use std::cell::Cell;

pub trait Clock {
    /// Calendar date the user is living in.
    fn today(&self) -> NaiveDate;
    /// Current instant as Unix epoch milliseconds.
    fn now_ms(&self) -> i64;
}

/// Local calendar date, UTC epoch timestamps.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually driven clock.
#[derive(Debug, Clone)]
pub struct FixedClock {
    today: Cell<NaiveDate>,
    now_ms: Cell<i64>,
}

impl FixedClock {
    pub fn new(today: NaiveDate, now_ms: i64) -> Self {
        Self {
            today: Cell::new(today),
            now_ms: Cell::new(now_ms),
        }
    }

    pub fn set_today(&self, today: NaiveDate) {
        self.today.set(today);
    }

    pub fn advance_ms(&self, delta: i64) {
        self.now_ms.set(self.now_ms.get() + delta);
    }
}

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.today.get()
    }

    fn now_ms(&self) -> i64 {
        self.now_ms.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn today(&self) -> NaiveDate {
        (**self).today()
    }

    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}
