//! Wall-clock abstraction so rollover arithmetic can be pinned in tests.

use chrono::{Local, NaiveDateTime};
use std::cell::Cell;

pub trait WallClock {
    /// Local wall-clock time of the page.
    fn now(&self) -> NaiveDateTime;
}

/// Browser local time (`Date` via chrono's `wasmbind`).
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserClock;

impl WallClock for BrowserClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: Cell<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { now: Cell::new(now) }
    }

    pub fn set(&self, now: NaiveDateTime) {
        self.now.set(now);
    }
}

impl WallClock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.now.get()
    }
}
