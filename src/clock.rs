//! Wall-clock source for news dates, file names and report timestamps.

use chrono::{Local, NaiveDateTime, SubsecRound};

/// Local wall-clock time without an offset, matching what lands in the JSON output.
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        truncate_to_micros(Local::now().naive_local())
    }
}

/// Drop sub-microsecond digits so serialized timestamps carry at most six fractional digits.
pub fn truncate_to_micros(at: NaiveDateTime) -> NaiveDateTime {
    at.trunc_subsecs(6)
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}

/// Stamp used in per-user file names, e.g. `20250314_120000`.
pub fn file_stamp(at: NaiveDateTime) -> String {
    at.format("%Y%m%d_%H%M%S").to_string()
}
