//! Clock port trait.

use chrono::NaiveDateTime;

pub trait ClockPort {
    /// Local wall-clock time; the live loop takes its date from it.
    fn now(&self) -> NaiveDateTime;
}
