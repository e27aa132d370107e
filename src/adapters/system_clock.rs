//! Wall-clock adapter for the clock port.

use crate::ports::clock_port::ClockPort;
use chrono::{Local, NaiveDateTime};

pub struct SystemClock;

impl ClockPort for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}
