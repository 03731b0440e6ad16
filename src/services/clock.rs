//! Source of the current date for loan bookkeeping

use std::sync::Arc;

use chrono::{Local, NaiveDate};

pub trait Clock: Send + Sync {
    /// Today's date in the library's local time zone
    fn today(&self) -> NaiveDate;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// Clock pinned to a single date
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDate);

impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0
    }
}

pub type SharedClock = Arc<dyn Clock>;
