//! Source of the current date and time
//!
//! Check-ins are stamped with the local wall clock of the studio. Handlers
//! read the time once per request through a [`Clock`] and pass it down, so
//! tests can pin "today" to a known weekday.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Something that knows what time it is
pub trait Clock: Send + Sync {
    /// Current local date and time
    fn now(&self) -> NaiveDateTime;

    /// Current local date
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Reads the server's local clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_clock_today() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(18, 30, 0)
            .unwrap();
        let clock = FixedClock(now);

        assert_eq!(clock.now(), now);
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());
    }
}
