//! Time-slot value types: weekday, teaching period, clock-time window,
//! week range and week parity.
//!
//! These are immutable values with validated constructors. Deserialization
//! goes through the same validation (`try_from`), so a slot that exists is a
//! slot that is well-formed.

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

/// Day of week, 1 = Monday through 7 = Sunday.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Weekday(u8);

impl Weekday {
    pub const MONDAY: Weekday = Weekday(1);
    pub const SUNDAY: Weekday = Weekday(7);

    pub fn new(day: u8) -> Result<Self, String> {
        if (1..=7).contains(&day) {
            Ok(Weekday(day))
        } else {
            Err(format!("weekday must be in 1..=7, got {}", day))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Weekday {
    type Error = String;

    fn try_from(day: u8) -> Result<Self, Self::Error> {
        Weekday::new(day)
    }
}

impl From<Weekday> for u8 {
    fn from(day: Weekday) -> Self {
        day.0
    }
}

/// Teaching period within a day, 1 through 12.
///
/// The mapping from period number to clock time is external configuration
/// (see [`crate::config::PeriodTable`]), not owned by this type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct PeriodNumber(u8);

impl PeriodNumber {
    pub const MAX: u8 = 12;

    pub fn new(period: u8) -> Result<Self, String> {
        if (1..=Self::MAX).contains(&period) {
            Ok(PeriodNumber(period))
        } else {
            Err(format!("period must be in 1..={}, got {}", Self::MAX, period))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for PeriodNumber {
    type Error = String;

    fn try_from(period: u8) -> Result<Self, Self::Error> {
        PeriodNumber::new(period)
    }
}

impl From<PeriodNumber> for u8 {
    fn from(period: PeriodNumber) -> Self {
        period.0
    }
}

/// Clock-time interval within a day, half-open: `[start, end)`.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClockWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ClockWindow {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, String> {
        if start < end {
            Ok(Self { start, end })
        } else {
            Err(format!("window start {} must be before end {}", start, end))
        }
    }

    /// Check if this window overlaps with another.
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Active week span within a term, inclusive on both ends, 1 through 25.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekRange {
    pub start: u8,
    pub end: u8,
}

impl WeekRange {
    pub const MAX_WEEK: u8 = 25;

    pub fn new(start: u8, end: u8) -> Result<Self, String> {
        let range = Self { start, end };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(1..=Self::MAX_WEEK).contains(&self.start) || !(1..=Self::MAX_WEEK).contains(&self.end)
        {
            return Err(format!(
                "week numbers must be in 1..={}, got {}..={}",
                Self::MAX_WEEK,
                self.start,
                self.end
            ));
        }
        if self.start > self.end {
            return Err(format!(
                "start week {} must not be after end week {}",
                self.start, self.end
            ));
        }
        Ok(())
    }

    /// Inclusive-range overlap test.
    pub fn overlaps(&self, other: &Self) -> bool {
        !(self.end < other.start || other.end < self.start)
    }
}

/// Week-parity filter limiting an occurrence to odd, even, or all weeks
/// within its range.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum WeekParity {
    #[default]
    All,
    Odd,
    Even,
}

impl WeekParity {
    /// Odd and Even occupy disjoint calendar weeks; any combination
    /// involving All shares weeks.
    pub fn disjoint_from(&self, other: &WeekParity) -> bool {
        matches!(
            (self, other),
            (WeekParity::Odd, WeekParity::Even) | (WeekParity::Even, WeekParity::Odd)
        )
    }
}

/// When an occurrence meets within its weekday: either a numbered teaching
/// period resolved through the period table, or an explicit clock window.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SlotTime {
    Period(PeriodNumber),
    Clock(ClockWindow),
}

impl SlotTime {
    /// Resolve to a concrete clock window, consulting the period table for
    /// numbered periods. Returns `None` for a period the table does not
    /// define.
    pub fn resolve(&self, periods: &crate::config::PeriodTable) -> Option<ClockWindow> {
        match self {
            SlotTime::Clock(window) => Some(*window),
            SlotTime::Period(number) => periods.window(*number),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn test_weekday_bounds() {
        assert!(Weekday::new(0).is_err());
        assert!(Weekday::new(8).is_err());
        assert_eq!(Weekday::new(3).unwrap().value(), 3);
    }

    #[test]
    fn test_period_bounds() {
        assert!(PeriodNumber::new(0).is_err());
        assert!(PeriodNumber::new(13).is_err());
        assert_eq!(PeriodNumber::new(12).unwrap().value(), 12);
    }

    #[test]
    fn test_clock_window_ordering() {
        assert!(ClockWindow::new(t(9, 0), t(8, 0)).is_err());
        assert!(ClockWindow::new(t(8, 0), t(8, 0)).is_err());
        assert!(ClockWindow::new(t(8, 0), t(9, 0)).is_ok());
    }

    #[test]
    fn test_clock_window_overlap() {
        let a = ClockWindow::new(t(8, 0), t(9, 0)).unwrap();
        let b = ClockWindow::new(t(8, 30), t(9, 30)).unwrap();
        let c = ClockWindow::new(t(9, 0), t(10, 0)).unwrap();

        assert!(a.overlaps(&b));
        assert!(b.overlaps(&a));
        // Half-open: back-to-back windows do not overlap.
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_week_range_validation() {
        assert!(WeekRange::new(5, 3).is_err());
        assert!(WeekRange::new(0, 10).is_err());
        assert!(WeekRange::new(1, 26).is_err());
        assert!(WeekRange::new(1, 16).is_ok());
    }

    #[test]
    fn test_week_range_overlap() {
        let a = WeekRange::new(1, 8).unwrap();
        let b = WeekRange::new(8, 16).unwrap();
        let c = WeekRange::new(9, 16).unwrap();

        assert!(a.overlaps(&b));
        assert!(!a.overlaps(&c));
    }

    #[test]
    fn test_parity_disjoint() {
        assert!(WeekParity::Odd.disjoint_from(&WeekParity::Even));
        assert!(WeekParity::Even.disjoint_from(&WeekParity::Odd));
        assert!(!WeekParity::All.disjoint_from(&WeekParity::Odd));
        assert!(!WeekParity::Odd.disjoint_from(&WeekParity::Odd));
    }

    #[test]
    fn test_weekday_serde_rejects_invalid() {
        let result: Result<Weekday, _> = serde_json::from_str("9");
        assert!(result.is_err());
        let day: Weekday = serde_json::from_str("7").unwrap();
        assert_eq!(day, Weekday::SUNDAY);
    }
}
