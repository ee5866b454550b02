//! Production-date windows used to select batches for a report.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Half-open date window `[from, to)` over production dates (UTC).
///
/// Either bound may be open. `to` is exclusive so consecutive monthly windows
/// never count a batch twice.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> DomainResult<Self> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(DomainError::validation(format!(
                    "date range start {f} is after end {t}"
                )));
            }
        }
        Ok(Self { from, to })
    }

    /// A window with no bounds (every batch).
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn from_instant(&self) -> Option<DateTime<Utc>> {
        self.from.map(start_of_day)
    }

    pub fn to_instant(&self) -> Option<DateTime<Utc>> {
        self.to.map(start_of_day)
    }

    /// Whether a production timestamp falls inside the window.
    ///
    /// Batches without a timestamp only match an unbounded window.
    pub fn contains(&self, at: Option<DateTime<Utc>>) -> bool {
        let Some(at) = at else {
            return self.from.is_none() && self.to.is_none();
        };
        if let Some(from) = self.from_instant() {
            if at < from {
                return false;
            }
        }
        if let Some(to) = self.to_instant() {
            if at >= to {
                return false;
            }
        }
        true
    }
}

impl ValueObject for DateRange {}

impl core::fmt::Display for DateRange {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match (self.from, self.to) {
            (None, None) => write!(f, "all dates"),
            (Some(from), None) => write!(f, "from {from}"),
            (None, Some(to)) => write!(f, "before {to}"),
            (Some(from), Some(to)) => write!(f, "{from} .. {to}"),
        }
    }
}

fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn rejects_inverted_range() {
        let err = DateRange::new(Some(date(2024, 3, 2)), Some(date(2024, 3, 1))).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn end_is_exclusive() {
        let range = DateRange::new(Some(date(2024, 3, 1)), Some(date(2024, 4, 1))).unwrap();
        let inside = Utc.with_ymd_and_hms(2024, 3, 31, 23, 59, 59).unwrap();
        let boundary = Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap();
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();

        assert!(range.contains(Some(inside)));
        assert!(range.contains(Some(start)));
        assert!(!range.contains(Some(boundary)));
    }

    #[test]
    fn undated_batches_only_match_unbounded_range() {
        assert!(DateRange::unbounded().contains(None));
        let range = DateRange::new(Some(date(2024, 1, 1)), None).unwrap();
        assert!(!range.contains(None));
    }
}
