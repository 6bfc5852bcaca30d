// Month window used to scope a monthly summary

use chrono::{DateTime, Datelike, Duration, FixedOffset, TimeZone, Utc};

/// Inclusive [start, end] span covering one calendar month in local time.
/// `month` is zero-based (0 = January).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub year: i32,
    pub month: u32,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl MonthWindow {
    /// Build the window for `(year, month)` in the given offset.
    /// Start is local midnight on day 1, end is 23:59:59.999 on the last day.
    /// `month` must be 0..=11; larger values are clamped to December.
    pub fn new(year: i32, month: u32, offset: FixedOffset) -> Self {
        let month = month.min(11);
        let start = local_midnight(offset, year, month + 1);
        let next = if month == 11 {
            local_midnight(offset, year + 1, 1)
        } else {
            local_midnight(offset, year, month + 2)
        };
        let end = next - Duration::milliseconds(1);

        Self {
            year,
            month,
            start,
            end,
        }
    }

    /// Window for the month containing `now` in the given offset
    pub fn containing(now: DateTime<Utc>, offset: FixedOffset) -> Self {
        let local = now.with_timezone(&offset);
        Self::new(local.year(), local.month0(), offset)
    }

    /// Window for the current month
    pub fn current(offset: FixedOffset) -> Self {
        Self::containing(Utc::now(), offset)
    }

    /// Whether an instant falls inside the window (both ends inclusive)
    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start.with_timezone(&Utc) && *instant <= self.end.with_timezone(&Utc)
    }

    /// Human label, e.g. "October 2026"
    pub fn label(&self) -> String {
        self.start.format("%B %Y").to_string()
    }
}

/// Fixed offsets never have gaps or folds, so a single local time always exists
fn local_midnight(offset: FixedOffset, year: i32, month1: u32) -> DateTime<FixedOffset> {
    offset
        .with_ymd_and_hms(year, month1, 1, 0, 0, 0)
        .single()
        .unwrap_or_else(|| DateTime::<Utc>::MIN_UTC.with_timezone(&offset))
}
