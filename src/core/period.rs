//! Calendar months and time windows in the reporting timezone.

use chrono::{
    DateTime, Datelike, Days, Duration, FixedOffset, Months, NaiveDate, NaiveTime, Offset, Utc,
};

/// Half-open interval `[start, end)` in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn contains(&self, instant: &DateTime<Utc>) -> bool {
        *instant >= self.start && *instant < self.end
    }

    /// Window covering whole local days `from..=to` in `tz`.
    pub fn from_dates(from: NaiveDate, to: NaiveDate, tz: &FixedOffset) -> Self {
        Self {
            start: local_midnight(from, tz),
            end: local_midnight(to + Days::new(1), tz),
        }
    }

    /// Like [`TimeWindow::from_dates`], unbounded on a side whose date is absent.
    pub fn between_dates(from: Option<NaiveDate>, to: Option<NaiveDate>, tz: &FixedOffset) -> Self {
        Self {
            start: from.map_or(DateTime::<Utc>::MIN_UTC, |d| local_midnight(d, tz)),
            end: to.map_or(DateTime::<Utc>::MAX_UTC, |d| local_midnight(d + Days::new(1), tz)),
        }
    }
}

fn local_midnight(date: NaiveDate, tz: &FixedOffset) -> DateTime<Utc> {
    let local = date.and_time(NaiveTime::MIN);
    let utc = local - Duration::seconds(i64::from(tz.local_minus_utc()));
    DateTime::from_naive_utc_and_offset(utc, Utc)
}

/// A calendar month, represented by its first day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CalendarMonth(NaiveDate);

impl CalendarMonth {
    /// The month containing `instant` as seen from `tz`.
    pub fn containing(instant: DateTime<Utc>, tz: &FixedOffset) -> Self {
        let date = instant.with_timezone(tz).date_naive();
        Self(date - Days::new(u64::from(date.day0())))
    }

    /// The month `months` away from this one (negative goes back).
    pub fn offset(self, months: i32) -> Self {
        let step = Months::new(months.unsigned_abs());
        if months >= 0 {
            Self(self.0 + step)
        } else {
            Self(self.0 - step)
        }
    }

    pub fn next(self) -> Self {
        self.offset(1)
    }

    /// `[first instant, first instant of next month)` in `tz`.
    pub fn window(&self, tz: &FixedOffset) -> TimeWindow {
        TimeWindow {
            start: local_midnight(self.0, tz),
            end: local_midnight(self.next().0, tz),
        }
    }

    /// Short month name and four-digit year, e.g. `Jan 2024`.
    pub fn label(&self) -> String {
        self.0.format("%b %Y").to_string()
    }

    /// `count` consecutive months ending with (and including) `self`, oldest first.
    pub fn trailing(self, count: usize) -> Vec<CalendarMonth> {
        let first = self.offset(1 - count as i32);
        std::iter::successors(Some(first), |m| Some(m.next()))
            .take(count)
            .collect()
    }
}

/// Parses a fixed UTC offset such as `+01:00`, `-0530`, `Z` or `UTC`.
pub fn parse_offset(value: &str) -> anyhow::Result<FixedOffset> {
    let value = value.trim();
    if value.eq_ignore_ascii_case("utc") || value == "Z" {
        return Ok(Utc.fix());
    }
    value
        .parse::<FixedOffset>()
        .map_err(|e| anyhow::anyhow!("Invalid timezone offset '{}': {}", value, e))
}
