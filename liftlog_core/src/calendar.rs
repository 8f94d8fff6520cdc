//! Calendar policy: where days and weeks begin.
//!
//! Sets are grouped by the local calendar day of their `date`. The local day
//! boundary comes from an explicit UTC offset instead of the platform locale,
//! so grouping is deterministic regardless of where the code runs.

use crate::{DateRange, Error, Result};
use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, Offset, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// First day of a calendar week
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum WeekStart {
    #[default]
    Monday,
    Sunday,
}

/// Day boundary and week rule used by every date-bucketing operation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CalendarPolicy {
    offset: FixedOffset,
    week_start: WeekStart,
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self::utc()
    }
}

impl CalendarPolicy {
    /// UTC days, Monday weeks
    pub fn utc() -> Self {
        Self {
            offset: Utc.fix(),
            week_start: WeekStart::Monday,
        }
    }

    /// Days bounded at the given offset east of UTC
    pub fn with_offset_minutes(minutes: i32, week_start: WeekStart) -> Result<Self> {
        let offset = FixedOffset::east_opt(minutes * 60).ok_or_else(|| {
            Error::Config(format!("UTC offset of {} minutes is out of range", minutes))
        })?;
        Ok(Self { offset, week_start })
    }

    /// Snapshot of the machine's current local offset
    pub fn system_local(week_start: WeekStart) -> Self {
        Self {
            offset: chrono::Local::now().offset().fix(),
            week_start,
        }
    }

    pub fn offset_minutes(&self) -> i32 {
        self.offset.local_minus_utc() / 60
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    /// Local calendar day an instant falls on
    pub fn day_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }

    /// Local noon of `day` as a UTC instant; used when a set is logged for a
    /// day rather than a moment
    pub fn midday_of(&self, day: NaiveDate) -> Result<DateTime<Utc>> {
        let local_noon = day
            .and_hms_opt(12, 0, 0)
            .ok_or_else(|| Error::Validation(format!("Cannot build midday for {}", day)))?;
        let utc_noon = local_noon - Duration::seconds(i64::from(self.offset.local_minus_utc()));
        Ok(Utc.from_utc_datetime(&utc_noon))
    }

    /// First day of the week containing `day`
    pub fn week_start_of(&self, day: NaiveDate) -> NaiveDate {
        let back = match self.week_start {
            WeekStart::Monday => day.weekday().num_days_from_monday(),
            WeekStart::Sunday => day.weekday().num_days_from_sunday(),
        };
        day - Duration::days(i64::from(back))
    }
}

/// "Now" plus the calendar rule for time-windowed queries
#[derive(Clone, Copy, Debug)]
pub struct AnalyticsContext {
    pub now: DateTime<Utc>,
    pub calendar: CalendarPolicy,
}

impl AnalyticsContext {
    pub fn new(now: DateTime<Utc>, calendar: CalendarPolicy) -> Self {
        Self { now, calendar }
    }

    pub fn today(&self) -> NaiveDate {
        self.calendar.day_of(self.now)
    }

    /// The `days`-long window ending today, inclusive of both ends
    pub fn day_window(&self, days: u32) -> Result<DateRange> {
        if days == 0 {
            return Err(Error::Validation("Window must span at least one day".into()));
        }
        let end = self.today();
        Ok(DateRange {
            start: end - Duration::days(i64::from(days) - 1),
            end,
        })
    }

    /// `weeks` whole calendar weeks ending with the current week
    pub fn week_window(&self, weeks: u32) -> Result<DateRange> {
        if weeks == 0 {
            return Err(Error::Validation("Window must span at least one week".into()));
        }
        let current = self.calendar.week_start_of(self.today());
        Ok(DateRange {
            start: current - Duration::weeks(i64::from(weeks) - 1),
            end: current + Duration::days(6),
        })
    }
}
