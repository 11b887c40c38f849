//! Lightweight cron expression parser.
//! Supports: "MIN HOUR DOM MON DOW" (5-field, no seconds), read as wall-clock time
//! in an IANA time zone, so fires follow daylight saving changes.
//! Fields: *, */N, N, A-B, and comma lists of those.
//! DOW: 0-6 with 0 = Sunday (7 is also Sunday).
//! Example: "0 18 * * 6" = every Saturday at 18:00.

use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use rollcall_core::traits::Schedule;
use rollcall_core::{Result, RollcallError};

/// How far ahead to search for a matching day.
const MAX_SEARCH_DAYS: i64 = 366 * 5;

/// A parsed cron expression bound to a time zone.
#[derive(Debug, Clone)]
pub struct CronSchedule {
    expression: String,
    zone: Tz,
    minutes: Vec<u32>,
    hours: Vec<u32>,
    days_of_month: Vec<u32>,
    months: Vec<u32>,
    days_of_week: Vec<u32>,
    dom_restricted: bool,
    dow_restricted: bool,
}

impl CronSchedule {
    /// Parse `expression`, interpreting times as local time in `zone`.
    pub fn parse(expression: &str, zone: Tz) -> Result<Self> {
        let parts: Vec<&str> = expression.split_whitespace().collect();
        if parts.len() != 5 {
            return Err(RollcallError::Schedule(format!(
                "Invalid cron expression '{expression}' (need 5 fields: MIN HOUR DOM MON DOW)"
            )));
        }
        let field = |idx: usize, min: u32, max: u32| {
            parse_field(parts[idx], min, max).ok_or_else(|| {
                RollcallError::Schedule(format!(
                    "Invalid field '{}' in cron expression '{expression}'",
                    parts[idx]
                ))
            })
        };

        let mut days_of_week = field(4, 0, 7)?;
        for d in days_of_week.iter_mut() {
            if *d == 7 {
                *d = 0;
            }
        }
        days_of_week.sort_unstable();
        days_of_week.dedup();

        Ok(Self {
            expression: expression.to_string(),
            zone,
            minutes: field(0, 0, 59)?,
            hours: field(1, 0, 23)?,
            days_of_month: field(2, 1, 31)?,
            months: field(3, 1, 12)?,
            days_of_week,
            dom_restricted: parts[2] != "*",
            dow_restricted: parts[4] != "*",
        })
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn zone(&self) -> Tz {
        self.zone
    }

    /// Standard cron rule: when both DOM and DOW are restricted, either may match.
    fn day_matches(&self, date: NaiveDate) -> bool {
        if !self.months.contains(&date.month()) {
            return false;
        }
        let dom = self.days_of_month.contains(&date.day());
        let dow = self
            .days_of_week
            .contains(&date.weekday().num_days_from_sunday());
        match (self.dom_restricted, self.dow_restricted) {
            (true, true) => dom || dow,
            (true, false) => dom,
            (false, true) => dow,
            (false, false) => true,
        }
    }
}

impl Schedule for CronSchedule {
    fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let local_start = after.with_timezone(&self.zone).date_naive();

        for day in 0..MAX_SEARCH_DAYS {
            let date = local_start + Duration::days(day);
            if !self.day_matches(date) {
                continue;
            }
            for &h in &self.hours {
                for &m in &self.minutes {
                    let Some(naive) = date.and_hms_opt(h, m, 0) else {
                        continue;
                    };
                    // Skipped wall-clock times (spring forward) do not fire;
                    // repeated ones (fall back) fire at the first occurrence.
                    let Some(local) = self.zone.from_local_datetime(&naive).earliest() else {
                        continue;
                    };
                    let candidate = local.with_timezone(&Utc);
                    if candidate > after {
                        return Some(candidate);
                    }
                }
            }
        }

        tracing::warn!("Cron expression '{}' never fires", self.expression);
        None
    }

    fn describe(&self) -> String {
        format!("{} ({})", self.expression, self.zone)
    }
}

/// Earliest fire time across several schedules.
pub struct CompositeSchedule {
    parts: Vec<Arc<dyn Schedule>>,
}

impl CompositeSchedule {
    pub fn new(parts: Vec<Arc<dyn Schedule>>) -> Self {
        Self { parts }
    }
}

impl Schedule for CompositeSchedule {
    fn next_fire(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        self.parts.iter().filter_map(|s| s.next_fire(after)).min()
    }

    fn describe(&self) -> String {
        self.parts
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Calendar date of `t` in `zone`.
pub fn local_date(t: DateTime<Utc>, zone: Tz) -> NaiveDate {
    t.with_timezone(&zone).date_naive()
}

/// Parse a cron field into a sorted list of matching values.
fn parse_field(field: &str, min: u32, max: u32) -> Option<Vec<u32>> {
    let mut values = Vec::new();
    for item in field.split(',') {
        let item = item.trim();
        if item == "*" {
            values.extend(min..=max);
            continue;
        }

        // */N: every N
        if let Some(step) = item.strip_prefix("*/") {
            let n: u32 = step.parse().ok()?;
            if n == 0 {
                return None;
            }
            values.extend((min..=max).step_by(n as usize));
            continue;
        }

        // A-B: inclusive range
        if let Some((lo, hi)) = item.split_once('-') {
            let lo: u32 = lo.parse().ok()?;
            let hi: u32 = hi.parse().ok()?;
            if lo < min || hi > max || lo > hi {
                return None;
            }
            values.extend(lo..=hi);
            continue;
        }

        // Single number
        let n: u32 = item.parse().ok()?;
        if n < min || n > max {
            return None;
        }
        values.push(n);
    }
    values.sort_unstable();
    values.dedup();
    if values.is_empty() { None } else { Some(values) }
}
