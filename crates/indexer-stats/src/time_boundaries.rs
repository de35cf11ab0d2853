// Copyright 2026 Boundless Foundation, Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Time boundary calculation utilities for daily statistics.
//!
//! All boundaries are computed in seconds since the Unix epoch and aligned to
//! 00:00:00 UTC. The indexer stores block timestamps in nanoseconds, so window
//! bounds go through [seconds_to_nanos] before being bound into a query.

use chrono::{DateTime, NaiveDate};

pub const SECONDS_PER_DAY: u64 = 86400;
pub const NANOS_PER_SECOND: u64 = 1_000_000_000;

pub fn get_day_start(timestamp: u64) -> u64 {
    (timestamp / SECONDS_PER_DAY) * SECONDS_PER_DAY
}

/// Returns the start of the next calendar day
pub fn get_next_day(timestamp: u64) -> u64 {
    get_day_start(timestamp) + SECONDS_PER_DAY
}

/// Returns the start of the last fully completed day before `now`
pub fn get_previous_finished_day(now: u64) -> u64 {
    get_day_start(now).saturating_sub(SECONDS_PER_DAY)
}

/// Start of the window a daily statistic should cover.
///
/// An explicit timestamp selects the day containing it. Without one, the most
/// recent completed day (yesterday, relative to `now`) is used, since today's
/// data is still being indexed.
pub fn daily_start_of_range(requested_timestamp: Option<u64>, now: u64) -> u64 {
    match requested_timestamp {
        Some(timestamp) => get_day_start(timestamp),
        None => get_previous_finished_day(now),
    }
}

/// Returns an iterator over daily periods from start_ts to end_ts (inclusive).
/// Each iteration yields (period_start, period_end) where period_end is the start of the next day.
pub fn iter_daily_periods(start_ts: u64, end_ts: u64) -> impl Iterator<Item = (u64, u64)> {
    let start_day = get_day_start(start_ts);
    let end_day = get_day_start(end_ts);

    (start_day..=end_day)
        .step_by(SECONDS_PER_DAY as usize)
        .map(move |day_ts| (day_ts, get_next_day(day_ts)))
}

/// Converts a timestamp in seconds into the indexer's nanosecond scale.
/// Returns `None` if the result does not fit a Postgres `BIGINT`.
pub fn seconds_to_nanos(timestamp: u64) -> Option<i64> {
    timestamp.checked_mul(NANOS_PER_SECOND).and_then(|nanos| i64::try_from(nanos).ok())
}

/// Calendar date (UTC) of the day containing `timestamp`.
pub fn day_to_date(timestamp: u64) -> Option<NaiveDate> {
    let secs = i64::try_from(get_day_start(timestamp)).ok()?;
    DateTime::from_timestamp(secs, 0).map(|dt| dt.date_naive())
}

/// Start of the given UTC calendar date, in seconds.
pub fn date_to_day_start(date: NaiveDate) -> Option<u64> {
    let secs = date.and_hms_opt(0, 0, 0)?.and_utc().timestamp();
    u64::try_from(secs).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-11-14 00:00:00 UTC
    const MIDNIGHT_UTC: u64 = 1699920000;

    #[test]
    fn test_get_day_start() {
        // Midnight should return itself
        assert_eq!(get_day_start(MIDNIGHT_UTC), MIDNIGHT_UTC);

        assert_eq!(get_day_start(MIDNIGHT_UTC + 1), MIDNIGHT_UTC);
        assert_eq!(get_day_start(MIDNIGHT_UTC + 43200), MIDNIGHT_UTC); // noon
        assert_eq!(get_day_start(MIDNIGHT_UTC + 86399), MIDNIGHT_UTC); // 23:59:59

        // First second of next day should return next day's midnight
        assert_eq!(get_day_start(MIDNIGHT_UTC + 86400), MIDNIGHT_UTC + SECONDS_PER_DAY);
    }

    #[test]
    fn test_get_next_day() {
        assert_eq!(get_next_day(MIDNIGHT_UTC), MIDNIGHT_UTC + SECONDS_PER_DAY);
        assert_eq!(get_next_day(MIDNIGHT_UTC + 43200), MIDNIGHT_UTC + SECONDS_PER_DAY);
    }

    #[test]
    fn test_previous_finished_day() {
        assert_eq!(get_previous_finished_day(MIDNIGHT_UTC + 3600), MIDNIGHT_UTC - SECONDS_PER_DAY);
        // At exactly midnight the day that just ended is the finished one
        assert_eq!(get_previous_finished_day(MIDNIGHT_UTC), MIDNIGHT_UTC - SECONDS_PER_DAY);
        assert_eq!(get_previous_finished_day(100), 0);
    }

    #[test]
    fn test_daily_start_of_range() {
        let now = MIDNIGHT_UTC + 5 * 3600;

        // No request: yesterday
        assert_eq!(daily_start_of_range(None, now), MIDNIGHT_UTC - SECONDS_PER_DAY);

        // Explicit request: the day containing it, even if it is today
        assert_eq!(daily_start_of_range(Some(now), now), MIDNIGHT_UTC);
        assert_eq!(
            daily_start_of_range(Some(MIDNIGHT_UTC - 1), now),
            MIDNIGHT_UTC - SECONDS_PER_DAY
        );
    }

    #[test]
    fn test_iter_daily_periods() {
        let end_ts = MIDNIGHT_UTC + (2 * SECONDS_PER_DAY) + 3600; // 2 days + 1 hour later

        let periods: Vec<_> = iter_daily_periods(MIDNIGHT_UTC + 10, end_ts).collect();
        assert_eq!(periods.len(), 3);

        assert_eq!(periods[0], (MIDNIGHT_UTC, MIDNIGHT_UTC + SECONDS_PER_DAY));
        let last_day = get_day_start(end_ts);
        assert_eq!(periods[2], (last_day, get_next_day(last_day)));

        // A range inside a single day yields that day only
        let single: Vec<_> = iter_daily_periods(MIDNIGHT_UTC + 1, MIDNIGHT_UTC + 2).collect();
        assert_eq!(single, vec![(MIDNIGHT_UTC, MIDNIGHT_UTC + SECONDS_PER_DAY)]);
    }

    #[test]
    fn test_seconds_to_nanos() {
        assert_eq!(seconds_to_nanos(MIDNIGHT_UTC), Some(1_699_920_000_000_000_000));
        assert_eq!(seconds_to_nanos(u64::MAX), None);
        // Overflows i64 although it fits u64
        assert_eq!(seconds_to_nanos(10_000_000_000), None);
    }

    #[test]
    fn test_date_conversions() {
        let date = NaiveDate::from_ymd_opt(2023, 11, 14).unwrap();
        assert_eq!(day_to_date(MIDNIGHT_UTC + 43200), Some(date));
        assert_eq!(date_to_day_start(date), Some(MIDNIGHT_UTC));

        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(day_to_date(0), Some(epoch));
        assert_eq!(date_to_day_start(NaiveDate::from_ymd_opt(1969, 12, 31).unwrap()), None);
    }
}
