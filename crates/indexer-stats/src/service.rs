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

use std::{sync::Arc, time::SystemTime};

use anyhow::{anyhow, Context};
use tokio::time::Duration;

use crate::{
    db::{DailyCount, DbError, DbObj, PgStatsDb},
    statistics::{PeriodicStatistic, StatisticObj},
    time_boundaries::{
        date_to_day_start, day_to_date, get_day_start, get_next_day, get_previous_finished_day,
        iter_daily_periods, seconds_to_nanos, NANOS_PER_SECOND,
    },
    ServiceError,
};

/// Result of computing a single window of a statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowOutcome {
    /// The window was computed and its row inserted.
    Stored(i64),
    /// A row for the window already exists; nothing was written.
    AlreadyCollected,
    /// The indexer has not reached the end of the window yet; nothing was written.
    IndexerBehind,
}

#[derive(Clone)]
pub struct StatsServiceConfig {
    pub interval: Duration,
    pub retries: u32,
}

#[derive(Clone)]
pub struct StatsService {
    pub db: DbObj,
    pub statistics: Vec<StatisticObj>,
    pub config: StatsServiceConfig,
}

impl StatsService {
    pub async fn new(
        indexer_db_conn: &str,
        analytics_db_conn: Option<&str>,
        statistics: Vec<StatisticObj>,
        config: StatsServiceConfig,
    ) -> Result<Self, ServiceError> {
        let db: DbObj = Arc::new(PgStatsDb::new(indexer_db_conn, analytics_db_conn).await?);

        Ok(Self::with_db(db, statistics, config))
    }

    pub fn with_db(db: DbObj, statistics: Vec<StatisticObj>, config: StatsServiceConfig) -> Self {
        Self { db, statistics, config }
    }

    pub async fn create_tables(&self) -> Result<(), ServiceError> {
        for stat in &self.statistics {
            self.db.create_table(stat.as_ref()).await?;
            tracing::info!("Created table {}", stat.table_name());
        }
        Ok(())
    }

    pub async fn drop_tables(&self) -> Result<(), ServiceError> {
        for stat in &self.statistics {
            self.db.drop_table(stat.as_ref()).await?;
            tracing::info!("Dropped table {}", stat.table_name());
        }
        Ok(())
    }

    /// Computes the window selected by `requested_timestamp` for every statistic.
    pub async fn compute(
        &self,
        requested_timestamp: Option<u64>,
    ) -> Result<Vec<(&'static str, WindowOutcome)>, ServiceError> {
        let mut outcomes = Vec::with_capacity(self.statistics.len());
        for stat in &self.statistics {
            let start = stat.start_of_range(requested_timestamp);
            let outcome = self.compute_window(stat.as_ref(), start).await?;
            outcomes.push((stat.name(), outcome));
        }
        Ok(outcomes)
    }

    /// Computes the window of `stat` starting at `window_start` (seconds).
    pub async fn compute_window(
        &self,
        stat: &dyn PeriodicStatistic,
        window_start: u64,
    ) -> Result<WindowOutcome, ServiceError> {
        let day = day_to_date(window_start)
            .ok_or_else(|| anyhow!("Window start {window_start} is not a valid date"))?;

        if self.db.day_collected(stat, day).await? {
            tracing::debug!("{} already collected for {}", stat.name(), day);
            return Ok(WindowOutcome::AlreadyCollected);
        }

        let window_end = window_start + stat.duration_seconds();
        let from_ns = seconds_to_nanos(window_start)
            .ok_or_else(|| anyhow!("Window start {window_start} out of range"))?;
        let to_ns = seconds_to_nanos(window_end)
            .ok_or_else(|| anyhow!("Window end {window_end} out of range"))?;

        let latest = self.db.latest_indexed_timestamp().await?;
        if latest.map_or(true, |latest| latest < to_ns as u64) {
            tracing::debug!(
                "Indexer has not reached the end of {} for {} (latest block timestamp: {:?})",
                stat.name(),
                day,
                latest
            );
            return Ok(WindowOutcome::IndexerBehind);
        }

        tracing::debug!("Computing {} for {} [{}, {})", stat.name(), day, from_ns, to_ns);
        let count = self.db.collect(stat, from_ns, to_ns).await?;
        self.db.store(stat, &[DailyCount { day, count }]).await?;

        tracing::info!("Stored {} = {} for {}", stat.name(), count, day);
        Ok(WindowOutcome::Stored(count))
    }

    /// Fills every statistic from the complete indexer history, skipping days
    /// the indexer has not finished yet. Returns the number of inserted rows per statistic.
    pub async fn backfill(&self) -> Result<Vec<(&'static str, u64)>, ServiceError> {
        let mut inserted = Vec::with_capacity(self.statistics.len());
        for stat in &self.statistics {
            inserted.push((stat.name(), self.backfill_statistic(stat.as_ref()).await?));
        }
        Ok(inserted)
    }

    async fn backfill_statistic(&self, stat: &dyn PeriodicStatistic) -> Result<u64, ServiceError> {
        let start = std::time::Instant::now();

        let rows = self.db.collect_all(stat).await?;
        let computed = rows.len();

        // Only keep days the indexer has fully processed
        let latest = self.db.latest_indexed_timestamp().await?.unwrap_or_default();
        let rows: Vec<DailyCount> = rows
            .into_iter()
            .filter(|row| {
                date_to_day_start(row.day)
                    .and_then(|day_start| seconds_to_nanos(day_start + stat.duration_seconds()))
                    .is_some_and(|day_end| day_end as u64 <= latest)
            })
            .collect();
        let inserted = self.db.store(stat, &rows).await?;

        tracing::info!(
            "Backfilled {}: {} days computed, {} complete, {} inserted in {:?}",
            stat.name(),
            computed,
            rows.len(),
            inserted,
            start.elapsed()
        );
        Ok(inserted)
    }

    /// Computes every completed day (relative to `now`) missing from each statistic.
    ///
    /// An empty statistic is backfilled first. Days are processed in order and
    /// processing of a statistic stops at the first day the indexer has not finished.
    pub async fn catch_up(&self, now: u64) -> Result<(), ServiceError> {
        let last_finished_day = get_previous_finished_day(now);

        for stat in &self.statistics {
            let stat = stat.as_ref();
            let next_day = match self.next_day_to_compute(stat).await? {
                Some(next_day) => next_day,
                None => {
                    tracing::info!("{} is empty, running backfill", stat.name());
                    self.backfill_statistic(stat).await?;
                    match self.next_day_to_compute(stat).await? {
                        Some(next_day) => next_day,
                        // No activity in the indexed history, start from the newest day
                        // the indexer has finished so quiet days still get a row
                        None => self
                            .last_indexed_day(stat)
                            .await?
                            .map_or(last_finished_day, |day| day.min(last_finished_day)),
                    }
                }
            };

            if next_day > last_finished_day {
                tracing::debug!("{} is up to date", stat.name());
                continue;
            }

            for (day_start, _) in iter_daily_periods(next_day, last_finished_day) {
                if self.compute_window(stat, day_start).await? == WindowOutcome::IndexerBehind {
                    tracing::info!(
                        "Indexer is behind, {} will resume from {}",
                        stat.name(),
                        day_start
                    );
                    break;
                }
            }
        }

        Ok(())
    }

    async fn next_day_to_compute(
        &self,
        stat: &dyn PeriodicStatistic,
    ) -> Result<Option<u64>, ServiceError> {
        let Some(last_day) = self.db.last_collected_day(stat).await? else {
            return Ok(None);
        };
        let last_day_start = date_to_day_start(last_day)
            .ok_or_else(|| anyhow!("Collected day {last_day} predates the Unix epoch"))?;
        Ok(Some(get_next_day(last_day_start)))
    }

    /// Start of the newest window of `stat` the indexer has fully processed.
    async fn last_indexed_day(
        &self,
        stat: &dyn PeriodicStatistic,
    ) -> Result<Option<u64>, ServiceError> {
        let latest = self.db.latest_indexed_timestamp().await?;
        Ok(latest.and_then(|latest| {
            get_day_start(latest / NANOS_PER_SECOND).checked_sub(stat.duration_seconds())
        }))
    }

    async fn tick(&self, tables_ready: &mut bool) -> Result<(), ServiceError> {
        if !*tables_ready {
            self.create_tables().await?;
            *tables_ready = true;
        }

        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .context("System clock is before the Unix epoch")?
            .as_secs();
        self.catch_up(now).await
    }

    /// Creates missing summary tables, then keeps every statistic caught up until
    /// an irrecoverable error or too many consecutive failed ticks.
    pub async fn run(&self) -> Result<(), ServiceError> {
        let mut interval = tokio::time::interval(self.config.interval);

        let mut tables_ready = false;
        let mut attempt = 0;
        loop {
            interval.tick().await;

            match self.tick(&mut tables_ready).await {
                Ok(()) => {
                    attempt = 0;
                }
                Err(e) => match e {
                    // Recoverable errors
                    ServiceError::DatabaseError(DbError::SqlErr(_)) => {
                        attempt += 1;
                        tracing::warn!(
                            "Failed to compute statistics: {:?}, attempt number {}",
                            e,
                            attempt
                        );
                    }
                    // Irrecoverable errors
                    ServiceError::DatabaseError(_)
                    | ServiceError::MaxRetries
                    | ServiceError::Error(_) => {
                        tracing::error!("Failed to compute statistics: {:?}", e);
                        return Err(e);
                    }
                },
            }

            if attempt > self.config.retries {
                tracing::error!("Aborting after {} consecutive attempts", attempt);
                return Err(ServiceError::MaxRetries);
            }
        }
    }
}
