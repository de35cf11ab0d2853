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

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{
    postgres::{PgPool, PgPoolOptions},
    Row,
};
use thiserror::Error;

use crate::statistics::PeriodicStatistic;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQL error: {0}")]
    SqlErr(#[from] sqlx::Error),

    #[error("Count {count} of {statistic} for {day} does not fit an INTEGER column")]
    CountOverflow { statistic: &'static str, day: NaiveDate, count: i64 },

    #[error("Invalid timestamp: {0}")]
    BadTimestamp(i64),
}

/// One computed value of a daily statistic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyCount {
    pub day: NaiveDate,
    pub count: i64,
}

#[async_trait]
pub trait StatsDb {
    async fn create_table(&self, stat: &dyn PeriodicStatistic) -> Result<(), DbError>;
    async fn drop_table(&self, stat: &dyn PeriodicStatistic) -> Result<(), DbError>;

    /// Runs the incremental select over `[from_ns, to_ns)`.
    async fn collect(
        &self,
        stat: &dyn PeriodicStatistic,
        from_ns: i64,
        to_ns: i64,
    ) -> Result<i64, DbError>;
    /// Runs the backfill select over every completed day.
    async fn collect_all(&self, stat: &dyn PeriodicStatistic) -> Result<Vec<DailyCount>, DbError>;

    /// Inserts `rows`, skipping days that already exist. Returns the number of inserted rows.
    async fn store(&self, stat: &dyn PeriodicStatistic, rows: &[DailyCount])
        -> Result<u64, DbError>;
    async fn last_collected_day(
        &self,
        stat: &dyn PeriodicStatistic,
    ) -> Result<Option<NaiveDate>, DbError>;
    async fn day_collected(
        &self,
        stat: &dyn PeriodicStatistic,
        day: NaiveDate,
    ) -> Result<bool, DbError>;

    /// Timestamp (ns) of the newest block in the indexer database.
    async fn latest_indexed_timestamp(&self) -> Result<Option<u64>, DbError>;
}

pub type DbObj = Arc<dyn StatsDb + Send + Sync>;

/// Postgres backed [StatsDb].
///
/// Statistics are read from the indexer database and written to the analytics
/// database; both may point at the same server.
pub struct PgStatsDb {
    indexer: PgPool,
    analytics: PgPool,
}

impl PgStatsDb {
    /// Constructs a [PgStatsDb] from existing pools
    pub fn from_pools(indexer: PgPool, analytics: PgPool) -> Self {
        Self { indexer, analytics }
    }

    /// Construct a new [PgStatsDb] from connection strings
    ///
    /// Without an analytics connection string the indexer database is used for both.
    pub async fn new(indexer_conn: &str, analytics_conn: Option<&str>) -> Result<Self, DbError> {
        let indexer = PgPoolOptions::new().max_connections(5).connect(indexer_conn).await?;
        let analytics = match analytics_conn {
            Some(conn) => PgPoolOptions::new().max_connections(5).connect(conn).await?,
            None => indexer.clone(),
        };

        Ok(Self::from_pools(indexer, analytics))
    }
}

pub(crate) fn to_integer(stat: &dyn PeriodicStatistic, row: &DailyCount) -> Result<i32, DbError> {
    i32::try_from(row.count).map_err(|_| DbError::CountOverflow {
        statistic: stat.name(),
        day: row.day,
        count: row.count,
    })
}

#[async_trait]
impl StatsDb for PgStatsDb {
    async fn create_table(&self, stat: &dyn PeriodicStatistic) -> Result<(), DbError> {
        tracing::trace!("Creating table {}", stat.table_name());
        sqlx::query(stat.sql_create_table()).execute(&self.analytics).await?;
        Ok(())
    }

    async fn drop_table(&self, stat: &dyn PeriodicStatistic) -> Result<(), DbError> {
        tracing::trace!("Dropping table {}", stat.table_name());
        sqlx::query(stat.sql_drop_table()).execute(&self.analytics).await?;
        Ok(())
    }

    async fn collect(
        &self,
        stat: &dyn PeriodicStatistic,
        from_ns: i64,
        to_ns: i64,
    ) -> Result<i64, DbError> {
        let count: Option<i64> = sqlx::query_scalar(stat.sql_select())
            .bind(from_ns)
            .bind(to_ns)
            .fetch_one(&self.indexer)
            .await?;
        Ok(count.unwrap_or_default())
    }

    async fn collect_all(&self, stat: &dyn PeriodicStatistic) -> Result<Vec<DailyCount>, DbError> {
        let rows = sqlx::query(stat.sql_select_all()).fetch_all(&self.indexer).await?;

        rows.iter()
            .map(|row| -> Result<DailyCount, DbError> {
                Ok(DailyCount { day: row.try_get::<NaiveDate, _>(0)?, count: row.try_get(1)? })
            })
            .collect()
    }

    async fn store(
        &self,
        stat: &dyn PeriodicStatistic,
        rows: &[DailyCount],
    ) -> Result<u64, DbError> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.analytics.begin().await?;
        let mut inserted = 0;
        for row in rows {
            let count = to_integer(stat, row)?;
            let res = sqlx::query(stat.sql_insert())
                .bind(row.day)
                .bind(count)
                .execute(&mut *tx)
                .await?;
            inserted += res.rows_affected();
        }
        tx.commit().await?;

        Ok(inserted)
    }

    async fn last_collected_day(
        &self,
        stat: &dyn PeriodicStatistic,
    ) -> Result<Option<NaiveDate>, DbError> {
        let day: Option<NaiveDate> =
            sqlx::query_scalar(&format!("SELECT MAX(collected_for_day) FROM {}", stat.table_name()))
                .fetch_one(&self.analytics)
                .await?;
        Ok(day)
    }

    async fn day_collected(
        &self,
        stat: &dyn PeriodicStatistic,
        day: NaiveDate,
    ) -> Result<bool, DbError> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT 1 FROM {} WHERE collected_for_day = $1)",
            stat.table_name()
        ))
        .bind(day)
        .fetch_one(&self.analytics)
        .await?;
        Ok(exists)
    }

    async fn latest_indexed_timestamp(&self) -> Result<Option<u64>, DbError> {
        let ts: Option<i64> =
            sqlx::query_scalar("SELECT CAST(MAX(block_timestamp) AS BIGINT) FROM blocks")
                .fetch_one(&self.indexer)
                .await?;

        ts.map(|ts| u64::try_from(ts).map_err(|_| DbError::BadTimestamp(ts))).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::statistics::DailyTransactionsCount;

    #[test]
    fn integer_conversion() {
        let day = NaiveDate::from_ymd_opt(2021, 9, 1).unwrap();
        let stat = DailyTransactionsCount;

        let row = DailyCount { day, count: 1_000_000 };
        assert_eq!(to_integer(&stat, &row).unwrap(), 1_000_000);

        let row = DailyCount { day, count: i64::from(i32::MAX) + 1 };
        match to_integer(&stat, &row) {
            Err(DbError::CountOverflow { statistic, day: d, count }) => {
                assert_eq!(statistic, "daily_transactions_count");
                assert_eq!(d, day);
                assert_eq!(count, row.count);
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
