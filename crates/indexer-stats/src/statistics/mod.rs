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

//! Periodic statistic definitions.
//!
//! Every statistic owns one summary table keyed by `collected_for_day` and is
//! described entirely by its SQL templates plus a time-window policy. The
//! [crate::service::StatsService] decides which windows to run.

use std::{sync::Arc, time::SystemTime};

use thiserror::Error;

use crate::time_boundaries::{daily_start_of_range, SECONDS_PER_DAY};

mod daily_active_accounts_count;
mod daily_active_contracts_count;
mod daily_deleted_accounts_count;
mod daily_new_accounts_count;
mod daily_new_contracts_count;
mod daily_transactions_count;

pub use daily_active_accounts_count::DailyActiveAccountsCount;
pub use daily_active_contracts_count::DailyActiveContractsCount;
pub use daily_deleted_accounts_count::DailyDeletedAccountsCount;
pub use daily_new_accounts_count::DailyNewAccountsCount;
pub use daily_new_contracts_count::DailyNewContractsCount;
pub use daily_transactions_count::DailyTransactionsCount;

pub type StatisticObj = Arc<dyn PeriodicStatistic>;

/// A statistic computed once per fixed-length window.
///
/// Query contract:
/// - `sql_select` binds `$1` (window start) and `$2` (window end, exclusive) as
///   nanosecond timestamps and returns a single `BIGINT`.
/// - `sql_select_all` takes no parameters and returns `(date, count)` rows for
///   every completed day.
/// - `sql_insert` binds `$1` (`DATE`) and `$2` (`INTEGER`) and must not fail on
///   an existing day.
pub trait PeriodicStatistic: Send + Sync {
    fn table_name(&self) -> &'static str;

    fn value_column(&self) -> &'static str;

    fn sql_create_table(&self) -> &'static str;

    fn sql_drop_table(&self) -> &'static str;

    fn sql_select(&self) -> &'static str;

    fn sql_select_all(&self) -> &'static str;

    fn sql_insert(&self) -> &'static str;

    /// Name used to select the statistic from the command line.
    fn name(&self) -> &'static str {
        self.table_name()
    }

    fn duration_seconds(&self) -> u64 {
        SECONDS_PER_DAY
    }

    /// Start (seconds) of the window to compute for `requested_timestamp`.
    fn start_of_range(&self, requested_timestamp: Option<u64>) -> u64 {
        let now = SystemTime::now()
            .duration_since(SystemTime::UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or_default();
        daily_start_of_range(requested_timestamp, now)
    }
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("Unknown statistic: {0}")]
pub struct UnknownStatistic(pub String);

/// Every statistic known to the service, in computation order.
pub fn all_statistics() -> Vec<StatisticObj> {
    vec![
        Arc::new(DailyTransactionsCount),
        Arc::new(DailyActiveAccountsCount),
        Arc::new(DailyNewAccountsCount),
        Arc::new(DailyDeletedAccountsCount),
        Arc::new(DailyActiveContractsCount),
        Arc::new(DailyNewContractsCount),
    ]
}

pub fn find_statistic(name: &str) -> Option<StatisticObj> {
    all_statistics().into_iter().find(|stat| stat.name() == name)
}

/// Resolves `names` into statistics. An empty list selects all of them.
pub fn select_statistics(names: &[String]) -> Result<Vec<StatisticObj>, UnknownStatistic> {
    if names.is_empty() {
        return Ok(all_statistics());
    }
    names
        .iter()
        .map(|name| find_statistic(name).ok_or_else(|| UnknownStatistic(name.clone())))
        .collect()
}
