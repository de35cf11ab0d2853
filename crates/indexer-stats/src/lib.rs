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

//! Daily aggregate statistics over a NEAR indexer database.
//!
//! Each [statistics::PeriodicStatistic] owns one summary table holding a
//! single count per calendar day. [StatsService] creates those tables,
//! backfills them from the full indexer history, and keeps them current by
//! computing each completed day once the indexer has caught up with it.

use thiserror::Error;

pub mod db;
pub mod service;
pub mod statistics;
pub mod time_boundaries;

pub use db::{DailyCount, DbError, DbObj, PgStatsDb, StatsDb};
pub use service::{StatsService, StatsServiceConfig, WindowOutcome};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DbError),

    #[error("Maximum retries reached")]
    MaxRetries,

    /// General error.
    #[error("Error: {0}")]
    Error(#[from] anyhow::Error),
}
