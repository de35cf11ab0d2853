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

use std::time::Duration;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use indexer_stats::{
    statistics::{all_statistics, select_statistics},
    StatsService, StatsServiceConfig, WindowOutcome,
};

/// Arguments of the statistics service.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct MainArgs {
    /// Indexer DB connection string (read only access is enough).
    #[clap(long, env = "INDEXER_DATABASE_URL")]
    indexer_db: String,
    /// Analytics DB connection string. Defaults to the indexer DB.
    #[clap(long, env = "ANALYTICS_DATABASE_URL")]
    analytics_db: Option<String>,
    /// Comma separated statistic names to operate on. Defaults to all of them.
    #[clap(long, env, value_delimiter = ',')]
    stats: Vec<String>,
    /// Whether to log in JSON format.
    #[clap(long, env, default_value_t = false)]
    log_json: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the available statistics.
    List,
    /// Create the summary tables.
    CreateTables,
    /// Drop the summary tables.
    DropTables,
    /// Compute a single day.
    Compute {
        /// Unix timestamp (seconds) inside the day to compute. Defaults to yesterday.
        #[clap(long)]
        timestamp: Option<u64>,
    },
    /// Compute every completed day from the full indexer history.
    Backfill,
    /// Keep the statistics up to date until interrupted.
    Run {
        /// Interval in seconds between checking for newly completed days.
        #[clap(long, default_value = "600")]
        interval: u64,
        /// Number of retries before quitting after an error.
        #[clap(long, default_value = "10")]
        retries: u32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    match dotenvy::dotenv() {
        Ok(_) => {}
        Err(e) if e.not_found() => {}
        Err(e) => bail!("failed to load .env file: {}", e),
    }

    let args = MainArgs::parse();

    if args.log_json {
        tracing_subscriber::fmt()
            .with_ansi(false)
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .init();
    }

    if let Command::List = args.command {
        for stat in all_statistics() {
            println!("{}", stat.name());
        }
        return Ok(());
    }

    let statistics = select_statistics(&args.stats)?;

    let config = match args.command {
        Command::Run { interval, retries } => {
            StatsServiceConfig { interval: Duration::from_secs(interval), retries }
        }
        _ => StatsServiceConfig { interval: Duration::from_secs(600), retries: 0 },
    };

    let service =
        StatsService::new(&args.indexer_db, args.analytics_db.as_deref(), statistics, config)
            .await?;

    match args.command {
        Command::List => {}
        Command::CreateTables => service.create_tables().await?,
        Command::DropTables => service.drop_tables().await?,
        Command::Compute { timestamp } => {
            for (name, outcome) in service.compute(timestamp).await? {
                match outcome {
                    WindowOutcome::Stored(count) => tracing::info!("{name}: stored {count}"),
                    WindowOutcome::AlreadyCollected => {
                        tracing::info!("{name}: already collected, skipped")
                    }
                    WindowOutcome::IndexerBehind => {
                        tracing::warn!("{name}: indexer has not finished the requested day yet")
                    }
                }
            }
        }
        Command::Backfill => {
            for (name, inserted) in service.backfill().await? {
                tracing::info!("{name}: inserted {inserted} days");
            }
        }
        Command::Run { .. } => {
            tracing::info!(
                "Keeping {} statistics up to date every {:?}",
                service.statistics.len(),
                service.config.interval
            );
            if let Err(err) = service.run().await {
                bail!("FATAL: Error running the statistics service: {err}");
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_run_args() {
        let args = MainArgs::try_parse_from([
            "indexer-stats",
            "--indexer-db",
            "postgres://localhost/indexer",
            "--stats",
            "daily_transactions_count,daily_active_contracts_count",
            "run",
            "--interval",
            "60",
        ])
        .unwrap();

        assert_eq!(args.stats, vec!["daily_transactions_count", "daily_active_contracts_count"]);
        match args.command {
            Command::Run { interval, retries } => {
                assert_eq!(interval, 60);
                assert_eq!(retries, 10);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn parse_compute_args() {
        let args = MainArgs::try_parse_from([
            "indexer-stats",
            "--indexer-db",
            "postgres://localhost/indexer",
            "--analytics-db",
            "postgres://localhost/analytics",
            "compute",
            "--timestamp",
            "1699963200",
        ])
        .unwrap();

        assert!(args.stats.is_empty());
        assert_eq!(args.analytics_db.as_deref(), Some("postgres://localhost/analytics"));
        assert!(matches!(args.command, Command::Compute { timestamp: Some(1699963200) }));
    }
}
