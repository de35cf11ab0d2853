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

use super::PeriodicStatistic;

pub struct DailyTransactionsCount;

impl PeriodicStatistic for DailyTransactionsCount {
    fn table_name(&self) -> &'static str {
        "daily_transactions_count"
    }

    fn value_column(&self) -> &'static str {
        "transactions_count"
    }

    fn sql_create_table(&self) -> &'static str {
        // Peak daily volume is far below 2^31.
        r#"
        CREATE TABLE IF NOT EXISTS daily_transactions_count
        (
            collected_for_day  DATE PRIMARY KEY,
            transactions_count INTEGER NOT NULL
        )
        "#
    }

    fn sql_drop_table(&self) -> &'static str {
        "DROP TABLE IF EXISTS daily_transactions_count"
    }

    fn sql_select(&self) -> &'static str {
        r#"
        SELECT COUNT(*)
        FROM transactions
        WHERE transactions.block_timestamp >= $1
            AND transactions.block_timestamp < $2
        "#
    }

    fn sql_select_all(&self) -> &'static str {
        r#"
        SELECT
            CAST(DATE_TRUNC('day', TO_TIMESTAMP(DIV(transactions.block_timestamp, 1000 * 1000 * 1000)) AT TIME ZONE 'UTC') AS DATE) AS date,
            COUNT(*) AS transactions_count_by_date
        FROM transactions
        WHERE transactions.block_timestamp < (CAST(EXTRACT(EPOCH FROM DATE_TRUNC('day', NOW() AT TIME ZONE 'UTC')) AS BIGINT) * 1000 * 1000 * 1000)
        GROUP BY date
        ORDER BY date
        "#
    }

    fn sql_insert(&self) -> &'static str {
        r#"
        INSERT INTO daily_transactions_count (collected_for_day, transactions_count)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#
    }
}
