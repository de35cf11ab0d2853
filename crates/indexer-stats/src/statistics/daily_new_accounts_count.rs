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

/// Accounts whose creating receipt was included during the day.
pub struct DailyNewAccountsCount;

impl PeriodicStatistic for DailyNewAccountsCount {
    fn table_name(&self) -> &'static str {
        "daily_new_accounts_count"
    }

    fn value_column(&self) -> &'static str {
        "new_accounts_count"
    }

    fn sql_create_table(&self) -> &'static str {
        r#"
        CREATE TABLE IF NOT EXISTS daily_new_accounts_count
        (
            collected_for_day  DATE PRIMARY KEY,
            new_accounts_count INTEGER NOT NULL
        )
        "#
    }

    fn sql_drop_table(&self) -> &'static str {
        "DROP TABLE IF EXISTS daily_new_accounts_count"
    }

    fn sql_select(&self) -> &'static str {
        r#"
        SELECT COUNT(*)
        FROM accounts
        JOIN receipts ON receipts.receipt_id = accounts.created_by_receipt_id
        WHERE receipts.included_in_block_timestamp >= $1
            AND receipts.included_in_block_timestamp < $2
        "#
    }

    fn sql_select_all(&self) -> &'static str {
        r#"
        SELECT
            CAST(DATE_TRUNC('day', TO_TIMESTAMP(DIV(receipts.included_in_block_timestamp, 1000 * 1000 * 1000)) AT TIME ZONE 'UTC') AS DATE) AS date,
            COUNT(*) AS new_accounts_count_by_date
        FROM accounts
        JOIN receipts ON receipts.receipt_id = accounts.created_by_receipt_id
        WHERE receipts.included_in_block_timestamp < (CAST(EXTRACT(EPOCH FROM DATE_TRUNC('day', NOW() AT TIME ZONE 'UTC')) AS BIGINT) * 1000 * 1000 * 1000)
        GROUP BY date
        ORDER BY date
        "#
    }

    fn sql_insert(&self) -> &'static str {
        r#"
        INSERT INTO daily_new_accounts_count (collected_for_day, new_accounts_count)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#
    }
}
