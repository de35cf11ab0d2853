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

/// Distinct contracts that successfully executed at least one function call.
pub struct DailyActiveContractsCount;

impl PeriodicStatistic for DailyActiveContractsCount {
    fn table_name(&self) -> &'static str {
        "daily_active_contracts_count"
    }

    fn value_column(&self) -> &'static str {
        "active_contracts_count"
    }

    fn sql_create_table(&self) -> &'static str {
        // Mainnet has on the order of 10^6 accounts, well within INTEGER.
        r#"
        CREATE TABLE IF NOT EXISTS daily_active_contracts_count
        (
            collected_for_day      DATE PRIMARY KEY,
            active_contracts_count INTEGER NOT NULL
        )
        "#
    }

    fn sql_drop_table(&self) -> &'static str {
        "DROP TABLE IF EXISTS daily_active_contracts_count"
    }

    fn sql_select(&self) -> &'static str {
        r#"
        SELECT COUNT(DISTINCT execution_outcomes.executor_account_id)
        FROM action_receipt_actions
        JOIN execution_outcomes ON execution_outcomes.receipt_id = action_receipt_actions.receipt_id
        WHERE execution_outcomes.executed_in_block_timestamp >= $1
            AND execution_outcomes.executed_in_block_timestamp < $2
            AND action_receipt_actions.action_kind = 'FUNCTION_CALL'
            AND execution_outcomes.status IN ('SUCCESS_VALUE', 'SUCCESS_RECEIPT_ID')
        "#
    }

    fn sql_select_all(&self) -> &'static str {
        r#"
        SELECT
            CAST(DATE_TRUNC('day', TO_TIMESTAMP(DIV(execution_outcomes.executed_in_block_timestamp, 1000 * 1000 * 1000)) AT TIME ZONE 'UTC') AS DATE) AS date,
            COUNT(DISTINCT execution_outcomes.executor_account_id) AS active_contracts_count_by_date
        FROM action_receipt_actions
        JOIN execution_outcomes ON execution_outcomes.receipt_id = action_receipt_actions.receipt_id
        WHERE action_receipt_actions.action_kind = 'FUNCTION_CALL'
            AND execution_outcomes.status IN ('SUCCESS_VALUE', 'SUCCESS_RECEIPT_ID')
            AND execution_outcomes.executed_in_block_timestamp < (CAST(EXTRACT(EPOCH FROM DATE_TRUNC('day', NOW() AT TIME ZONE 'UTC')) AS BIGINT) * 1000 * 1000 * 1000)
        GROUP BY date
        ORDER BY date
        "#
    }

    fn sql_insert(&self) -> &'static str {
        r#"
        INSERT INTO daily_active_contracts_count (collected_for_day, active_contracts_count)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#
    }
}
