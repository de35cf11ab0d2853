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

/// Accounts whose first successful contract deployment happened during the day.
/// Redeploying to an account that already held a contract is not counted.
pub struct DailyNewContractsCount;

impl PeriodicStatistic for DailyNewContractsCount {
    fn table_name(&self) -> &'static str {
        "daily_new_contracts_count"
    }

    fn value_column(&self) -> &'static str {
        "new_contracts_count"
    }

    fn sql_create_table(&self) -> &'static str {
        r#"
        CREATE TABLE IF NOT EXISTS daily_new_contracts_count
        (
            collected_for_day   DATE PRIMARY KEY,
            new_contracts_count INTEGER NOT NULL
        )
        "#
    }

    fn sql_drop_table(&self) -> &'static str {
        "DROP TABLE IF EXISTS daily_new_contracts_count"
    }

    fn sql_select(&self) -> &'static str {
        r#"
        WITH first_deployments AS (
            SELECT
                action_receipt_actions.receipt_receiver_account_id AS account_id,
                MIN(execution_outcomes.executed_in_block_timestamp) AS deployed_at
            FROM action_receipt_actions
            JOIN execution_outcomes ON execution_outcomes.receipt_id = action_receipt_actions.receipt_id
            WHERE action_receipt_actions.action_kind = 'DEPLOY_CONTRACT'
                AND execution_outcomes.status IN ('SUCCESS_VALUE', 'SUCCESS_RECEIPT_ID')
                AND execution_outcomes.executed_in_block_timestamp < $2
            GROUP BY account_id
        )
        SELECT COUNT(*)
        FROM first_deployments
        WHERE first_deployments.deployed_at >= $1
        "#
    }

    fn sql_select_all(&self) -> &'static str {
        r#"
        WITH first_deployments AS (
            SELECT
                action_receipt_actions.receipt_receiver_account_id AS account_id,
                MIN(execution_outcomes.executed_in_block_timestamp) AS deployed_at
            FROM action_receipt_actions
            JOIN execution_outcomes ON execution_outcomes.receipt_id = action_receipt_actions.receipt_id
            WHERE action_receipt_actions.action_kind = 'DEPLOY_CONTRACT'
                AND execution_outcomes.status IN ('SUCCESS_VALUE', 'SUCCESS_RECEIPT_ID')
            GROUP BY account_id
        )
        SELECT
            CAST(DATE_TRUNC('day', TO_TIMESTAMP(DIV(first_deployments.deployed_at, 1000 * 1000 * 1000)) AT TIME ZONE 'UTC') AS DATE) AS date,
            COUNT(*) AS new_contracts_count_by_date
        FROM first_deployments
        WHERE first_deployments.deployed_at < (CAST(EXTRACT(EPOCH FROM DATE_TRUNC('day', NOW() AT TIME ZONE 'UTC')) AS BIGINT) * 1000 * 1000 * 1000)
        GROUP BY date
        ORDER BY date
        "#
    }

    fn sql_insert(&self) -> &'static str {
        r#"
        INSERT INTO daily_new_contracts_count (collected_for_day, new_contracts_count)
        VALUES ($1, $2)
        ON CONFLICT DO NOTHING
        "#
    }
}
