// Copyright (c) 2025 Rajan Panneer Selvam
//
// Licensed under the Business Source License 1.1 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.mariadb.com/bsl11
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.


use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;
use kube::{Resource, ResourceExt};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::Context;
use crate::errors::OperatorError;
use crate::metrics;
use crate::models::{Account, AccountPool, AccountPoolStatus, AccountSpec};

const REQUEUE_FILLING: Duration = Duration::from_secs(30);
const REQUEUE_STEADY: Duration = Duration::from_secs(300);

/// Pool census over the account list: truly unclaimed, claimed, and recycled
/// ready accounts.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PoolCounts {
    pub unclaimed: u32,
    pub claimed: u32,
    pub recycled: u32,
    pub total: u32,
}

pub fn count_accounts(accounts: &[Account]) -> PoolCounts {
    let mut counts = PoolCounts::default();
    for account in accounts {
        counts.total += 1;
        if account.is_claimed() {
            counts.claimed += 1;
        } else if account.is_ready() && account.is_reused() {
            counts.recycled += 1;
        } else if account.is_unclaimed() {
            counts.unclaimed += 1;
        }
    }
    counts
}

pub fn deficit(pool_size: u32, unclaimed: u32) -> u32 {
    pool_size.saturating_sub(unclaimed)
}

pub async fn reconcile(pool: Arc<AccountPool>, ctx: Arc<Context>) -> Result<Action, OperatorError> {
    let namespace = pool
        .namespace()
        .unwrap_or_else(|| ctx.operator_namespace().to_string());
    let pools: Api<AccountPool> = Api::namespaced(ctx.client.clone(), &namespace);
    let accounts: Api<Account> = Api::namespaced(ctx.client.clone(), &namespace);

    let account_list = accounts
        .list(&Default::default())
        .await
        .map_err(OperatorError::KubeError)?;
    let counts = count_accounts(&account_list.items);

    let missing = deficit(pool.spec.pool_size, counts.unclaimed);
    if missing > 0 {
        let operator_config = ctx
            .configmaps
            .read_operator_config(
                &ctx.config.operator.configmap_name,
                ctx.operator_namespace(),
            )
            .await?;

        let under_ceiling = operator_config
            .account_limit
            .map(|limit| counts.total < limit)
            .unwrap_or(true);

        if under_ceiling {
            // One record per cycle spreads organization-level creation rate;
            // account events re-drive this loop.
            create_pool_account(&accounts, &pool).await?;
            info!(
                pool = %pool.name_any(),
                unclaimed = counts.unclaimed,
                target = pool.spec.pool_size,
                "Created account record to fill pool"
            );
        } else {
            warn!(
                pool = %pool.name_any(),
                total = counts.total,
                limit = ?operator_config.account_limit,
                "Account ceiling reached, not creating new accounts"
            );
        }
    }

    let status = AccountPoolStatus {
        pool_size: pool.spec.pool_size,
        unclaimed_accounts: counts.unclaimed,
        claimed_accounts: counts.claimed,
    };
    pools
        .patch_status(
            &pool.name_any(),
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "status": status })),
        )
        .await
        .map_err(OperatorError::KubeError)?;

    metrics::observe_reconcile("pool", "ok");
    if missing > 0 {
        Ok(Action::requeue(REQUEUE_FILLING))
    } else {
        Ok(Action::requeue(REQUEUE_STEADY))
    }
}

async fn create_pool_account(
    accounts: &Api<Account>,
    pool: &AccountPool,
) -> Result<(), OperatorError> {
    let owner_ref = pool.controller_owner_ref(&()).ok_or_else(|| {
        OperatorError::InternalError("pool record is missing a uid".to_string())
    })?;

    let account = Account {
        metadata: ObjectMeta {
            generate_name: Some("osd-creds-mgmt-".to_string()),
            namespace: pool.namespace(),
            owner_references: Some(vec![owner_ref]),
            ..ObjectMeta::default()
        },
        spec: AccountSpec::default(),
        status: None,
    };

    accounts
        .create(&PostParams::default(), &account)
        .await
        .map_err(OperatorError::KubeError)?;
    Ok(())
}
