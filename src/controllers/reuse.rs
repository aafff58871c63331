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


use chrono::Utc;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::ResourceExt;
use tracing::{info, warn};

use super::Context;
use crate::errors::OperatorError;
use crate::models::condition::{set_condition, ConditionStatus, ConditionType, UpdateConditionPolicy};
use crate::models::{Account, AccountClaim, AccountState};
use crate::services::aws::client_factory::CredentialsScope;

/// Release the backing account of a deleted claim.
///
/// Non-BYOC accounts get a remote resource sweep and return to the unclaimed
/// pool marked `reused`; a sweep failure parks the account in Failed and the
/// claim finalizer stays until resolved. BYOC accounts skip remote cleanup
/// entirely; their synthesized record is deleted.
pub async fn release_account(ctx: &Context, claim: &AccountClaim) -> Result<(), OperatorError> {
    if claim.spec.account_link.is_empty() {
        return Ok(());
    }

    let namespace = ctx.operator_namespace();
    let accounts: Api<Account> = Api::namespaced(ctx.client.clone(), namespace);
    let account = match accounts
        .get_opt(&claim.spec.account_link)
        .await
        .map_err(OperatorError::KubeError)?
    {
        Some(account) => account,
        None => return Ok(()),
    };

    if claim.spec.byoc {
        accounts
            .delete(&account.name_any(), &DeleteParams::default())
            .await
            .map_err(OperatorError::KubeError)?;
        info!(account = %account.name_any(), "BYOC account record deleted on claim release");
        return Ok(());
    }

    if !account.is_ready() && !account.is_failed() {
        // Claim deleted mid-creation: no consumer resources exist yet, so
        // cleanup is skipped and the account keeps converging toward the
        // unclaimed pool.
        unlink_account(&accounts, &account).await?;
        return Ok(());
    }

    if let Err(err) = sweep_account_resources(ctx, claim, &account).await {
        let mut status = account.status.clone().unwrap_or_default();
        status.state = Some(AccountState::Failed);
        set_condition(
            &mut status.conditions,
            ConditionType::AccountReused,
            ConditionStatus::True,
            "CleanupFailed",
            &err.to_string(),
            UpdateConditionPolicy::Always,
            Utc::now(),
        );
        accounts
            .patch_status(
                &account.name_any(),
                &PatchParams::default(),
                &Patch::Merge(serde_json::json!({ "status": status })),
            )
            .await
            .map_err(OperatorError::KubeError)?;
        warn!(account = %account.name_any(), "Reuse cleanup failed, account not returned to pool");
        return Err(err);
    }

    return_to_pool(&accounts, &account, claim).await
}

/// Sweep the consumer-visible remote resources: EBS snapshots, EBS volumes
/// and S3 buckets. Three concurrent sweepers; the first error cancels the
/// rest and is returned.
async fn sweep_account_resources(
    ctx: &Context,
    claim: &AccountClaim,
    account: &Account,
) -> Result<(), OperatorError> {
    if account.spec.iam_user_secret.is_empty() {
        return Err(OperatorError::InternalError(
            "account has no IAM user secret for cleanup".to_string(),
        ));
    }

    let mut regions: Vec<String> = claim
        .spec
        .aws_regions
        .iter()
        .map(|r| r.name.clone())
        .collect();
    if regions.is_empty() {
        regions.push(ctx.config.aws.default_region.clone());
    }

    tokio::try_join!(
        sweep_snapshots(ctx, account, &regions),
        sweep_volumes(ctx, account, &regions),
        sweep_buckets(ctx, account),
    )?;

    Ok(())
}

fn scope_for(ctx: &Context, account: &Account, region: &str) -> CredentialsScope {
    CredentialsScope::new(&account.spec.iam_user_secret, ctx.operator_namespace(), region)
}

async fn sweep_snapshots(
    ctx: &Context,
    account: &Account,
    regions: &[String],
) -> Result<(), OperatorError> {
    for region in regions {
        let scope = scope_for(ctx, account, region);
        for snapshot_id in ctx.aws.ec2.list_snapshot_ids(&scope).await? {
            ctx.aws.ec2.delete_snapshot(&scope, &snapshot_id).await?;
            info!(region = %region, snapshot = %snapshot_id, "Deleted snapshot during reuse cleanup");
        }
    }
    Ok(())
}

async fn sweep_volumes(
    ctx: &Context,
    account: &Account,
    regions: &[String],
) -> Result<(), OperatorError> {
    for region in regions {
        let scope = scope_for(ctx, account, region);
        for volume_id in ctx.aws.ec2.list_volume_ids(&scope).await? {
            ctx.aws.ec2.delete_volume(&scope, &volume_id).await?;
            info!(region = %region, volume = %volume_id, "Deleted volume during reuse cleanup");
        }
    }
    Ok(())
}

async fn sweep_buckets(ctx: &Context, account: &Account) -> Result<(), OperatorError> {
    let scope = scope_for(ctx, account, &ctx.config.aws.default_region);
    for bucket in ctx.aws.s3.list_buckets(&scope).await? {
        ctx.aws.s3.delete_bucket(&scope, &bucket).await?;
        info!(bucket = %bucket, "Deleted bucket during reuse cleanup");
    }
    Ok(())
}

/// Detach the claim without marking the account reused; used when cleanup is
/// skipped because nothing was provisioned yet.
async fn unlink_account(accounts: &Api<Account>, account: &Account) -> Result<(), OperatorError> {
    let mut updated = account.clone();
    updated.spec.claim_link.clear();
    updated.spec.claim_link_namespace.clear();
    accounts
        .replace(&account.name_any(), &PostParams::default(), &updated)
        .await
        .map_err(OperatorError::KubeError)?;

    let mut status = account.status.clone().unwrap_or_default();
    status.claimed = false;
    accounts
        .patch_status(
            &account.name_any(),
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "status": status })),
        )
        .await
        .map_err(OperatorError::KubeError)?;
    Ok(())
}

/// Spec first, then status: clear the claim link, then flip the account back
/// to Ready with `reused=true`.
async fn return_to_pool(
    accounts: &Api<Account>,
    account: &Account,
    claim: &AccountClaim,
) -> Result<(), OperatorError> {
    let mut updated = account.clone();
    updated.spec.claim_link.clear();
    updated.spec.claim_link_namespace.clear();
    // Legacy accounts predate legal-entity stamping; carry it over from the
    // claim so reuse affinity keeps working.
    if updated.spec.legal_entity.id.is_empty() {
        updated.spec.legal_entity = claim.spec.legal_entity.clone();
    }
    accounts
        .replace(&account.name_any(), &PostParams::default(), &updated)
        .await
        .map_err(OperatorError::KubeError)?;

    let now = Utc::now();
    let mut status = account.status.clone().unwrap_or_default();
    status.claimed = false;
    status.reused = true;
    status.state = Some(AccountState::Ready);
    set_condition(
        &mut status.conditions,
        ConditionType::AccountReused,
        ConditionStatus::True,
        "Reused",
        "Account cleaned up and returned to the pool",
        UpdateConditionPolicy::Always,
        now,
    );
    set_condition(
        &mut status.conditions,
        ConditionType::AccountUnclaimed,
        ConditionStatus::True,
        "Unclaimed",
        "Account is in the unclaimed pool",
        UpdateConditionPolicy::Always,
        now,
    );
    accounts
        .patch_status(
            &account.name_any(),
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "status": status })),
        )
        .await
        .map_err(OperatorError::KubeError)?;

    info!(account = %account.name_any(), "Account returned to the unclaimed pool as reused");
    Ok(())
}
