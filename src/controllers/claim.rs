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
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::runtime::controller::Action;
use kube::ResourceExt;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{reuse, Context};
use crate::errors::OperatorError;
use crate::metrics;
use crate::models::account_claim::{BYOC_SECRET_FINALIZER, CLAIM_FINALIZER};
use crate::models::condition::{
    find_condition, set_condition, ConditionStatus, ConditionType, UpdateConditionPolicy,
};
use crate::models::{
    Account, AccountClaim, AccountClaimStatus, AccountState, AccountStatus, ClaimState,
};
use crate::services::aws::client_factory::CredentialsScope;
use crate::services::aws::error::AwsErrorCode;
use crate::services::kubernetes::secrets_service::{KEY_ACCESS_KEY_ID, KEY_SECRET_ACCESS_KEY};
use crate::utils::retry::{retry_with_backoff, store_retry_config};

const REQUEUE_SHORT: Duration = Duration::from_secs(30);
const REQUEUE_STEADY: Duration = Duration::from_secs(600);

fn claims_api(ctx: &Context, namespace: &str) -> Api<AccountClaim> {
    Api::namespaced(ctx.client.clone(), namespace)
}

fn accounts_api(ctx: &Context) -> Api<Account> {
    Api::namespaced(ctx.client.clone(), ctx.operator_namespace())
}

async fn write_claim_status(
    api: &Api<AccountClaim>,
    name: &str,
    status: &AccountClaimStatus,
) -> Result<(), OperatorError> {
    api.patch_status(
        name,
        &PatchParams::default(),
        &Patch::Merge(serde_json::json!({ "status": status })),
    )
    .await
    .map_err(OperatorError::KubeError)?;
    Ok(())
}

/// Two-priority selection over the operator-namespace account list: a
/// recycled account of the same legal entity wins over a fresh pool account.
/// Accounts already carrying a claim link never qualify.
pub fn select_account<'a>(accounts: &'a [Account], legal_entity_id: &str) -> Option<&'a Account> {
    accounts
        .iter()
        .find(|a| a.spec.claim_link.is_empty() && a.is_reusable_for(legal_entity_id))
        .or_else(|| {
            accounts
                .iter()
                .find(|a| a.spec.claim_link.is_empty() && a.is_unclaimed())
        })
}

pub async fn reconcile(
    claim: Arc<AccountClaim>,
    ctx: Arc<Context>,
) -> Result<Action, OperatorError> {
    let namespace = claim.namespace().ok_or_else(|| {
        OperatorError::ValidationError("AccountClaim must be namespaced".to_string())
    })?;

    match reconcile_inner(&claim, &ctx, &namespace).await {
        Ok(action) => Ok(action),
        Err(err) => {
            // Unclassified failures are surfaced on the record rather than
            // silently absorbed into the requeue loop.
            if err.aws_code().is_none()
                && !err.is_conflict()
                && !matches!(
                    err,
                    OperatorError::NotFound(_) | OperatorError::ValidationError(_)
                )
            {
                let api = claims_api(&ctx, &namespace);
                let mut status = claim.status.clone().unwrap_or_default();
                set_condition(
                    &mut status.conditions,
                    ConditionType::UnhandledError,
                    ConditionStatus::True,
                    "UnhandledError",
                    &err.to_string(),
                    UpdateConditionPolicy::IfReasonOrMessageChange,
                    Utc::now(),
                );
                if let Err(write_err) =
                    write_claim_status(&api, &claim.name_any(), &status).await
                {
                    warn!("Failed to record unhandled error condition: {}", write_err);
                }
            }
            Err(err)
        }
    }
}

async fn reconcile_inner(
    claim: &AccountClaim,
    ctx: &Context,
    namespace: &str,
) -> Result<Action, OperatorError> {
    let api = claims_api(ctx, namespace);
    let name = claim.name_any();

    // Test fakes get a synthesized ready state and never touch the provider.
    if claim.is_fake() {
        return reconcile_fake(&api, &claim).await;
    }

    if claim.metadata.deletion_timestamp.is_some() {
        return handle_deletion(&ctx, &api, &claim).await;
    }

    if !claim.finalizers().iter().any(|f| f == CLAIM_FINALIZER) {
        let mut updated = (*claim).clone();
        updated
            .metadata
            .finalizers
            .get_or_insert_with(Vec::new)
            .push(CLAIM_FINALIZER.to_string());
        api.replace(&name, &PostParams::default(), &updated)
            .await
            .map_err(OperatorError::KubeError)?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    if claim.spec.byoc {
        return reconcile_byoc(&ctx, &api, &claim).await;
    }

    if let Err(err) = claim.spec.validate() {
        return invalidate_claim(&api, &claim, &err).await;
    }

    if claim.is_satisfied() {
        metrics::observe_reconcile("claim", "ok");
        return Ok(Action::requeue(REQUEUE_STEADY));
    }

    if claim.state().is_none() {
        let mut status = claim.status.clone().unwrap_or_default();
        status.state = Some(ClaimState::Pending);
        set_condition(
            &mut status.conditions,
            ConditionType::Unclaimed,
            ConditionStatus::True,
            "Pending",
            "Waiting for a ready account",
            UpdateConditionPolicy::Always,
            Utc::now(),
        );
        write_claim_status(&api, &name, &status).await?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    if claim.spec.account_link.is_empty() {
        // A lost binding race re-lists and re-selects before surfacing.
        let account_name = retry_with_backoff(&store_retry_config(), || {
            select_and_bind(ctx, claim)
        })
        .await?;
        let mut updated = (*claim).clone();
        updated.spec.account_link = account_name;
        api.replace(&name, &PostParams::default(), &updated)
            .await
            .map_err(OperatorError::KubeError)?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    let account = accounts_api(&ctx)
        .get(&claim.spec.account_link)
        .await
        .map_err(OperatorError::KubeError)?;

    if claim.spec.account_ou.is_empty() || claim.spec.account_ou == "ROOT" {
        let ou_id = place_in_ou(&ctx, &claim, &account).await?;
        let mut updated = (*claim).clone();
        updated.spec.account_ou = ou_id;
        api.replace(&name, &PostParams::default(), &updated)
            .await
            .map_err(OperatorError::KubeError)?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    apply_custom_tags(&ctx, &claim, &account).await?;
    mint_consumer_secret(&ctx, &claim, &account).await?;
    transition_ready(&api, &claim).await?;

    metrics::observe_reconcile("claim", "ok");
    Ok(Action::requeue(REQUEUE_STEADY))
}

/// Spec validation failed: park the claim in Error until the user mutates the
/// spec. No requeue.
async fn invalidate_claim(
    api: &Api<AccountClaim>,
    claim: &AccountClaim,
    err: &OperatorError,
) -> Result<Action, OperatorError> {
    let mut status = claim.status.clone().unwrap_or_default();
    status.state = Some(ClaimState::Error);
    set_condition(
        &mut status.conditions,
        ConditionType::InvalidAccountClaim,
        ConditionStatus::True,
        "InvalidAccountClaim",
        &err.to_string(),
        UpdateConditionPolicy::IfReasonOrMessageChange,
        Utc::now(),
    );
    write_claim_status(api, &claim.name_any(), &status).await?;
    warn!(claim = %claim.name_any(), "Claim rejected: {}", err);
    Ok(Action::await_change())
}

/// Pick a ready account and bind it. The spec write carrying the claim link
/// is the at-most-once fence: a conflicting writer loses and re-selects on
/// its next pass.
async fn select_and_bind(ctx: &Context, claim: &AccountClaim) -> Result<String, OperatorError> {
    let accounts = accounts_api(ctx);
    let list = accounts
        .list(&Default::default())
        .await
        .map_err(OperatorError::KubeError)?;

    let chosen = select_account(&list.items, &claim.spec.legal_entity.id).ok_or_else(|| {
        OperatorError::NotFound("no ready unclaimed account available".to_string())
    })?;
    let account_name = chosen.name_any();

    // Spec first: claim link plus legal-entity carry-over.
    let mut updated = chosen.clone();
    updated.spec.claim_link = claim.name_any();
    updated.spec.claim_link_namespace = claim.namespace().unwrap_or_default();
    updated.spec.legal_entity = claim.spec.legal_entity.clone();
    accounts
        .replace(&account_name, &PostParams::default(), &updated)
        .await
        .map_err(OperatorError::KubeError)?;

    // Status second: the claimed bit and its condition, with the unclaimed
    // duration observed off the prior condition entry.
    let now = Utc::now();
    let mut status = chosen.status.clone().unwrap_or_default();
    if let Some(unclaimed) = find_condition(&status.conditions, ConditionType::AccountUnclaimed) {
        let elapsed = (now - unclaimed.last_probe_time).num_seconds().max(0) as f64;
        metrics::observe_account_claimed(status.reused, elapsed);
    }
    status.claimed = true;
    set_condition(
        &mut status.conditions,
        ConditionType::AccountClaimed,
        ConditionStatus::True,
        "Claimed",
        &format!("Claimed by {}", claim.name_any()),
        UpdateConditionPolicy::Always,
        now,
    );
    if claim.spec.manual_sts_mode {
        set_condition(
            &mut status.conditions,
            ConditionType::AccountIsSts,
            ConditionStatus::True,
            "ManualSts",
            "Consumer accesses the account through an external STS role",
            UpdateConditionPolicy::Never,
            now,
        );
    }
    write_account_status(&accounts, &account_name, &status).await?;

    info!(claim = %claim.name_any(), account = %account_name, "Bound account to claim");
    Ok(account_name)
}

async fn write_account_status(
    accounts: &Api<Account>,
    name: &str,
    status: &AccountStatus,
) -> Result<(), OperatorError> {
    accounts
        .patch_status(
            name,
            &PatchParams::default(),
            &Patch::Merge(serde_json::json!({ "status": status })),
        )
        .await
        .map_err(OperatorError::KubeError)?;
    Ok(())
}

/// Create-or-find the legal-entity OU under the base OU and move the account
/// into it from the root.
async fn place_in_ou(
    ctx: &Context,
    claim: &AccountClaim,
    account: &Account,
) -> Result<String, OperatorError> {
    let view = ctx
        .configmaps
        .read_operator_config(
            &ctx.config.operator.configmap_name,
            ctx.operator_namespace(),
        )
        .await?;
    if view.base_ou.is_empty() || view.root_ou.is_empty() {
        return Err(OperatorError::ConfigError(
            "operator configmap is missing base/root OU ids".to_string(),
        ));
    }

    let scope = CredentialsScope::new(
        &ctx.config.aws.operator_credentials_secret,
        ctx.operator_namespace(),
        &ctx.config.aws.default_region,
    );

    let ou = ctx
        .aws
        .organizations
        .ensure_ou(&scope, &view.base_ou, &claim.spec.legal_entity.id)
        .await?;

    match ctx
        .aws
        .organizations
        .move_account(&scope, &account.spec.aws_account_id, &view.root_ou, &ou.id)
        .await
    {
        Ok(()) => {}
        Err(err) if err.aws_code() == Some(AwsErrorCode::AccountNotFoundInParent) => {
            // Not under the root anymore; idempotent success when it already
            // sits in the destination.
            let parents = ctx
                .aws
                .organizations
                .list_parents(&scope, &account.spec.aws_account_id)
                .await?;
            if !parents.iter().any(|p| p == &ou.id) {
                return Err(err);
            }
        }
        Err(err) => return Err(err),
    }

    info!(claim = %claim.name_any(), ou = %ou.id, "Account placed in legal-entity OU");
    Ok(ou.id)
}

async fn apply_custom_tags(
    ctx: &Context,
    claim: &AccountClaim,
    account: &Account,
) -> Result<(), OperatorError> {
    if claim.spec.custom_tags.is_empty() || account.spec.aws_account_id.is_empty() {
        return Ok(());
    }
    let scope = CredentialsScope::new(
        &ctx.config.aws.operator_credentials_secret,
        ctx.operator_namespace(),
        &ctx.config.aws.default_region,
    );
    let tags: Vec<(String, String)> = claim
        .spec
        .custom_tags
        .iter()
        .map(|t| (t.key.clone(), t.value.clone()))
        .collect();
    ctx.aws
        .organizations
        .tag_account(&scope, &account.spec.aws_account_id, &tags)
        .await
}

/// Copy the bound account's access key into the consumer-facing secret named
/// by the claim. Manual-STS claims mint nothing.
async fn mint_consumer_secret(
    ctx: &Context,
    claim: &AccountClaim,
    account: &Account,
) -> Result<(), OperatorError> {
    if claim.spec.manual_sts_mode {
        return Ok(());
    }

    let credentials = ctx
        .secrets
        .read_aws_credentials(&account.spec.iam_user_secret, ctx.operator_namespace())
        .await?;

    let mut data = BTreeMap::new();
    data.insert(KEY_ACCESS_KEY_ID.to_string(), credentials.access_key_id);
    data.insert(
        KEY_SECRET_ACCESS_KEY.to_string(),
        credentials.secret_access_key,
    );

    let target = &claim.spec.aws_credential_secret;
    let target_namespace = if target.namespace.is_empty() {
        claim.namespace().unwrap_or_default()
    } else {
        target.namespace.clone()
    };
    ctx.secrets.write(&target.name, &target_namespace, data).await
}

async fn transition_ready(
    api: &Api<AccountClaim>,
    claim: &AccountClaim,
) -> Result<(), OperatorError> {
    let mut status = claim.status.clone().unwrap_or_default();
    status.state = Some(ClaimState::Ready);
    set_condition(
        &mut status.conditions,
        ConditionType::Claimed,
        ConditionStatus::True,
        "Claimed",
        "Account claimed and credentials emitted",
        UpdateConditionPolicy::Always,
        Utc::now(),
    );
    write_claim_status(api, &claim.name_any(), &status).await?;
    info!(claim = %claim.name_any(), "Claim ready");
    Ok(())
}

/// BYOC pipeline: pin the customer secret with a finalizer, synthesize the
/// backing account, then wait for it to converge before minting.
async fn reconcile_byoc(
    ctx: &Context,
    api: &Api<AccountClaim>,
    claim: &AccountClaim,
) -> Result<Action, OperatorError> {
    if let Err(err) = claim.spec.validate() {
        return invalidate_claim(api, claim, &err).await;
    }

    let byoc_ref = &claim.spec.byoc_secret_ref;
    ctx.secrets
        .add_finalizer(&byoc_ref.name, &byoc_ref.namespace, BYOC_SECRET_FINALIZER)
        .await?;

    if claim.state().is_none() {
        let mut status = claim.status.clone().unwrap_or_default();
        status.state = Some(ClaimState::Pending);
        set_condition(
            &mut status.conditions,
            ConditionType::Unclaimed,
            ConditionStatus::True,
            "Pending",
            "Provisioning customer-supplied account",
            UpdateConditionPolicy::Always,
            Utc::now(),
        );
        write_claim_status(api, &claim.name_any(), &status).await?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    if claim.spec.account_link.is_empty() {
        let account_name = synthesize_byoc_account(ctx, claim).await?;
        let mut updated = claim.clone();
        updated.spec.account_link = account_name;
        api.replace(&claim.name_any(), &PostParams::default(), &updated)
            .await
            .map_err(OperatorError::KubeError)?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    let accounts = accounts_api(ctx);
    let account = accounts
        .get(&claim.spec.account_link)
        .await
        .map_err(OperatorError::KubeError)?;

    match account.state() {
        Some(AccountState::Failed) => {
            let mut status = claim.status.clone().unwrap_or_default();
            status.state = Some(ClaimState::Error);
            set_condition(
                &mut status.conditions,
                ConditionType::CcsAccountClaimFailed,
                ConditionStatus::True,
                "AccountFailed",
                "Customer-supplied account failed to provision",
                UpdateConditionPolicy::IfReasonOrMessageChange,
                Utc::now(),
            );
            write_claim_status(api, &claim.name_any(), &status).await?;
            Ok(Action::await_change())
        }
        Some(AccountState::Ready) => {
            if !account.is_claimed() {
                let mut status = account.status.clone().unwrap_or_default();
                status.claimed = true;
                set_condition(
                    &mut status.conditions,
                    ConditionType::AccountClaimed,
                    ConditionStatus::True,
                    "Claimed",
                    &format!("Claimed by {}", claim.name_any()),
                    UpdateConditionPolicy::Always,
                    Utc::now(),
                );
                write_account_status(&accounts, &account.name_any(), &status).await?;
            }
            mint_consumer_secret(ctx, claim, &account).await?;
            transition_ready(api, claim).await?;
            metrics::observe_reconcile("claim", "ok");
            Ok(Action::requeue(REQUEUE_STEADY))
        }
        _ => Ok(Action::requeue(REQUEUE_SHORT)),
    }
}

/// Create the Account record backing a BYOC claim and stage the customer
/// credentials where the account controller can reach them.
async fn synthesize_byoc_account(
    ctx: &Context,
    claim: &AccountClaim,
) -> Result<String, OperatorError> {
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    let account_name = format!("{}-byoc", claim.name_any());
    let namespace = ctx.operator_namespace();

    // Copy the customer secret into the operator namespace so the gateway's
    // (secret, namespace, region) scoping applies unchanged.
    let byoc_ref = &claim.spec.byoc_secret_ref;
    let source = ctx.secrets.get(&byoc_ref.name, &byoc_ref.namespace).await?;
    let staged_secret = format!("{}-credentials", account_name);
    let data: BTreeMap<String, String> = source
        .data
        .unwrap_or_default()
        .into_iter()
        .map(|(k, v)| (k, String::from_utf8_lossy(&v.0).to_string()))
        .collect();
    ctx.secrets.write(&staged_secret, namespace, data).await?;

    let account = Account {
        metadata: ObjectMeta {
            name: Some(account_name.clone()),
            namespace: Some(namespace.to_string()),
            ..ObjectMeta::default()
        },
        spec: crate::models::AccountSpec {
            aws_account_id: claim.spec.byoc_aws_account_id.clone(),
            iam_user_secret: staged_secret,
            byoc: true,
            claim_link: claim.name_any(),
            claim_link_namespace: claim.namespace().unwrap_or_default(),
            legal_entity: claim.spec.legal_entity.clone(),
            manual_sts_mode: claim.spec.manual_sts_mode,
        },
        status: None,
    };

    let accounts = accounts_api(ctx);
    match accounts.create(&PostParams::default(), &account).await {
        Ok(_) => {}
        Err(kube::Error::Api(e)) if e.code == 409 => {}
        Err(e) => return Err(OperatorError::KubeError(e)),
    }

    info!(claim = %claim.name_any(), account = %account_name, "Synthesized BYOC account record");
    Ok(account_name)
}

/// Test-fake claims reach Ready without provider calls or account binding.
async fn reconcile_fake(
    api: &Api<AccountClaim>,
    claim: &AccountClaim,
) -> Result<Action, OperatorError> {
    if claim.metadata.deletion_timestamp.is_some() {
        if claim.finalizers().iter().any(|f| f == CLAIM_FINALIZER) {
            let mut updated = claim.clone();
            if let Some(finalizers) = updated.metadata.finalizers.as_mut() {
                finalizers.retain(|f| f != CLAIM_FINALIZER);
            }
            api.replace(&claim.name_any(), &PostParams::default(), &updated)
                .await
                .map_err(OperatorError::KubeError)?;
        }
        return Ok(Action::await_change());
    }

    if claim.state() != Some(ClaimState::Ready) {
        transition_ready(api, claim).await?;
    }
    Ok(Action::requeue(REQUEUE_STEADY))
}

/// Deletion path: run the release pipeline, then strip the finalizers. A
/// cleanup failure keeps the claim finalizer in place.
async fn handle_deletion(
    ctx: &Context,
    api: &Api<AccountClaim>,
    claim: &AccountClaim,
) -> Result<Action, OperatorError> {
    if !claim.finalizers().iter().any(|f| f == CLAIM_FINALIZER) {
        return Ok(Action::await_change());
    }

    reuse::release_account(ctx, claim).await?;

    if claim.spec.byoc {
        let byoc_ref = &claim.spec.byoc_secret_ref;
        ctx.secrets
            .remove_finalizer(&byoc_ref.name, &byoc_ref.namespace, BYOC_SECRET_FINALIZER)
            .await?;
    }

    let mut updated = claim.clone();
    if let Some(finalizers) = updated.metadata.finalizers.as_mut() {
        finalizers.retain(|f| f != CLAIM_FINALIZER);
    }
    api.replace(&claim.name_any(), &PostParams::default(), &updated)
        .await
        .map_err(OperatorError::KubeError)?;

    info!(claim = %claim.name_any(), "Claim released and finalizer removed");
    Ok(Action::await_change())
}
