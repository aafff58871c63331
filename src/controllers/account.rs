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
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use super::{account_iam, region_init, Context};
use crate::errors::OperatorError;
use crate::metrics;
use crate::models::account::ACCOUNT_FINALIZER;
use crate::models::condition::{
    find_condition, set_condition, ConditionStatus, ConditionType, UpdateConditionPolicy,
};
use crate::models::{Account, AccountState, AccountStatus};
use crate::services::aws::client_factory::CredentialsScope;
use crate::services::aws::error::AwsErrorCode;
use crate::services::aws::organizations::CreationStatus;
use crate::services::aws::support::CreateCaseRequest;

const REQUEUE_SHORT: Duration = Duration::from_secs(30);
const REQUEUE_CASE_POLL: Duration = Duration::from_secs(600);
const REQUEUE_STEADY: Duration = Duration::from_secs(600);

const CASE_SUBJECT: &str = "Account limit increase";
const CASE_BODY: &str =
    "Please raise the service quota baseline for this account to support cluster provisioning.";
const CASE_SEVERITY: &str = "high";
const CASE_CATEGORY: &str = "other-account-issues";
const CASE_SERVICE: &str = "customer-account";
const CASE_ISSUE_TYPE: &str = "customer-service";

fn accounts_api(ctx: &Context, namespace: &str) -> Api<Account> {
    Api::namespaced(ctx.client.clone(), namespace)
}

async fn write_status(
    api: &Api<Account>,
    name: &str,
    status: &AccountStatus,
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

async fn add_finalizer(api: &Api<Account>, account: &Account) -> Result<(), OperatorError> {
    let mut updated = (*account).clone();
    updated
        .metadata
        .finalizers
        .get_or_insert_with(Vec::new)
        .push(ACCOUNT_FINALIZER.to_string());
    api.replace(&account.name_any(), &PostParams::default(), &updated)
        .await
        .map_err(OperatorError::KubeError)?;
    Ok(())
}

async fn remove_finalizer(api: &Api<Account>, account: &Account) -> Result<(), OperatorError> {
    let mut updated = (*account).clone();
    if let Some(finalizers) = updated.metadata.finalizers.as_mut() {
        finalizers.retain(|f| f != ACCOUNT_FINALIZER);
    }
    api.replace(&account.name_any(), &PostParams::default(), &updated)
        .await
        .map_err(OperatorError::KubeError)?;
    Ok(())
}

/// Scopes whose cached credentials become suspect after an authentication
/// failure against this account.
fn credential_scopes(ctx: &Context, account: &Account) -> Vec<CredentialsScope> {
    let namespace = ctx.operator_namespace();
    let region = &ctx.config.aws.default_region;
    let mut scopes = vec![CredentialsScope::new(
        &ctx.config.aws.operator_credentials_secret,
        namespace,
        region,
    )];
    if !account.spec.iam_user_secret.is_empty() {
        scopes.push(CredentialsScope::new(
            &account.spec.iam_user_secret,
            namespace,
            region,
        ));
    }
    scopes
}

/// Park the account in the sticky Failed state with a distinguishing
/// condition.
async fn fail_account(
    api: &Api<Account>,
    account: &Account,
    condition: ConditionType,
    reason: &str,
    message: &str,
) -> Result<Action, OperatorError> {
    let mut status = account.status.clone().unwrap_or_default();
    status.state = Some(AccountState::Failed);
    set_condition(
        &mut status.conditions,
        condition,
        ConditionStatus::True,
        reason,
        message,
        UpdateConditionPolicy::Always,
        Utc::now(),
    );
    set_condition(
        &mut status.conditions,
        ConditionType::AccountFailed,
        ConditionStatus::True,
        reason,
        message,
        UpdateConditionPolicy::IfReasonOrMessageChange,
        Utc::now(),
    );
    write_status(api, &account.name_any(), &status).await?;
    warn!(account = %account.name_any(), reason = %reason, "Account transitioned to Failed");
    Ok(Action::await_change())
}

pub async fn reconcile(account: Arc<Account>, ctx: Arc<Context>) -> Result<Action, OperatorError> {
    let namespace = account
        .namespace()
        .unwrap_or_else(|| ctx.operator_namespace().to_string());
    let api = accounts_api(&ctx, &namespace);

    if account.metadata.deletion_timestamp.is_some() {
        return handle_deletion(&ctx, &api, &account).await;
    }

    if !account
        .finalizers()
        .iter()
        .any(|f| f == ACCOUNT_FINALIZER)
    {
        add_finalizer(&api, &account).await?;
        return Ok(Action::requeue(Duration::from_secs(1)));
    }

    let result = match account.state() {
        None => {
            if account.spec.byoc {
                bootstrap_byoc(&ctx, &api, &account).await
            } else {
                drive_creation(&ctx, &api, &account).await
            }
        }
        Some(AccountState::Pending) => bootstrap_byoc(&ctx, &api, &account).await,
        Some(AccountState::Creating) => drive_creation(&ctx, &api, &account).await,
        Some(AccountState::PendingVerification) => drive_support_case(&ctx, &api, &account).await,
        Some(AccountState::InitializingRegions) => drive_region_init(&ctx, &api, &account).await,
        Some(AccountState::Ready) => reconcile_ready(&ctx, &api, &account).await,
        // Failed is sticky until operator intervention.
        Some(AccountState::Failed) => Ok(Action::await_change()),
    };

    match result {
        Ok(action) => {
            metrics::observe_reconcile("account", "ok");
            Ok(action)
        }
        Err(err) => match err.aws_code() {
            Some(AwsErrorCode::AuthorizationError) => {
                fail_account(
                    &api,
                    &account,
                    ConditionType::AuthorizationError,
                    "AuthorizationError",
                    &err.to_string(),
                )
                .await
            }
            Some(AwsErrorCode::AuthenticationError) => {
                for scope in credential_scopes(&ctx, &account) {
                    ctx.aws.invalidate_credentials(&scope);
                }
                fail_account(
                    &api,
                    &account,
                    ConditionType::AuthenticationError,
                    "AuthenticationError",
                    &err.to_string(),
                )
                .await
            }
            _ => Err(err),
        },
    }
}

/// First phase for a pooled account: issue the Organizations creation request
/// exactly once, then poll it to completion.
async fn drive_creation(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<Action, OperatorError> {
    let mut status = account.status.clone().unwrap_or_default();

    if status.creation_request_id.is_empty() {
        let Some(request_id) = issue_creation_request(ctx, api, account).await? else {
            // Permanent failure already recorded on status.
            return Ok(Action::await_change());
        };
        status.state = Some(AccountState::Creating);
        status.creation_request_id = request_id;
        set_condition(
            &mut status.conditions,
            ConditionType::AccountCreating,
            ConditionStatus::True,
            "Creating",
            "Account creation requested in the organization",
            UpdateConditionPolicy::Always,
            Utc::now(),
        );
        write_status(api, &account.name_any(), &status).await?;
        return Ok(Action::requeue(REQUEUE_SHORT));
    }

    let payer_scope = payer_scope(ctx);
    let view = ctx
        .aws
        .organizations
        .describe_create_account_status(&payer_scope, &status.creation_request_id)
        .await?;

    match view.status {
        CreationStatus::InProgress => Ok(Action::requeue(REQUEUE_SHORT)),
        CreationStatus::Succeeded => {
            let aws_account_id = view.aws_account_id.ok_or_else(|| {
                OperatorError::InternalError(
                    "creation succeeded without an account id".to_string(),
                )
            })?;
            let mut updated = account.clone();
            updated.spec.aws_account_id = aws_account_id.clone();
            api.replace(&account.name_any(), &PostParams::default(), &updated)
                .await
                .map_err(OperatorError::KubeError)?;

            apply_managed_tags(ctx, &aws_account_id).await?;

            status.state = Some(AccountState::PendingVerification);
            set_condition(
                &mut status.conditions,
                ConditionType::AccountPendingVerification,
                ConditionStatus::True,
                "PendingVerification",
                "Awaiting support-case resolution",
                UpdateConditionPolicy::Always,
                Utc::now(),
            );
            write_status(api, &account.name_any(), &status).await?;
            info!(account = %account.name_any(), aws_account_id = %aws_account_id, "Account created");
            Ok(Action::requeue(Duration::from_secs(1)))
        }
        CreationStatus::Failed => {
            let reason = view.failure_reason.unwrap_or_default();
            match AwsErrorCode::from_create_account_failure(&reason) {
                AwsErrorCode::EmailAlreadyExists => {
                    // A fresh suffix is derived on the next pass.
                    status.creation_request_id.clear();
                    write_status(api, &account.name_any(), &status).await?;
                    Ok(Action::requeue(Duration::from_secs(1)))
                }
                AwsErrorCode::AccountLimitExceeded => {
                    verify_account_ceiling(ctx).await;
                    fail_account(
                        api,
                        account,
                        ConditionType::AccountCreationFailed,
                        "AccountLimitExceeded",
                        "Organization account limit reached",
                    )
                    .await
                }
                _ => {
                    fail_account(
                        api,
                        account,
                        ConditionType::AccountCreationFailed,
                        "CreationFailed",
                        &format!("Account creation failed: {}", reason),
                    )
                    .await
                }
            }
        }
    }
}

fn payer_scope(ctx: &Context) -> CredentialsScope {
    CredentialsScope::new(
        &ctx.config.aws.operator_credentials_secret,
        ctx.operator_namespace(),
        &ctx.config.aws.default_region,
    )
}

/// Issue the creation call with a freshly derived e-mail. Returns `None`
/// after recording a permanent limit failure.
async fn issue_creation_request(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<Option<String>, OperatorError> {
    let scope = payer_scope(ctx);
    let account_name = format!(
        "{}-{}",
        ctx.config.aws.account_email_prefix,
        account_iam::rand_suffix(6)
    );
    let email = format!("{}@{}", account_name, ctx.config.aws.account_email_domain);

    match ctx
        .aws
        .organizations
        .create_account(&scope, &email, &account_name, &[])
        .await
    {
        Ok(request_id) => Ok(Some(request_id)),
        Err(err) if err.aws_code() == Some(AwsErrorCode::AccountLimitExceeded) => {
            verify_account_ceiling(ctx).await;
            fail_account(
                api,
                account,
                ConditionType::AccountCreationFailed,
                "AccountLimitExceeded",
                "Organization account limit reached",
            )
            .await?;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Cross-check the provider's limit error against the configured ceiling; a
/// mismatch points at configuration drift worth logging.
async fn verify_account_ceiling(ctx: &Context) {
    let namespace = ctx.operator_namespace();
    let view = match ctx
        .configmaps
        .read_operator_config(&ctx.config.operator.configmap_name, namespace)
        .await
    {
        Ok(v) => v,
        Err(_) => return,
    };
    let Some(limit) = view.account_limit else {
        return;
    };
    let api: Api<Account> = Api::namespaced(ctx.client.clone(), namespace);
    if let Ok(accounts) = api.list(&Default::default()).await {
        let total = accounts.items.len() as u32;
        if total < limit {
            warn!(
                total,
                limit, "Provider reported account limit before the configured ceiling was reached"
            );
        }
    }
}

async fn apply_managed_tags(ctx: &Context, aws_account_id: &str) -> Result<(), OperatorError> {
    let namespace = ctx.operator_namespace();
    let view = ctx
        .configmaps
        .read_operator_config(&ctx.config.operator.configmap_name, namespace)
        .await?;

    let mut tags = view.managed_tags.clone();
    if !view.shard_name.is_empty() {
        tags.push(("owner".to_string(), view.shard_name.clone()));
    }

    ctx.aws
        .organizations
        .tag_account(&payer_scope(ctx), aws_account_id, &tags)
        .await
}

/// Raise the baseline quota through a support case, opened at most once per
/// account and keyed by the recorded case id.
async fn drive_support_case(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<Action, OperatorError> {
    let mut status = account.status.clone().unwrap_or_default();
    let scope = account_iam::account_scope(ctx, account).await?;

    if status.support_case_id.is_empty() {
        let case_id = ctx
            .aws
            .support
            .create_case(
                &scope,
                &CreateCaseRequest {
                    subject: CASE_SUBJECT.to_string(),
                    communication_body: CASE_BODY.to_string(),
                    severity_code: CASE_SEVERITY.to_string(),
                    category_code: CASE_CATEGORY.to_string(),
                    service_code: CASE_SERVICE.to_string(),
                    issue_type: CASE_ISSUE_TYPE.to_string(),
                },
            )
            .await?;

        status.support_case_id = case_id.clone();
        set_condition(
            &mut status.conditions,
            ConditionType::QuotaIncreaseRequested,
            ConditionStatus::True,
            "CaseOpened",
            &format!("Support case {} opened", case_id),
            UpdateConditionPolicy::Always,
            Utc::now(),
        );
        write_status(api, &account.name_any(), &status).await?;
        info!(account = %account.name_any(), case = %case_id, "Opened quota support case");
        return Ok(Action::requeue(REQUEUE_CASE_POLL));
    }

    let case = ctx
        .aws
        .support
        .describe_case(&scope, &status.support_case_id)
        .await?;
    if case.status != "resolved" {
        return Ok(Action::requeue(REQUEUE_CASE_POLL));
    }

    status.state = Some(AccountState::InitializingRegions);
    set_condition(
        &mut status.conditions,
        ConditionType::AccountInitializingRegions,
        ConditionStatus::True,
        "InitializingRegions",
        "Support case resolved, warming up regions",
        UpdateConditionPolicy::Always,
        Utc::now(),
    );
    write_status(api, &account.name_any(), &status).await?;
    Ok(Action::requeue(Duration::from_secs(1)))
}

/// IAM bootstrap followed by the parallel region warm-up, then Ready.
async fn drive_region_init(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<Action, OperatorError> {
    let iam_user_secret = ensure_iam_bootstrap(ctx, api, account).await?;

    let region_amis = ctx
        .configmaps
        .read_region_ami_map(
            &ctx.config.operator.region_ami_configmap_name,
            ctx.operator_namespace(),
        )
        .await?;
    region_init::initialize_regions(ctx, &iam_user_secret, &region_amis).await?;

    transition_ready(api, account).await?;
    Ok(Action::requeue(REQUEUE_STEADY))
}

/// Run the IAM bootstrap and record the admin secret on the spec if it is not
/// already there.
async fn ensure_iam_bootstrap(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<String, OperatorError> {
    let secret_name = account_iam::bootstrap(ctx, account).await?;
    if account.spec.iam_user_secret != secret_name {
        let mut updated = account.clone();
        updated.spec.iam_user_secret = secret_name.clone();
        api.replace(&account.name_any(), &PostParams::default(), &updated)
            .await
            .map_err(OperatorError::KubeError)?;
    }
    Ok(secret_name)
}

async fn transition_ready(api: &Api<Account>, account: &Account) -> Result<(), OperatorError> {
    let now = Utc::now();
    let mut status = account.status.clone().unwrap_or_default();

    // Readiness duration is measured from the creation probe.
    if let Some(creating) = find_condition(&status.conditions, ConditionType::AccountCreating) {
        let elapsed = (now - creating.last_probe_time).num_seconds().max(0) as f64;
        metrics::observe_account_ready(account.spec.byoc, elapsed);
    }

    status.state = Some(AccountState::Ready);
    status.rotate_credentials = false;
    status.rotate_console_credentials = false;
    set_condition(
        &mut status.conditions,
        ConditionType::AccountReady,
        ConditionStatus::True,
        "Ready",
        "Account is ready for claims",
        UpdateConditionPolicy::Always,
        now,
    );
    set_condition(
        &mut status.conditions,
        ConditionType::AccountUnclaimed,
        ConditionStatus::True,
        "Unclaimed",
        "Account is in the unclaimed pool",
        UpdateConditionPolicy::Never,
        now,
    );
    write_status(api, &account.name_any(), &status).await?;
    info!(account = %account.name_any(), "Account ready");
    Ok(())
}

/// BYOC accounts skip creation and verification entirely; once the customer
/// credentials are linked the IAM bootstrap runs directly.
async fn bootstrap_byoc(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<Action, OperatorError> {
    if account.spec.iam_user_secret.is_empty() {
        // Claim controller has not copied the customer credentials yet.
        if account.state() != Some(AccountState::Pending) {
            let mut status = account.status.clone().unwrap_or_default();
            status.state = Some(AccountState::Pending);
            write_status(api, &account.name_any(), &status).await?;
        }
        return Ok(Action::requeue(REQUEUE_SHORT));
    }

    let secret_name = account_iam::bootstrap(ctx, account).await?;
    let mut updated = account.clone();
    updated.spec.iam_user_secret = secret_name;
    api.replace(&account.name_any(), &PostParams::default(), &updated)
        .await
        .map_err(OperatorError::KubeError)?;

    transition_ready(api, account).await?;
    Ok(Action::requeue(REQUEUE_STEADY))
}

/// Steady state: act on rotation requests, otherwise leave the record alone.
async fn reconcile_ready(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<Action, OperatorError> {
    let status = account.status.clone().unwrap_or_default();

    if status.rotate_credentials || status.rotate_console_credentials {
        account_iam::bootstrap(ctx, account).await?;
        let mut updated_status = status;
        updated_status.rotate_credentials = false;
        updated_status.rotate_console_credentials = false;
        write_status(api, &account.name_any(), &updated_status).await?;
        info!(account = %account.name_any(), "Credential rotation complete");
    }

    Ok(Action::requeue(REQUEUE_STEADY))
}

/// Finalizer-gated deletion. BYOC accounts need no remote teardown; pooled
/// accounts may only leave once they are not bound to a claim.
async fn handle_deletion(
    ctx: &Context,
    api: &Api<Account>,
    account: &Account,
) -> Result<Action, OperatorError> {
    if !account
        .finalizers()
        .iter()
        .any(|f| f == ACCOUNT_FINALIZER)
    {
        return Ok(Action::await_change());
    }

    if !account.spec.byoc && account.is_claimed() {
        // Remote cleanup runs on claim release; deletion waits for it.
        return Ok(Action::requeue(REQUEUE_SHORT));
    }

    let namespace = ctx.operator_namespace();
    let name = account.name_any();
    for secret in [
        account_iam::user_secret_name(&name, account_iam::ADMIN_USER),
        account_iam::user_secret_name(&name, "osdManagedAdminSRE"),
        format!("{}-session-secret", name),
    ] {
        ctx.secrets.delete(&secret, namespace).await?;
    }

    remove_finalizer(api, account).await?;
    info!(account = %name, "Account finalizer removed");
    Ok(Action::await_change())
}
