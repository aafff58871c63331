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


use chrono::{DateTime, Duration, Utc};
use kube::ResourceExt;
use rand::distributions::Alphanumeric;
use rand::Rng;
use std::collections::BTreeMap;
use tracing::{debug, info};

use super::Context;
use crate::errors::OperatorError;
use crate::models::Account;
use crate::services::aws::client_factory::CredentialsScope;
use crate::services::aws::iam::AccessKeyView;
use crate::services::kubernetes::secrets_service::{
    KEY_ACCESS_KEY_ID, KEY_SECRET_ACCESS_KEY, KEY_SESSION_TOKEN, KEY_USER_NAME,
};

/// Extra key on session secrets recording when the credentials were minted.
const KEY_MINTED_AT: &str = "aws_credentials_minted_at";

pub const ADMIN_USER: &str = "osdManagedAdmin";
pub const SRE_USER_PREFIX: &str = "osdManagedAdminSRE-";

const ADMIN_POLICIES: &[&str] = &["arn:aws:iam::aws:policy/AdministratorAccess"];
const SRE_POLICIES: &[&str] = &[
    "arn:aws:iam::aws:policy/AdministratorAccess",
    "arn:aws:iam::aws:policy/AWSSupportAccess",
];

pub fn rand_suffix(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

/// Secret carrying one IAM user's access key, named `<account>-<user>-secret`.
pub fn user_secret_name(account_name: &str, user_name: &str) -> String {
    format!("{}-{}-secret", account_name, user_name.to_lowercase())
}

fn session_secret_name(account_name: &str) -> String {
    format!("{}-session-secret", account_name)
}

fn access_key_secret_data(key: &AccessKeyView, user_name: &str) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert(KEY_ACCESS_KEY_ID.to_string(), key.access_key_id.clone());
    data.insert(
        KEY_SECRET_ACCESS_KEY.to_string(),
        key.secret_access_key.clone(),
    );
    data.insert(KEY_USER_NAME.to_string(), user_name.to_string());
    data
}

/// Obtain a credentials scope inside the managed account. BYOC accounts carry
/// customer credentials in `spec.iamUserSecret`; pooled accounts are entered
/// by assuming the organization access role from the payer account.
pub(crate) async fn account_scope(
    ctx: &Context,
    account: &Account,
) -> Result<CredentialsScope, OperatorError> {
    let namespace = ctx.operator_namespace();
    let region = &ctx.config.aws.default_region;

    if account.spec.byoc && !account.spec.iam_user_secret.is_empty() {
        return Ok(CredentialsScope::new(
            &account.spec.iam_user_secret,
            namespace,
            region,
        ));
    }

    if account.spec.aws_account_id.is_empty() {
        return Err(OperatorError::InternalError(
            "IAM bootstrap requires a provisioned AWS account id".to_string(),
        ));
    }

    let secret_name = session_secret_name(&account.name_any());
    let scope = CredentialsScope::new(&secret_name, namespace, region);

    // A previously minted session is reused until it is too old.
    if let Some(secret) = ctx.secrets.get_opt(&secret_name, namespace).await? {
        let minted_at = secret
            .data
            .unwrap_or_default()
            .get(KEY_MINTED_AT)
            .and_then(|v| String::from_utf8_lossy(&v.0).parse::<DateTime<Utc>>().ok());
        let ttl = Duration::minutes(ctx.config.aws.sts_credential_ttl_minutes);
        if let Some(minted_at) = minted_at {
            if Utc::now() - minted_at < ttl {
                return Ok(scope);
            }
        }
    }

    let payer_scope = CredentialsScope::new(
        &ctx.config.aws.operator_credentials_secret,
        namespace,
        region,
    );
    let role_arn = format!(
        "arn:aws:iam::{}:role/{}",
        account.spec.aws_account_id, ctx.config.aws.org_access_role
    );
    let session = ctx
        .aws
        .sts
        .assume_role(&payer_scope, &role_arn, &account.name_any(), None)
        .await?;

    let mut data = BTreeMap::new();
    data.insert(KEY_ACCESS_KEY_ID.to_string(), session.access_key_id);
    data.insert(KEY_SECRET_ACCESS_KEY.to_string(), session.secret_access_key);
    data.insert(KEY_SESSION_TOKEN.to_string(), session.session_token);
    data.insert(KEY_MINTED_AT.to_string(), Utc::now().to_rfc3339());
    ctx.secrets.write(&secret_name, namespace, data).await?;

    // Fresh session credentials replace whatever was cached for this scope.
    ctx.aws.invalidate_credentials(&scope);
    Ok(scope)
}

/// Ensure an IAM user exists with its managed policies attached. Returns a
/// fresh access key when the user was just created or rotation was requested;
/// pre-existing keys are deleted before a new one is minted.
async fn ensure_user(
    ctx: &Context,
    scope: &CredentialsScope,
    user_name: &str,
    policies: &[&str],
    rotate: bool,
) -> Result<Option<AccessKeyView>, OperatorError> {
    let created = ctx.aws.iam.create_user(scope, user_name).await?;
    if created {
        info!(user = %user_name, "Created IAM user");
        for policy in policies {
            ctx.aws.iam.attach_user_policy(scope, user_name, policy).await?;
        }
    }

    if created || rotate {
        ctx.aws.iam.delete_all_access_keys(scope, user_name).await?;
        let key = ctx.aws.iam.create_access_key(scope, user_name).await?;
        return Ok(Some(key));
    }

    debug!(user = %user_name, "IAM user present, no key rotation requested");
    Ok(None)
}

/// Provision the account's IAM users and their credential secrets. Returns
/// the name of the admin user secret recorded in `spec.iamUserSecret`.
///
/// Idempotent: re-running against a bootstrapped account performs no writes
/// unless rotation flags are set or a secret went missing.
pub async fn bootstrap(ctx: &Context, account: &Account) -> Result<String, OperatorError> {
    let namespace = ctx.operator_namespace();
    let account_name = account.name_any();
    let status = account.status.clone().unwrap_or_default();
    let scope = account_scope(ctx, account).await?;

    // Admin user: key rotation is forced when its secret is gone.
    let admin_secret = user_secret_name(&account_name, ADMIN_USER);
    let admin_secret_missing = ctx.secrets.get_opt(&admin_secret, namespace).await?.is_none();
    let rotate_admin = status.rotate_credentials || admin_secret_missing;

    if let Some(key) = ensure_user(ctx, &scope, ADMIN_USER, ADMIN_POLICIES, rotate_admin).await? {
        ctx.secrets
            .write(&admin_secret, namespace, access_key_secret_data(&key, ADMIN_USER))
            .await?;
    }

    // SRE user: the unique suffix survives restarts through the secret's
    // aws_user_name entry.
    let sre_secret = user_secret_name(&account_name, "osdManagedAdminSRE");
    let existing_sre_user = match ctx.secrets.get_opt(&sre_secret, namespace).await? {
        Some(secret) => secret
            .data
            .unwrap_or_default()
            .get(KEY_USER_NAME)
            .map(|v| String::from_utf8_lossy(&v.0).to_string()),
        None => None,
    };
    let sre_user = existing_sre_user
        .clone()
        .unwrap_or_else(|| format!("{}{}", SRE_USER_PREFIX, rand_suffix(6)));
    let rotate_sre = status.rotate_credentials || existing_sre_user.is_none();

    if let Some(key) = ensure_user(ctx, &scope, &sre_user, SRE_POLICIES, rotate_sre).await? {
        ctx.secrets
            .write(&sre_secret, namespace, access_key_secret_data(&key, &sre_user))
            .await?;
    }

    // Console access for the SRE user is rotated on request only.
    if status.rotate_console_credentials {
        let password = rand_suffix(20);
        ctx.aws.iam.delete_login_profile(&scope, &sre_user).await?;
        ctx.aws
            .iam
            .create_login_profile(&scope, &sre_user, &password, true)
            .await?;
        info!(user = %sre_user, "Rotated console login profile");
    }

    Ok(admin_secret)
}
