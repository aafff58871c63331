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


pub mod account;
pub mod account_iam;
pub mod claim;
pub mod pool;
pub mod region_init;
pub mod reuse;

use futures::StreamExt;
use kube::api::Api;
use kube::runtime::controller::{Action, Config as ControllerConfig};
use kube::runtime::{watcher, Controller};
use kube::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::errors::OperatorError;
use crate::models::{Account, AccountClaim, AccountPool};
use crate::services::aws::error::AwsErrorCode;
use crate::services::kubernetes::{ConfigMapsService, SecretsService};
use crate::services::AwsGateway;

/// Context injected into every reconcile invocation.
pub struct Context {
    pub client: Client,
    pub config: Config,
    pub secrets: Arc<SecretsService>,
    pub configmaps: Arc<ConfigMapsService>,
    pub aws: Arc<AwsGateway>,
}

impl Context {
    pub fn new(client: Client, config: Config) -> Self {
        let secrets = Arc::new(SecretsService::new(client.clone()));
        let configmaps = Arc::new(ConfigMapsService::new(client.clone()));
        let aws = Arc::new(AwsGateway::new(secrets.clone()));
        Self {
            client,
            config,
            secrets,
            configmaps,
            aws,
        }
    }

    pub fn operator_namespace(&self) -> &str {
        &self.config.operator.namespace
    }
}

/// Requeue policy by error category. Transient categories come back quickly,
/// quota categories wait out the provider, conflicts retry immediately.
pub fn requeue_after(error: &OperatorError) -> Duration {
    if error.is_conflict() {
        return Duration::from_secs(1);
    }
    // Pool-fed claims wait for an account to become ready.
    if matches!(error, OperatorError::NotFound(_)) {
        return Duration::from_secs(30);
    }
    match error.aws_code() {
        Some(AwsErrorCode::ConcurrentModification) => Duration::from_secs(1),
        Some(AwsErrorCode::TooManyRequests) | Some(AwsErrorCode::InternalFailure) => {
            Duration::from_secs(30)
        }
        Some(AwsErrorCode::AccountLimitExceeded)
        | Some(AwsErrorCode::SupportCaseLimitExceeded) => Duration::from_secs(300),
        _ => Duration::from_secs(300),
    }
}

fn error_policy_account(_obj: Arc<Account>, error: &OperatorError, _ctx: Arc<Context>) -> Action {
    warn!("account reconcile failed: {}", error);
    crate::metrics::observe_reconcile("account", "error");
    Action::requeue(requeue_after(error))
}

fn error_policy_claim(_obj: Arc<AccountClaim>, error: &OperatorError, _ctx: Arc<Context>) -> Action {
    warn!("claim reconcile failed: {}", error);
    crate::metrics::observe_reconcile("claim", "error");
    Action::requeue(requeue_after(error))
}

fn error_policy_pool(_obj: Arc<AccountPool>, error: &OperatorError, _ctx: Arc<Context>) -> Action {
    warn!("pool reconcile failed: {}", error);
    crate::metrics::observe_reconcile("pool", "error");
    Action::requeue(requeue_after(error))
}

/// Start the three control loops and block until shutdown. Per-controller
/// worker counts come from the operator configmap, resolved once at wiring
/// time.
pub async fn run(client: Client, config: Config) -> Result<(), OperatorError> {
    let ctx = Arc::new(Context::new(client.clone(), config));
    let namespace = ctx.operator_namespace().to_string();

    let operator_config = ctx
        .configmaps
        .read_operator_config(&ctx.config.operator.configmap_name, &namespace)
        .await
        .unwrap_or_else(|e| {
            warn!("Operator configmap unavailable at startup, using defaults: {}", e);
            Default::default()
        });

    let accounts: Api<Account> = Api::namespaced(client.clone(), &namespace);
    let claims: Api<AccountClaim> = Api::all(client.clone());
    let pools: Api<AccountPool> = Api::namespaced(client.clone(), &namespace);

    info!(
        namespace = %namespace,
        "Starting account, claim and pool controllers"
    );

    let account_controller = Controller::new(accounts.clone(), watcher::Config::default())
        .with_config(
            ControllerConfig::default()
                .concurrency(operator_config.max_concurrent_reconciles("account") as u16),
        )
        .shutdown_on_signal()
        .run(account::reconcile, error_policy_account, ctx.clone())
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => info!("Reconciled account {:?}", object.name),
                Err(e) => error!("Account reconcile error: {:?}", e),
            }
        });

    let claim_controller = Controller::new(claims, watcher::Config::default())
        .with_config(
            ControllerConfig::default()
                .concurrency(operator_config.max_concurrent_reconciles("accountclaim") as u16),
        )
        .shutdown_on_signal()
        .run(claim::reconcile, error_policy_claim, ctx.clone())
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => info!("Reconciled claim {:?}", object.name),
                Err(e) => error!("Claim reconcile error: {:?}", e),
            }
        });

    let pool_controller = Controller::new(pools, watcher::Config::default())
        .owns(accounts, watcher::Config::default())
        .with_config(
            ControllerConfig::default()
                .concurrency(operator_config.max_concurrent_reconciles("accountpool") as u16),
        )
        .shutdown_on_signal()
        .run(pool::reconcile, error_policy_pool, ctx)
        .for_each(|result| async move {
            match result {
                Ok((object, _)) => info!("Reconciled pool {:?}", object.name),
                Err(e) => error!("Pool reconcile error: {:?}", e),
            }
        });

    tokio::join!(account_controller, claim_controller, pool_controller);

    Ok(())
}
