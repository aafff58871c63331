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


use futures::stream::{self, StreamExt};
use std::collections::BTreeMap;
use std::time::Duration;
use tokio::time::{sleep, timeout};
use tracing::{info, warn};

use super::Context;
use crate::errors::OperatorError;
use crate::services::aws::client_factory::CredentialsScope;
use crate::services::aws::ec2::{InstanceLifecycle, RunInstanceRequest};

const POLL_INTERVAL: Duration = Duration::from_secs(15);

/// Warm up every covered region by launching one small instance from the
/// region's AMI, waiting for it to run, then terminating it. Forces the
/// provider to enable the account in that region.
///
/// Fan-out is bounded by the configured worker count; the aggregate failure
/// names the first region that failed.
pub async fn initialize_regions(
    ctx: &Context,
    iam_user_secret: &str,
    region_amis: &BTreeMap<String, String>,
) -> Result<(), OperatorError> {
    if region_amis.is_empty() {
        warn!("Region AMI table is empty, nothing to warm up");
        return Ok(());
    }

    let deadline = Duration::from_secs(ctx.config.aws.warmup_deadline_seconds);
    let workers = ctx.config.aws.warmup_workers.max(1);

    let results: Vec<(String, Result<(), OperatorError>)> =
        stream::iter(region_amis.iter().map(|(region, ami)| {
            let region = region.clone();
            let ami = ami.clone();
            async move {
                let result = timeout(deadline, warm_up_region(ctx, iam_user_secret, &region, &ami))
                    .await
                    .unwrap_or_else(|_| {
                        Err(OperatorError::InternalError(format!(
                            "region {} warm-up timed out after {}s",
                            region,
                            deadline.as_secs()
                        )))
                    });
                (region, result)
            }
        }))
        .buffer_unordered(workers)
        .collect()
        .await;

    for (region, result) in results {
        if let Err(err) = result {
            return Err(OperatorError::InternalError(format!(
                "region {} initialization failed: {}",
                region, err
            )));
        }
    }

    Ok(())
}

async fn warm_up_region(
    ctx: &Context,
    iam_user_secret: &str,
    region: &str,
    ami_id: &str,
) -> Result<(), OperatorError> {
    let scope = CredentialsScope::new(iam_user_secret, ctx.operator_namespace(), region);

    let instance_id = ctx
        .aws
        .ec2
        .run_instance(
            &scope,
            &RunInstanceRequest {
                ami_id: ami_id.to_string(),
                instance_type: ctx.config.aws.warmup_instance_type.clone(),
                tags: vec![("purpose".to_string(), "region-warm-up".to_string())],
            },
        )
        .await?;
    info!(region = %region, instance = %instance_id, "Launched warm-up instance");

    loop {
        match ctx.aws.ec2.instance_lifecycle(&scope, &instance_id).await? {
            InstanceLifecycle::Running => break,
            InstanceLifecycle::Terminated => {
                return Err(OperatorError::InternalError(format!(
                    "warm-up instance {} terminated before reaching running",
                    instance_id
                )));
            }
            _ => sleep(POLL_INTERVAL).await,
        }
    }

    ctx.aws
        .ec2
        .terminate_instances(&scope, &[instance_id.clone()])
        .await?;
    info!(region = %region, instance = %instance_id, "Warm-up complete");

    Ok(())
}
