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


use aws_sdk_ec2::types::{InstanceStateName, InstanceType, ResourceType, Tag, TagSpecification};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::client_factory::{AwsClientFactory, CredentialsScope};
use super::error::map_aws_err;
use crate::errors::OperatorError;

// EC2-specific types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInstanceRequest {
    pub ami_id: String,
    pub instance_type: String,
    pub tags: Vec<(String, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstanceLifecycle {
    Pending,
    Running,
    Terminated,
    Other,
}

// Facade over the EC2 API
pub struct Ec2Service {
    factory: Arc<dyn AwsClientFactory>,
}

impl Ec2Service {
    pub fn new(factory: Arc<dyn AwsClientFactory>) -> Self {
        Self { factory }
    }

    /// Launch a single instance; returns its id.
    pub async fn run_instance(
        &self,
        scope: &CredentialsScope,
        request: &RunInstanceRequest,
    ) -> Result<String, OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        let mut tag_spec = TagSpecification::builder().resource_type(ResourceType::Instance);
        for (key, value) in &request.tags {
            tag_spec = tag_spec.tags(Tag::builder().key(key).value(value).build());
        }

        let response = client
            .run_instances()
            .image_id(&request.ami_id)
            .instance_type(InstanceType::from(request.instance_type.as_str()))
            .min_count(1)
            .max_count(1)
            .tag_specifications(tag_spec.build())
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to run instance", e))?;

        response
            .instances()
            .first()
            .and_then(|i| i.instance_id())
            .map(|id| id.to_string())
            .ok_or_else(|| {
                OperatorError::InternalError("RunInstances response missing instance".to_string())
            })
    }

    pub async fn instance_lifecycle(
        &self,
        scope: &CredentialsScope,
        instance_id: &str,
    ) -> Result<InstanceLifecycle, OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        let response = client
            .describe_instances()
            .instance_ids(instance_id)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to describe instances", e))?;

        for reservation in response.reservations() {
            for instance in reservation.instances() {
                if instance.instance_id() == Some(instance_id) {
                    let state = match instance.state().and_then(|s| s.name()) {
                        Some(InstanceStateName::Running) => InstanceLifecycle::Running,
                        Some(InstanceStateName::Pending) => InstanceLifecycle::Pending,
                        Some(InstanceStateName::Terminated) => InstanceLifecycle::Terminated,
                        _ => InstanceLifecycle::Other,
                    };
                    return Ok(state);
                }
            }
        }

        Err(OperatorError::NotFound(format!(
            "instance {} not found",
            instance_id
        )))
    }

    pub async fn terminate_instances(
        &self,
        scope: &CredentialsScope,
        instance_ids: &[String],
    ) -> Result<(), OperatorError> {
        if instance_ids.is_empty() {
            return Ok(());
        }
        let client = self.factory.create_ec2_client(scope).await?;

        client
            .terminate_instances()
            .set_instance_ids(Some(instance_ids.to_vec()))
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to terminate instances", e))?;

        Ok(())
    }

    /// Ids of every volume visible in the scope region, following pagination.
    pub async fn list_volume_ids(
        &self,
        scope: &CredentialsScope,
    ) -> Result<Vec<String>, OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        let mut volumes = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = client.describe_volumes();
            if let Some(token) = next_token.as_ref() {
                request = request.next_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to describe volumes", e))?;

            for volume in response.volumes() {
                if let Some(id) = volume.volume_id() {
                    volumes.push(id.to_string());
                }
            }

            next_token = response.next_token().map(|t| t.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(volumes)
    }

    pub async fn delete_volume(
        &self,
        scope: &CredentialsScope,
        volume_id: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        client
            .delete_volume()
            .volume_id(volume_id)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to delete volume", e))?;

        Ok(())
    }

    /// Ids of snapshots owned by the account itself, following pagination.
    pub async fn list_snapshot_ids(
        &self,
        scope: &CredentialsScope,
    ) -> Result<Vec<String>, OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        let mut snapshots = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = client.describe_snapshots().owner_ids("self");
            if let Some(token) = next_token.as_ref() {
                request = request.next_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to describe snapshots", e))?;

            for snapshot in response.snapshots() {
                if let Some(id) = snapshot.snapshot_id() {
                    snapshots.push(id.to_string());
                }
            }

            next_token = response.next_token().map(|t| t.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(snapshots)
    }

    pub async fn delete_snapshot(
        &self,
        scope: &CredentialsScope,
        snapshot_id: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        client
            .delete_snapshot()
            .snapshot_id(snapshot_id)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to delete snapshot", e))?;

        Ok(())
    }

    pub async fn copy_image(
        &self,
        scope: &CredentialsScope,
        source_image_id: &str,
        source_region: &str,
        name: &str,
    ) -> Result<String, OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        let response = client
            .copy_image()
            .source_image_id(source_image_id)
            .source_region(source_region)
            .name(name)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to copy image", e))?;

        response
            .image_id()
            .map(|id| id.to_string())
            .ok_or_else(|| {
                OperatorError::InternalError("CopyImage response missing image id".to_string())
            })
    }

    pub async fn describe_regions(
        &self,
        scope: &CredentialsScope,
    ) -> Result<Vec<String>, OperatorError> {
        let client = self.factory.create_ec2_client(scope).await?;

        let response = client
            .describe_regions()
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to describe regions", e))?;

        Ok(response
            .regions()
            .iter()
            .filter_map(|r| r.region_name())
            .map(|name| name.to_string())
            .collect())
    }
}
