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


use aws_smithy_types::error::metadata::ProvideErrorMetadata;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::client_factory::{AwsClientFactory, CredentialsScope};
use super::error::map_aws_err;
use crate::errors::OperatorError;

// IAM-specific types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessKeyView {
    pub access_key_id: String,
    pub secret_access_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleView {
    pub role_name: String,
    pub arn: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyEvaluationView {
    pub action_name: String,
    pub allowed: bool,
}

// Facade over the IAM API
pub struct IamService {
    factory: Arc<dyn AwsClientFactory>,
}

impl IamService {
    pub fn new(factory: Arc<dyn AwsClientFactory>) -> Self {
        Self { factory }
    }

    /// Create an IAM user. Returns false when the user already existed;
    /// callers treat that as idempotent success.
    pub async fn create_user(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
    ) -> Result<bool, OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        match client.create_user().user_name(user_name).send().await {
            Ok(_) => Ok(true),
            Err(e) if e.code() == Some("EntityAlreadyExists") => Ok(false),
            Err(e) => Err(map_aws_err("Failed to create IAM user", e)),
        }
    }

    pub async fn delete_user(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .delete_user()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to delete IAM user", e))?;

        Ok(())
    }

    pub async fn create_access_key(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
    ) -> Result<AccessKeyView, OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        let response = client
            .create_access_key()
            .user_name(user_name)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to create access key", e))?;

        let key = response.access_key().ok_or_else(|| {
            OperatorError::InternalError("CreateAccessKey response empty".to_string())
        })?;

        Ok(AccessKeyView {
            access_key_id: key.access_key_id().to_string(),
            secret_access_key: key.secret_access_key().to_string(),
        })
    }

    pub async fn list_access_keys(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
    ) -> Result<Vec<String>, OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        let mut keys = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut request = client.list_access_keys().user_name(user_name);
            if let Some(m) = marker.as_ref() {
                request = request.marker(m);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to list access keys", e))?;

            for metadata in response.access_key_metadata() {
                if let Some(id) = metadata.access_key_id() {
                    keys.push(id.to_string());
                }
            }

            if response.is_truncated() {
                marker = response.marker().map(|m| m.to_string());
            } else {
                break;
            }
        }

        Ok(keys)
    }

    pub async fn delete_access_key(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
        access_key_id: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .delete_access_key()
            .user_name(user_name)
            .access_key_id(access_key_id)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to delete access key", e))?;

        Ok(())
    }

    /// Delete every access key on the user. Two keys maximum per user, so no
    /// pagination concern on the delete side.
    pub async fn delete_all_access_keys(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
    ) -> Result<(), OperatorError> {
        for key_id in self.list_access_keys(scope, user_name).await? {
            self.delete_access_key(scope, user_name, &key_id).await?;
        }
        Ok(())
    }

    pub async fn attach_user_policy(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
        policy_arn: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .attach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to attach user policy", e))?;

        Ok(())
    }

    pub async fn detach_user_policy(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
        policy_arn: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .detach_user_policy()
            .user_name(user_name)
            .policy_arn(policy_arn)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to detach user policy", e))?;

        Ok(())
    }

    pub async fn put_user_policy(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
        policy_name: &str,
        policy_document: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .put_user_policy()
            .user_name(user_name)
            .policy_name(policy_name)
            .policy_document(policy_document)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to put user policy", e))?;

        Ok(())
    }

    pub async fn delete_user_policy(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
        policy_name: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .delete_user_policy()
            .user_name(user_name)
            .policy_name(policy_name)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to delete user policy", e))?;

        Ok(())
    }

    pub async fn create_role(
        &self,
        scope: &CredentialsScope,
        role_name: &str,
        assume_role_policy_document: &str,
    ) -> Result<RoleView, OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        let response = client
            .create_role()
            .role_name(role_name)
            .assume_role_policy_document(assume_role_policy_document)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to create role", e))?;

        let role = response.role().ok_or_else(|| {
            OperatorError::InternalError("CreateRole response empty".to_string())
        })?;

        Ok(RoleView {
            role_name: role.role_name().to_string(),
            arn: role.arn().to_string(),
        })
    }

    pub async fn delete_role(
        &self,
        scope: &CredentialsScope,
        role_name: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .delete_role()
            .role_name(role_name)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to delete role", e))?;

        Ok(())
    }

    pub async fn get_role(
        &self,
        scope: &CredentialsScope,
        role_name: &str,
    ) -> Result<Option<RoleView>, OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        match client.get_role().role_name(role_name).send().await {
            Ok(response) => Ok(response.role().map(|r| RoleView {
                role_name: r.role_name().to_string(),
                arn: r.arn().to_string(),
            })),
            Err(e) if e.code() == Some("NoSuchEntity") => Ok(None),
            Err(e) => Err(map_aws_err("Failed to get role", e)),
        }
    }

    /// Evaluate whether `principal_arn` is allowed each of `action_names`,
    /// following pagination.
    pub async fn simulate_principal_policy(
        &self,
        scope: &CredentialsScope,
        principal_arn: &str,
        action_names: &[String],
    ) -> Result<Vec<PolicyEvaluationView>, OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        let mut evaluations = Vec::new();
        let mut marker: Option<String> = None;
        loop {
            let mut request = client
                .simulate_principal_policy()
                .policy_source_arn(principal_arn);
            for action in action_names {
                request = request.action_names(action);
            }
            if let Some(m) = marker.as_ref() {
                request = request.marker(m);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to simulate principal policy", e))?;

            for result in response.evaluation_results() {
                evaluations.push(PolicyEvaluationView {
                    action_name: result.eval_action_name().to_string(),
                    allowed: result
                        .eval_decision()
                        .as_str()
                        .eq_ignore_ascii_case("allowed"),
                });
            }

            if response.is_truncated() {
                marker = response.marker().map(|m| m.to_string());
            } else {
                break;
            }
        }

        Ok(evaluations)
    }

    pub async fn create_login_profile(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
        password: &str,
        password_reset_required: bool,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        client
            .create_login_profile()
            .user_name(user_name)
            .password(password)
            .password_reset_required(password_reset_required)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to create login profile", e))?;

        Ok(())
    }

    pub async fn delete_login_profile(
        &self,
        scope: &CredentialsScope,
        user_name: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_iam_client(scope).await?;

        match client.delete_login_profile().user_name(user_name).send().await {
            Ok(_) => Ok(()),
            Err(e) if e.code() == Some("NoSuchEntity") => Ok(()),
            Err(e) => Err(map_aws_err("Failed to delete login profile", e)),
        }
    }
}
