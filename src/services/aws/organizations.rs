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


use aws_sdk_organizations::types::{ChildType, CreateAccountState, Tag};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::client_factory::{AwsClientFactory, CredentialsScope};
use super::error::{map_aws_err, AwsErrorCode};
use crate::errors::OperatorError;

// Organizations-specific types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreationStatus {
    InProgress,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct CreationStatusView {
    pub status: CreationStatus,
    pub aws_account_id: Option<String>,
    pub failure_reason: Option<String>,
}

// Facade over the Organizations API
pub struct OrganizationsService {
    factory: Arc<dyn AwsClientFactory>,
}

impl OrganizationsService {
    pub fn new(factory: Arc<dyn AwsClientFactory>) -> Self {
        Self { factory }
    }

    /// Issue an account-creation request. Returns the creation-request id
    /// used to poll progress; the request itself is the at-most-once fence
    /// for account creation.
    pub async fn create_account(
        &self,
        scope: &CredentialsScope,
        email: &str,
        account_name: &str,
        tags: &[(String, String)],
    ) -> Result<String, OperatorError> {
        let client = self.factory.create_organizations_client(scope).await?;

        let mut request = client.create_account().email(email).account_name(account_name);
        for (key, value) in tags {
            request = request.tags(
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| OperatorError::InternalError(format!("Invalid tag: {}", e)))?,
            );
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to create account", e))?;

        response
            .create_account_status()
            .and_then(|s| s.id())
            .map(|id| id.to_string())
            .ok_or_else(|| {
                OperatorError::InternalError(
                    "CreateAccount response missing request id".to_string(),
                )
            })
    }

    pub async fn describe_create_account_status(
        &self,
        scope: &CredentialsScope,
        request_id: &str,
    ) -> Result<CreationStatusView, OperatorError> {
        let client = self.factory.create_organizations_client(scope).await?;

        let response = client
            .describe_create_account_status()
            .create_account_request_id(request_id)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to describe account creation status", e))?;

        let status = response.create_account_status().ok_or_else(|| {
            OperatorError::InternalError("DescribeCreateAccountStatus response empty".to_string())
        })?;

        let state = match status.state() {
            Some(CreateAccountState::Succeeded) => CreationStatus::Succeeded,
            Some(CreateAccountState::Failed) => CreationStatus::Failed,
            _ => CreationStatus::InProgress,
        };

        Ok(CreationStatusView {
            status: state,
            aws_account_id: status.account_id().map(|s| s.to_string()),
            failure_reason: status.failure_reason().map(|r| r.as_str().to_string()),
        })
    }

    /// Reject moves that cannot succeed before touching the API.
    pub fn validate_move_account(
        &self,
        account_id: &str,
        source_parent: &str,
        destination_parent: &str,
    ) -> Result<(), OperatorError> {
        if account_id.is_empty() {
            return Err(OperatorError::ValidationError(
                "move requires a non-empty account id".to_string(),
            ));
        }
        if source_parent.is_empty() || destination_parent.is_empty() {
            return Err(OperatorError::ValidationError(
                "move requires source and destination parents".to_string(),
            ));
        }
        if source_parent == destination_parent {
            return Err(OperatorError::ValidationError(
                "move source and destination are identical".to_string(),
            ));
        }
        Ok(())
    }

    pub async fn move_account(
        &self,
        scope: &CredentialsScope,
        account_id: &str,
        source_parent: &str,
        destination_parent: &str,
    ) -> Result<(), OperatorError> {
        self.validate_move_account(account_id, source_parent, destination_parent)?;
        let client = self.factory.create_organizations_client(scope).await?;

        client
            .move_account()
            .account_id(account_id)
            .source_parent_id(source_parent)
            .destination_parent_id(destination_parent)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to move account", e))?;

        Ok(())
    }

    /// Parent container ids of a child, following pagination.
    pub async fn list_parents(
        &self,
        scope: &CredentialsScope,
        child_id: &str,
    ) -> Result<Vec<String>, OperatorError> {
        let client = self.factory.create_organizations_client(scope).await?;

        let mut parents = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = client.list_parents().child_id(child_id);
            if let Some(token) = next_token.as_ref() {
                request = request.next_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to list parents", e))?;

            for parent in response.parents() {
                if let Some(id) = parent.id() {
                    parents.push(id.to_string());
                }
            }

            next_token = response.next_token().map(|t| t.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(parents)
    }

    /// Account ids directly under a parent, following pagination.
    pub async fn list_children_accounts(
        &self,
        scope: &CredentialsScope,
        parent_id: &str,
    ) -> Result<Vec<String>, OperatorError> {
        let client = self.factory.create_organizations_client(scope).await?;

        let mut children = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = client
                .list_children()
                .parent_id(parent_id)
                .child_type(ChildType::Account);
            if let Some(token) = next_token.as_ref() {
                request = request.next_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to list children", e))?;

            for child in response.children() {
                if let Some(id) = child.id() {
                    children.push(id.to_string());
                }
            }

            next_token = response.next_token().map(|t| t.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(children)
    }

    pub async fn list_ous_for_parent(
        &self,
        scope: &CredentialsScope,
        parent_id: &str,
    ) -> Result<Vec<OrgUnit>, OperatorError> {
        let client = self.factory.create_organizations_client(scope).await?;

        let mut units = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = client
                .list_organizational_units_for_parent()
                .parent_id(parent_id);
            if let Some(token) = next_token.as_ref() {
                request = request.next_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to list organizational units", e))?;

            for unit in response.organizational_units() {
                if let (Some(id), Some(name)) = (unit.id(), unit.name()) {
                    units.push(OrgUnit {
                        id: id.to_string(),
                        name: name.to_string(),
                    });
                }
            }

            next_token = response.next_token().map(|t| t.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(units)
    }

    pub async fn create_ou(
        &self,
        scope: &CredentialsScope,
        parent_id: &str,
        name: &str,
    ) -> Result<OrgUnit, OperatorError> {
        let client = self.factory.create_organizations_client(scope).await?;

        let response = client
            .create_organizational_unit()
            .parent_id(parent_id)
            .name(name)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to create organizational unit", e))?;

        let unit = response.organizational_unit().ok_or_else(|| {
            OperatorError::InternalError("CreateOrganizationalUnit response empty".to_string())
        })?;

        Ok(OrgUnit {
            id: unit.id().unwrap_or_default().to_string(),
            name: unit.name().unwrap_or_default().to_string(),
        })
    }

    /// Create-or-find an OU named `name` under `parent_id`. The duplicate
    /// classification resolves the create/find race in favor of find.
    pub async fn ensure_ou(
        &self,
        scope: &CredentialsScope,
        parent_id: &str,
        name: &str,
    ) -> Result<OrgUnit, OperatorError> {
        match self.create_ou(scope, parent_id, name).await {
            Ok(unit) => Ok(unit),
            Err(err) if err.aws_code() == Some(AwsErrorCode::DuplicateOrganizationalUnit) => {
                let units = self.list_ous_for_parent(scope, parent_id).await?;
                units
                    .into_iter()
                    .find(|u| u.name == name)
                    .ok_or_else(|| {
                        OperatorError::NotFound(format!(
                            "organizational unit {} reported as duplicate but not listed",
                            name
                        ))
                    })
            }
            Err(err) => Err(err),
        }
    }

    pub async fn list_tags_for_account(
        &self,
        scope: &CredentialsScope,
        account_id: &str,
    ) -> Result<Vec<(String, String)>, OperatorError> {
        let client = self.factory.create_organizations_client(scope).await?;

        let mut tags = Vec::new();
        let mut next_token: Option<String> = None;
        loop {
            let mut request = client.list_tags_for_resource().resource_id(account_id);
            if let Some(token) = next_token.as_ref() {
                request = request.next_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to list account tags", e))?;

            for tag in response.tags() {
                tags.push((tag.key().to_string(), tag.value().to_string()));
            }

            next_token = response.next_token().map(|t| t.to_string());
            if next_token.is_none() {
                break;
            }
        }

        Ok(tags)
    }

    pub async fn tag_account(
        &self,
        scope: &CredentialsScope,
        account_id: &str,
        tags: &[(String, String)],
    ) -> Result<(), OperatorError> {
        if tags.is_empty() {
            return Ok(());
        }
        let client = self.factory.create_organizations_client(scope).await?;

        let mut request = client.tag_resource().resource_id(account_id);
        for (key, value) in tags {
            request = request.tags(
                Tag::builder()
                    .key(key)
                    .value(value)
                    .build()
                    .map_err(|e| OperatorError::InternalError(format!("Invalid tag: {}", e)))?,
            );
        }

        request
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to tag account", e))?;

        Ok(())
    }

    pub async fn untag_account(
        &self,
        scope: &CredentialsScope,
        account_id: &str,
        keys: &[String],
    ) -> Result<(), OperatorError> {
        if keys.is_empty() {
            return Ok(());
        }
        let client = self.factory.create_organizations_client(scope).await?;

        let mut request = client.untag_resource().resource_id(account_id);
        for key in keys {
            request = request.tag_keys(key);
        }

        request
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to untag account", e))?;

        Ok(())
    }
}
