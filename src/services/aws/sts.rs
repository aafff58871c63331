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


use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::client_factory::{AwsClientFactory, CredentialsScope};
use super::error::map_aws_err;
use crate::errors::OperatorError;

// STS-specific types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
    pub expiration: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallerIdentity {
    pub account: String,
    pub arn: String,
    pub user_id: String,
}

// Facade over the STS API
pub struct StsService {
    factory: Arc<dyn AwsClientFactory>,
}

impl StsService {
    pub fn new(factory: Arc<dyn AwsClientFactory>) -> Self {
        Self { factory }
    }

    pub async fn get_federation_token(
        &self,
        scope: &CredentialsScope,
        name: &str,
        duration_seconds: i32,
    ) -> Result<SessionCredentials, OperatorError> {
        let client = self.factory.create_sts_client(scope).await?;

        let response = client
            .get_federation_token()
            .name(name)
            .duration_seconds(duration_seconds)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to get federation token", e))?;

        let credentials = response.credentials().ok_or_else(|| {
            OperatorError::InternalError("GetFederationToken response empty".to_string())
        })?;

        Ok(SessionCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: DateTime::from_timestamp(
                credentials.expiration().secs(),
                credentials.expiration().subsec_nanos(),
            ),
        })
    }

    pub async fn assume_role(
        &self,
        scope: &CredentialsScope,
        role_arn: &str,
        session_name: &str,
        external_id: Option<&str>,
    ) -> Result<SessionCredentials, OperatorError> {
        let client = self.factory.create_sts_client(scope).await?;

        let mut request = client
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name);
        if let Some(id) = external_id {
            request = request.external_id(id);
        }

        let response = request
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to assume role", e))?;

        let credentials = response.credentials().ok_or_else(|| {
            OperatorError::InternalError("AssumeRole response empty".to_string())
        })?;

        Ok(SessionCredentials {
            access_key_id: credentials.access_key_id().to_string(),
            secret_access_key: credentials.secret_access_key().to_string(),
            session_token: credentials.session_token().to_string(),
            expiration: DateTime::from_timestamp(
                credentials.expiration().secs(),
                credentials.expiration().subsec_nanos(),
            ),
        })
    }

    pub async fn get_caller_identity(
        &self,
        scope: &CredentialsScope,
    ) -> Result<CallerIdentity, OperatorError> {
        let client = self.factory.create_sts_client(scope).await?;

        let response = client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to get caller identity", e))?;

        Ok(CallerIdentity {
            account: response.account().unwrap_or_default().to_string(),
            arn: response.arn().unwrap_or_default().to_string(),
            user_id: response.user_id().unwrap_or_default().to_string(),
        })
    }
}
