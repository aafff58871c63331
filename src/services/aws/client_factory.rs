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


use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_ec2::Client as Ec2Client;
use aws_sdk_iam::Client as IamClient;
use aws_sdk_organizations::Client as OrganizationsClient;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_sts::Client as StsClient;
use aws_sdk_support::Client as SupportClient;
use once_cell::sync::Lazy;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;
use tracing::debug;

use super::config_service::AwsConfigService;
use crate::errors::OperatorError;
use crate::services::kubernetes::secrets_service::SecretsService;

/// Credential scope for one gateway call: which secret supplies the keys and
/// which region the client talks to.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct CredentialsScope {
    pub secret_name: String,
    pub namespace: String,
    pub region: String,
}

impl CredentialsScope {
    pub fn new(secret_name: &str, namespace: &str, region: &str) -> Self {
        Self {
            secret_name: secret_name.to_string(),
            namespace: namespace.to_string(),
            region: region.to_string(),
        }
    }
}

// Simple global cache keyed by a fingerprint of the credential scope
static CONFIG_CACHE: Lazy<dashmap::DashMap<u64, Arc<SdkConfig>>> =
    Lazy::new(|| dashmap::DashMap::new());

fn fingerprint(scope: &CredentialsScope) -> u64 {
    let mut hasher = DefaultHasher::new();
    scope.hash(&mut hasher);
    hasher.finish()
}

// Client factory trait for AWS service clients
#[async_trait]
pub trait AwsClientFactory: Send + Sync {
    async fn create_organizations_client(
        &self,
        scope: &CredentialsScope,
    ) -> Result<OrganizationsClient, OperatorError>;
    async fn create_iam_client(&self, scope: &CredentialsScope)
        -> Result<IamClient, OperatorError>;
    async fn create_sts_client(&self, scope: &CredentialsScope)
        -> Result<StsClient, OperatorError>;
    async fn create_ec2_client(&self, scope: &CredentialsScope)
        -> Result<Ec2Client, OperatorError>;
    async fn create_s3_client(&self, scope: &CredentialsScope) -> Result<S3Client, OperatorError>;
    async fn create_support_client(
        &self,
        scope: &CredentialsScope,
    ) -> Result<SupportClient, OperatorError>;

    /// Drop the cached client config for `scope`. Called after an
    /// authentication classification so the next call re-reads the secret.
    fn invalidate(&self, scope: &CredentialsScope);
}

pub struct DefaultAwsClientFactory {
    secrets: Arc<SecretsService>,
    config_service: AwsConfigService,
}

impl DefaultAwsClientFactory {
    pub fn new(secrets: Arc<SecretsService>) -> Self {
        Self {
            secrets,
            config_service: AwsConfigService::new(),
        }
    }

    async fn sdk_config(&self, scope: &CredentialsScope) -> Result<Arc<SdkConfig>, OperatorError> {
        let key = fingerprint(scope);
        if let Some(entry) = CONFIG_CACHE.get(&key) {
            return Ok(entry.value().clone());
        }

        let credentials = self
            .secrets
            .read_aws_credentials(&scope.secret_name, &scope.namespace)
            .await?;
        let config = Arc::new(
            self.config_service
                .get_aws_config(&scope.region, &credentials)
                .await?,
        );
        CONFIG_CACHE.insert(key, config.clone());
        Ok(config)
    }
}

#[async_trait]
impl AwsClientFactory for DefaultAwsClientFactory {
    async fn create_organizations_client(
        &self,
        scope: &CredentialsScope,
    ) -> Result<OrganizationsClient, OperatorError> {
        let config = self.sdk_config(scope).await?;
        Ok(OrganizationsClient::new(&config))
    }

    async fn create_iam_client(
        &self,
        scope: &CredentialsScope,
    ) -> Result<IamClient, OperatorError> {
        let config = self.sdk_config(scope).await?;
        Ok(IamClient::new(&config))
    }

    async fn create_sts_client(
        &self,
        scope: &CredentialsScope,
    ) -> Result<StsClient, OperatorError> {
        let config = self.sdk_config(scope).await?;
        Ok(StsClient::new(&config))
    }

    async fn create_ec2_client(
        &self,
        scope: &CredentialsScope,
    ) -> Result<Ec2Client, OperatorError> {
        let config = self.sdk_config(scope).await?;
        Ok(Ec2Client::new(&config))
    }

    async fn create_s3_client(&self, scope: &CredentialsScope) -> Result<S3Client, OperatorError> {
        let config = self.sdk_config(scope).await?;
        Ok(S3Client::new(&config))
    }

    async fn create_support_client(
        &self,
        scope: &CredentialsScope,
    ) -> Result<SupportClient, OperatorError> {
        let config = self.sdk_config(scope).await?;
        Ok(SupportClient::new(&config))
    }

    fn invalidate(&self, scope: &CredentialsScope) {
        debug!(secret = %scope.secret_name, region = %scope.region, "Invalidating cached AWS client config");
        CONFIG_CACHE.remove(&fingerprint(scope));
    }
}
