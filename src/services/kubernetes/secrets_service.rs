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


use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::{Api, DeleteParams, Patch, PatchParams, PostParams};
use kube::Client;
use std::collections::BTreeMap;

use crate::errors::OperatorError;

pub const KEY_ACCESS_KEY_ID: &str = "aws_access_key_id";
pub const KEY_SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
pub const KEY_SESSION_TOKEN: &str = "aws_session_token";
pub const KEY_USER_NAME: &str = "aws_user_name";

/// Static or session credentials parsed out of an opaque secret.
#[derive(Debug, Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub user_name: Option<String>,
}

impl AwsCredentials {
    /// Parse the well-known credential keys out of decoded secret data.
    pub fn from_data(data: &BTreeMap<String, Vec<u8>>) -> Result<Self, OperatorError> {
        let get = |key: &str| -> Result<String, OperatorError> {
            data.get(key)
                .map(|v| String::from_utf8_lossy(v).to_string())
                .filter(|v| !v.is_empty())
                .ok_or_else(|| OperatorError::SecretError(format!("secret missing key {}", key)))
        };

        Ok(Self {
            access_key_id: get(KEY_ACCESS_KEY_ID)?,
            secret_access_key: get(KEY_SECRET_ACCESS_KEY)?,
            session_token: data
                .get(KEY_SESSION_TOKEN)
                .map(|v| String::from_utf8_lossy(v).to_string()),
            user_name: data
                .get(KEY_USER_NAME)
                .map(|v| String::from_utf8_lossy(v).to_string()),
        })
    }

    pub fn to_string_data(&self) -> BTreeMap<String, String> {
        let mut data = BTreeMap::new();
        data.insert(KEY_ACCESS_KEY_ID.to_string(), self.access_key_id.clone());
        data.insert(
            KEY_SECRET_ACCESS_KEY.to_string(),
            self.secret_access_key.clone(),
        );
        if let Some(token) = self.session_token.as_ref() {
            data.insert(KEY_SESSION_TOKEN.to_string(), token.clone());
        }
        if let Some(user) = self.user_name.as_ref() {
            data.insert(KEY_USER_NAME.to_string(), user.clone());
        }
        data
    }
}

pub struct SecretsService {
    client: Client,
}

impl SecretsService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<Secret> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub async fn get(&self, name: &str, namespace: &str) -> Result<Secret, OperatorError> {
        self.api(namespace)
            .get(name)
            .await
            .map_err(OperatorError::KubeError)
    }

    pub async fn get_opt(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<Option<Secret>, OperatorError> {
        self.api(namespace)
            .get_opt(name)
            .await
            .map_err(OperatorError::KubeError)
    }

    pub async fn read_aws_credentials(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<AwsCredentials, OperatorError> {
        let secret = self.get(name, namespace).await?;
        let data: BTreeMap<String, Vec<u8>> = secret
            .data
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, v.0))
            .collect();
        AwsCredentials::from_data(&data)
    }

    /// Create or overwrite an opaque secret with the given entries.
    pub async fn write(
        &self,
        name: &str,
        namespace: &str,
        string_data: BTreeMap<String, String>,
    ) -> Result<(), OperatorError> {
        let secret = Secret {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                namespace: Some(namespace.to_string()),
                ..ObjectMeta::default()
            },
            string_data: Some(string_data),
            type_: Some("Opaque".to_string()),
            ..Secret::default()
        };

        let api = self.api(namespace);
        match api.create(&PostParams::default(), &secret).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 409 => {
                let ps = PatchParams::apply("account-operator").force();
                api.patch(name, &ps, &Patch::Apply(&secret))
                    .await
                    .map_err(OperatorError::KubeError)?;
                Ok(())
            }
            Err(e) => Err(OperatorError::KubeError(e)),
        }
    }

    pub async fn delete(&self, name: &str, namespace: &str) -> Result<(), OperatorError> {
        match self.api(namespace).delete(name, &DeleteParams::default()).await {
            Ok(_) => Ok(()),
            Err(kube::Error::Api(e)) if e.code == 404 => Ok(()),
            Err(e) => Err(OperatorError::KubeError(e)),
        }
    }

    /// Add a finalizer to a secret, blocking user-driven deletion until the
    /// owning claim releases it.
    pub async fn add_finalizer(
        &self,
        name: &str,
        namespace: &str,
        finalizer: &str,
    ) -> Result<(), OperatorError> {
        let api = self.api(namespace);
        let mut secret = api.get(name).await.map_err(OperatorError::KubeError)?;

        let finalizers = secret.metadata.finalizers.get_or_insert_with(Vec::new);
        if finalizers.iter().any(|f| f == finalizer) {
            return Ok(());
        }
        finalizers.push(finalizer.to_string());

        api.replace(name, &PostParams::default(), &secret)
            .await
            .map_err(OperatorError::KubeError)?;
        Ok(())
    }

    pub async fn remove_finalizer(
        &self,
        name: &str,
        namespace: &str,
        finalizer: &str,
    ) -> Result<(), OperatorError> {
        let api = self.api(namespace);
        let mut secret = match api.get_opt(name).await.map_err(OperatorError::KubeError)? {
            Some(s) => s,
            None => return Ok(()),
        };

        let Some(finalizers) = secret.metadata.finalizers.as_mut() else {
            return Ok(());
        };
        let before = finalizers.len();
        finalizers.retain(|f| f != finalizer);
        if finalizers.len() == before {
            return Ok(());
        }

        api.replace(name, &PostParams::default(), &secret)
            .await
            .map_err(OperatorError::KubeError)?;
        Ok(())
    }
}
