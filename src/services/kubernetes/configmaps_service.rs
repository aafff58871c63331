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


use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::Api;
use kube::Client;
use serde::Deserialize;
use std::collections::BTreeMap;

use crate::errors::OperatorError;

const KEY_BASE_OU: &str = "base";
const KEY_ROOT_OU: &str = "root";
const KEY_ACCOUNT_LIMIT: &str = "account-limit";
const KEY_MANAGED_TAGS: &str = "aws-managed-tags";
const KEY_SHARD_NAME: &str = "sre-access-shard-name";
const CONCURRENCY_PREFIX: &str = "MaxConcurrentReconciles.";
const FEATURE_PREFIX: &str = "feature.";

#[derive(Debug, Deserialize)]
struct ManagedTag {
    key: String,
    value: String,
}

/// Typed view over the operator configmap. Controllers re-read this on every
/// reconcile that needs it; only operators mutate the backing configmap.
#[derive(Debug, Clone, Default)]
pub struct OperatorConfigView {
    pub base_ou: String,
    pub root_ou: String,
    pub account_limit: Option<u32>,
    pub concurrency: BTreeMap<String, usize>,
    pub feature_flags: BTreeMap<String, bool>,
    pub managed_tags: Vec<(String, String)>,
    pub shard_name: String,
}

impl OperatorConfigView {
    pub fn from_data(data: &BTreeMap<String, String>) -> Self {
        let mut view = OperatorConfigView {
            base_ou: data.get(KEY_BASE_OU).cloned().unwrap_or_default(),
            root_ou: data.get(KEY_ROOT_OU).cloned().unwrap_or_default(),
            account_limit: data.get(KEY_ACCOUNT_LIMIT).and_then(|v| v.parse().ok()),
            shard_name: data.get(KEY_SHARD_NAME).cloned().unwrap_or_default(),
            ..OperatorConfigView::default()
        };

        for (key, value) in data {
            if let Some(controller) = key.strip_prefix(CONCURRENCY_PREFIX) {
                if let Ok(n) = value.parse::<usize>() {
                    view.concurrency.insert(controller.to_string(), n);
                }
            } else if let Some(flag) = key.strip_prefix(FEATURE_PREFIX) {
                view.feature_flags
                    .insert(flag.to_string(), value == "true");
            }
        }

        if let Some(raw) = data.get(KEY_MANAGED_TAGS) {
            if let Ok(tags) = serde_json::from_str::<Vec<ManagedTag>>(raw) {
                view.managed_tags = tags.into_iter().map(|t| (t.key, t.value)).collect();
            }
        }

        view
    }

    pub fn max_concurrent_reconciles(&self, controller: &str) -> usize {
        self.concurrency.get(controller).copied().unwrap_or(1)
    }

    pub fn feature_enabled(&self, flag: &str) -> bool {
        self.feature_flags.get(flag).copied().unwrap_or(false)
    }
}

pub struct ConfigMapsService {
    client: Client,
}

impl ConfigMapsService {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    fn api(&self, namespace: &str) -> Api<ConfigMap> {
        Api::namespaced(self.client.clone(), namespace)
    }

    pub async fn read_operator_config(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<OperatorConfigView, OperatorError> {
        let cm = self
            .api(namespace)
            .get(name)
            .await
            .map_err(OperatorError::KubeError)?;
        Ok(OperatorConfigView::from_data(&cm.data.unwrap_or_default()))
    }

    /// Region name to warm-up AMI id, straight from configmap data.
    pub async fn read_region_ami_map(
        &self,
        name: &str,
        namespace: &str,
    ) -> Result<BTreeMap<String, String>, OperatorError> {
        let cm = self
            .api(namespace)
            .get(name)
            .await
            .map_err(OperatorError::KubeError)?;
        Ok(cm.data.unwrap_or_default())
    }
}
