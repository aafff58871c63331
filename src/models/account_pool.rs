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


use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Target population of unclaimed ready accounts.
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "aws.mayyam.io",
    version = "v1alpha1",
    kind = "AccountPool",
    namespaced,
    status = "AccountPoolStatus",
    shortname = "pool"
)]
#[serde(rename_all = "camelCase")]
pub struct AccountPoolSpec {
    pub pool_size: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountPoolStatus {
    pub pool_size: u32,
    pub unclaimed_accounts: u32,
    pub claimed_accounts: u32,
}
