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

use super::condition::Condition;

/// Finalizer gating Account deletion until remote cleanup has completed.
pub const ACCOUNT_FINALIZER: &str = "aws.mayyam.io/account-cleanup";

/// Customer owning a claim; drives organizational-unit placement and reuse
/// affinity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct LegalEntity {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub id: String,
}

/// One AWS account managed by the operator.
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "aws.mayyam.io",
    version = "v1alpha1",
    kind = "Account",
    namespaced,
    status = "AccountStatus",
    shortname = "acct"
)]
#[serde(rename_all = "camelCase")]
pub struct AccountSpec {
    /// Empty until the Organizations creation request succeeds.
    #[serde(default)]
    pub aws_account_id: String,
    /// Name of the operator-namespace secret holding the IAM user access key.
    #[serde(default)]
    pub iam_user_secret: String,
    /// Customer-supplied account; skips creation and remote teardown.
    #[serde(default)]
    pub byoc: bool,
    /// Name of the claim this account is bound to, empty while unclaimed.
    #[serde(default)]
    pub claim_link: String,
    #[serde(default)]
    pub claim_link_namespace: String,
    #[serde(default)]
    pub legal_entity: LegalEntity,
    #[serde(default)]
    pub manual_sts_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum AccountState {
    Pending,
    Creating,
    PendingVerification,
    InitializingRegions,
    Ready,
    Failed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<AccountState>,
    #[serde(default)]
    pub claimed: bool,
    #[serde(default)]
    pub reused: bool,
    #[serde(default)]
    pub support_case_id: String,
    /// Organizations creation-request id; the at-most-once fence for
    /// account creation.
    #[serde(default)]
    pub creation_request_id: String,
    #[serde(default)]
    pub rotate_credentials: bool,
    #[serde(default)]
    pub rotate_console_credentials: bool,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl Account {
    pub fn state(&self) -> Option<AccountState> {
        self.status.as_ref().and_then(|s| s.state)
    }

    pub fn is_ready(&self) -> bool {
        self.state() == Some(AccountState::Ready)
    }

    pub fn is_failed(&self) -> bool {
        self.state() == Some(AccountState::Failed)
    }

    pub fn is_claimed(&self) -> bool {
        self.status.as_ref().map(|s| s.claimed).unwrap_or(false)
    }

    pub fn is_reused(&self) -> bool {
        self.status.as_ref().map(|s| s.reused).unwrap_or(false)
    }

    /// A fresh pool account: ready, never claimed, never recycled.
    pub fn is_unclaimed(&self) -> bool {
        self.is_ready() && !self.is_claimed() && !self.is_reused()
    }

    /// A recycled account available for claims of the same legal entity.
    pub fn is_reusable_for(&self, legal_entity_id: &str) -> bool {
        self.is_ready()
            && !self.is_claimed()
            && self.is_reused()
            && !legal_entity_id.is_empty()
            && self.spec.legal_entity.id == legal_entity_id
    }
}
