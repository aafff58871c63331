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

use super::account::LegalEntity;
use super::condition::Condition;
use crate::errors::OperatorError;

/// Finalizer gating AccountClaim deletion until the release pipeline has run.
pub const CLAIM_FINALIZER: &str = "aws.mayyam.io/claim-cleanup";

/// Finalizer placed on the BYOC credential secret while a claim consumes it.
pub const BYOC_SECRET_FINALIZER: &str = "aws.mayyam.io/byoc-secret";

/// Annotation marking a claim as a test fake; reconciled without AWS calls.
pub const FAKE_CLAIM_ANNOTATION: &str = "aws.mayyam.io/fake-claim";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SecretRef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub namespace: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AwsRegion {
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CustomTag {
    pub key: String,
    pub value: String,
}

/// A user request for exclusive use of one AWS account.
#[derive(CustomResource, Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[kube(
    group = "aws.mayyam.io",
    version = "v1alpha1",
    kind = "AccountClaim",
    namespaced,
    status = "AccountClaimStatus",
    shortname = "claim"
)]
#[serde(rename_all = "camelCase")]
pub struct AccountClaimSpec {
    #[serde(default)]
    pub legal_entity: LegalEntity,
    #[serde(default)]
    pub aws_regions: Vec<AwsRegion>,
    /// Where the consumer-facing credential secret is emitted.
    #[serde(default)]
    pub aws_credential_secret: SecretRef,
    /// Name of the backing Account record, set once bound.
    #[serde(default)]
    pub account_link: String,
    /// Organizational unit the backing account was moved into.
    #[serde(default)]
    pub account_ou: String,
    #[serde(default)]
    pub byoc: bool,
    #[serde(default)]
    pub byoc_secret_ref: SecretRef,
    #[serde(default)]
    pub byoc_aws_account_id: String,
    #[serde(default)]
    pub manual_sts_mode: bool,
    #[serde(default)]
    pub sts_role_arn: String,
    #[serde(default)]
    pub sts_external_id: String,
    #[serde(default)]
    pub custom_tags: Vec<CustomTag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ClaimState {
    Pending,
    Ready,
    Error,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AccountClaimStatus {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<ClaimState>,
    #[serde(default)]
    pub conditions: Vec<Condition>,
}

impl AccountClaimSpec {
    /// Validation precondition applied before any account is bound. Failures
    /// surface as `state=Error` and are not retried until the spec mutates.
    pub fn validate(&self) -> Result<(), OperatorError> {
        if self.manual_sts_mode {
            if self.sts_role_arn.is_empty() {
                return Err(OperatorError::ValidationError(
                    "manualSTSMode requires stsRoleArn".to_string(),
                ));
            }
            return Ok(());
        }

        if self.byoc {
            if self.byoc_aws_account_id.is_empty() {
                return Err(OperatorError::ValidationError(
                    "BYOC claim requires byocAWSAccountID".to_string(),
                ));
            }
            if self.byoc_secret_ref.name.is_empty() || self.byoc_secret_ref.namespace.is_empty() {
                return Err(OperatorError::ValidationError(
                    "BYOC claim requires byocSecretRef".to_string(),
                ));
            }
        }

        if self.aws_credential_secret.name.is_empty() && !self.manual_sts_mode {
            return Err(OperatorError::ValidationError(
                "claim requires awsCredentialSecret".to_string(),
            ));
        }

        Ok(())
    }
}

impl AccountClaim {
    pub fn state(&self) -> Option<ClaimState> {
        self.status.as_ref().and_then(|s| s.state)
    }

    pub fn is_fake(&self) -> bool {
        self.metadata
            .annotations
            .as_ref()
            .and_then(|a| a.get(FAKE_CLAIM_ANNOTATION))
            .map(|v| v == "true")
            .unwrap_or(false)
    }

    /// Fully reconciled: bound, placed in an OU, and marked Ready.
    pub fn is_satisfied(&self) -> bool {
        !self.spec.account_link.is_empty()
            && !self.spec.account_ou.is_empty()
            && self.state() == Some(ClaimState::Ready)
    }
}
