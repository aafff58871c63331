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


// Unit tests for the claim validation precondition

use crate::errors::OperatorError;
use crate::models::account_claim::{AccountClaimSpec, SecretRef};

fn valid_pooled_spec() -> AccountClaimSpec {
    AccountClaimSpec {
        aws_credential_secret: SecretRef {
            name: "cluster-creds".to_string(),
            namespace: "cluster-ns".to_string(),
        },
        ..AccountClaimSpec::default()
    }
}

#[test]
fn test_pooled_claim_valid() {
    assert!(valid_pooled_spec().validate().is_ok());
}

#[test]
fn test_manual_sts_requires_role_arn() {
    let spec = AccountClaimSpec {
        manual_sts_mode: true,
        ..AccountClaimSpec::default()
    };

    let error = spec.validate().unwrap_err();
    match error {
        OperatorError::ValidationError(msg) => assert!(msg.contains("stsRoleArn")),
        _ => panic!("Expected ValidationError"),
    }

    let spec = AccountClaimSpec {
        manual_sts_mode: true,
        sts_role_arn: "arn:aws:iam::123456789012:role/consumer".to_string(),
        ..AccountClaimSpec::default()
    };
    assert!(spec.validate().is_ok());
}

#[test]
fn test_byoc_requires_account_id() {
    let spec = AccountClaimSpec {
        byoc: true,
        byoc_secret_ref: SecretRef {
            name: "byoc-creds".to_string(),
            namespace: "customer-ns".to_string(),
        },
        aws_credential_secret: SecretRef {
            name: "out".to_string(),
            namespace: "customer-ns".to_string(),
        },
        ..AccountClaimSpec::default()
    };

    let error = spec.validate().unwrap_err();
    match error {
        OperatorError::ValidationError(msg) => assert!(msg.contains("byocAWSAccountID")),
        _ => panic!("Expected ValidationError"),
    }
}

#[test]
fn test_byoc_requires_secret_ref() {
    let spec = AccountClaimSpec {
        byoc: true,
        byoc_aws_account_id: "123456789012".to_string(),
        aws_credential_secret: SecretRef {
            name: "out".to_string(),
            namespace: "customer-ns".to_string(),
        },
        ..AccountClaimSpec::default()
    };

    let error = spec.validate().unwrap_err();
    match error {
        OperatorError::ValidationError(msg) => assert!(msg.contains("byocSecretRef")),
        _ => panic!("Expected ValidationError"),
    }
}

#[test]
fn test_byoc_fully_specified_valid() {
    let spec = AccountClaimSpec {
        byoc: true,
        byoc_aws_account_id: "123456789012".to_string(),
        byoc_secret_ref: SecretRef {
            name: "byoc-creds".to_string(),
            namespace: "customer-ns".to_string(),
        },
        aws_credential_secret: SecretRef {
            name: "out".to_string(),
            namespace: "customer-ns".to_string(),
        },
        ..AccountClaimSpec::default()
    };
    assert!(spec.validate().is_ok());
}

#[test]
fn test_missing_credential_secret_rejected() {
    let spec = AccountClaimSpec::default();

    let error = spec.validate().unwrap_err();
    match error {
        OperatorError::ValidationError(msg) => assert!(msg.contains("awsCredentialSecret")),
        _ => panic!("Expected ValidationError"),
    }
}

#[test]
fn test_manual_sts_skips_credential_secret_requirement() {
    // Manual-STS consumers bring their own role; no secret is minted
    let spec = AccountClaimSpec {
        manual_sts_mode: true,
        sts_role_arn: "arn:aws:iam::123456789012:role/consumer".to_string(),
        ..AccountClaimSpec::default()
    };
    assert!(spec.validate().is_ok());
}
