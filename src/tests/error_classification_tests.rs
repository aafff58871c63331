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


// Unit tests for provider error classification

use crate::errors::OperatorError;
use crate::services::aws::error::AwsErrorCode;

#[test]
fn test_raw_code_mapping() {
    let cases = vec![
        ("TooManyRequestsException", AwsErrorCode::TooManyRequests),
        ("Throttling", AwsErrorCode::TooManyRequests),
        ("ServiceException", AwsErrorCode::InternalFailure),
        ("AccessDenied", AwsErrorCode::AuthorizationError),
        ("UnauthorizedOperation", AwsErrorCode::AuthorizationError),
        ("InvalidClientTokenId", AwsErrorCode::AuthenticationError),
        ("SignatureDoesNotMatch", AwsErrorCode::AuthenticationError),
        (
            "DuplicateOrganizationalUnitException",
            AwsErrorCode::DuplicateOrganizationalUnit,
        ),
        (
            "AccountNotFoundException",
            AwsErrorCode::AccountNotFoundInParent,
        ),
        (
            "ConcurrentModificationException",
            AwsErrorCode::ConcurrentModification,
        ),
        ("ChildNotFoundException", AwsErrorCode::ChildNotFoundInOu),
        (
            "CaseCreationLimitExceeded",
            AwsErrorCode::SupportCaseLimitExceeded,
        ),
        (
            "MalformedPolicyDocument",
            AwsErrorCode::MalformedPolicyDocument,
        ),
        (
            "ConstraintViolationException",
            AwsErrorCode::AccountLimitExceeded,
        ),
        ("SomethingNovel", AwsErrorCode::Other),
    ];

    for (raw, expected) in cases {
        assert_eq!(AwsErrorCode::from_code(raw), expected, "code {}", raw);
    }
}

#[test]
fn test_creation_failure_reason_mapping() {
    assert_eq!(
        AwsErrorCode::from_create_account_failure("ACCOUNT_LIMIT_EXCEEDED"),
        AwsErrorCode::AccountLimitExceeded
    );
    assert_eq!(
        AwsErrorCode::from_create_account_failure("EMAIL_ALREADY_EXISTS"),
        AwsErrorCode::EmailAlreadyExists
    );
    assert_eq!(
        AwsErrorCode::from_create_account_failure("INTERNAL_FAILURE"),
        AwsErrorCode::InternalFailure
    );
    assert_eq!(
        AwsErrorCode::from_create_account_failure("GOVCLOUD_MISMATCH"),
        AwsErrorCode::Other
    );
}

#[test]
fn test_transient_categories() {
    assert!(AwsErrorCode::TooManyRequests.is_transient());
    assert!(AwsErrorCode::InternalFailure.is_transient());
    assert!(AwsErrorCode::ConcurrentModification.is_transient());

    assert!(!AwsErrorCode::AccountLimitExceeded.is_transient());
    assert!(!AwsErrorCode::AuthorizationError.is_transient());
    assert!(!AwsErrorCode::AuthenticationError.is_transient());
    assert!(!AwsErrorCode::Other.is_transient());
}

#[test]
fn test_only_authentication_invalidates_credentials() {
    assert!(AwsErrorCode::AuthenticationError.invalidates_credentials());
    assert!(!AwsErrorCode::AuthorizationError.invalidates_credentials());
    assert!(!AwsErrorCode::TooManyRequests.invalidates_credentials());
}

#[test]
fn test_operator_error_carries_category() {
    let error = OperatorError::aws(AwsErrorCode::TooManyRequests, "slow down");
    assert_eq!(error.aws_code(), Some(AwsErrorCode::TooManyRequests));
    assert!(error.is_transient());

    let error = OperatorError::ValidationError("bad spec".to_string());
    assert_eq!(error.aws_code(), None);
    assert!(!error.is_transient());
}
