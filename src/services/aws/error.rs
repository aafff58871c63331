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


use aws_smithy_runtime_api::client::result::SdkError;
use aws_smithy_types::error::display::DisplayErrorContext;
use aws_smithy_types::error::metadata::ProvideErrorMetadata;

use crate::errors::OperatorError;

/// Closed classification of AWS provider errors. Controllers branch on these
/// categories, never on raw error strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AwsErrorCode {
    AccountLimitExceeded,
    TooManyRequests,
    InternalFailure,
    AuthorizationError,
    AuthenticationError,
    DuplicateOrganizationalUnit,
    AccountNotFoundInParent,
    ConcurrentModification,
    ChildNotFoundInOu,
    SupportCaseLimitExceeded,
    MalformedPolicyDocument,
    EmailAlreadyExists,
    Other,
}

impl AwsErrorCode {
    /// Map a raw provider error code onto the closed category set.
    pub fn from_code(code: &str) -> Self {
        match code {
            "ConstraintViolationException" | "AccountLimitExceededException" => {
                AwsErrorCode::AccountLimitExceeded
            }
            "TooManyRequestsException"
            | "Throttling"
            | "ThrottlingException"
            | "RequestLimitExceeded"
            | "SlowDown" => AwsErrorCode::TooManyRequests,
            "InternalFailure"
            | "InternalError"
            | "InternalServiceError"
            | "ServiceException"
            | "ServiceFailure"
            | "ServiceUnavailable" => AwsErrorCode::InternalFailure,
            "AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation" => {
                AwsErrorCode::AuthorizationError
            }
            "InvalidClientTokenId"
            | "UnrecognizedClientException"
            | "AuthFailure"
            | "SignatureDoesNotMatch"
            | "ExpiredToken" => AwsErrorCode::AuthenticationError,
            "DuplicateOrganizationalUnitException" => AwsErrorCode::DuplicateOrganizationalUnit,
            "AccountNotFoundException" => AwsErrorCode::AccountNotFoundInParent,
            "ConcurrentModificationException" => AwsErrorCode::ConcurrentModification,
            "ChildNotFoundException" => AwsErrorCode::ChildNotFoundInOu,
            "CaseCreationLimitExceeded" => AwsErrorCode::SupportCaseLimitExceeded,
            "MalformedPolicyDocument" | "MalformedPolicyDocumentException" => {
                AwsErrorCode::MalformedPolicyDocument
            }
            "EmailAlreadyExistsException" => AwsErrorCode::EmailAlreadyExists,
            _ => AwsErrorCode::Other,
        }
    }

    /// Failure reasons reported by the Organizations account-creation status
    /// poll use a separate vocabulary from error codes.
    pub fn from_create_account_failure(reason: &str) -> Self {
        match reason {
            "ACCOUNT_LIMIT_EXCEEDED" => AwsErrorCode::AccountLimitExceeded,
            "EMAIL_ALREADY_EXISTS" => AwsErrorCode::EmailAlreadyExists,
            "INTERNAL_FAILURE" => AwsErrorCode::InternalFailure,
            _ => AwsErrorCode::Other,
        }
    }

    /// Retried with backoff and without record state mutation.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            AwsErrorCode::TooManyRequests
                | AwsErrorCode::InternalFailure
                | AwsErrorCode::ConcurrentModification
        )
    }

    /// Categories that must invalidate the cached credential client before
    /// the caller retries.
    pub fn invalidates_credentials(&self) -> bool {
        matches!(self, AwsErrorCode::AuthenticationError)
    }
}

/// Convert an SDK operation error into an `OperatorError` carrying the
/// classified category. `context` names the failed operation.
pub fn map_aws_err<E, R>(context: &str, err: SdkError<E, R>) -> OperatorError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug + Send + Sync + 'static,
{
    let code = err
        .code()
        .map(AwsErrorCode::from_code)
        .unwrap_or(AwsErrorCode::Other);
    let message = match err.message() {
        Some(m) => format!("{}: {}", context, m),
        None => format!("{}: {}", context, DisplayErrorContext(&err)),
    };
    OperatorError::AwsError { code, message }
}
