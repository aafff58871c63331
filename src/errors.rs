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


use thiserror::Error;

use crate::services::aws::error::AwsErrorCode;

#[derive(Debug, Error)]
pub enum OperatorError {
    #[error("Kubernetes API error: {0}")]
    KubeError(#[from] kube::Error),

    #[error("AWS {code:?}: {message}")]
    AwsError { code: AwsErrorCode, message: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Secret error: {0}")]
    SecretError(String),

    #[error("JSON serialization/deserialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl OperatorError {
    pub fn aws(code: AwsErrorCode, message: impl Into<String>) -> Self {
        OperatorError::AwsError {
            code,
            message: message.into(),
        }
    }

    /// AWS error category carried by this error, if any.
    pub fn aws_code(&self) -> Option<AwsErrorCode> {
        match self {
            OperatorError::AwsError { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Errors that should be retried with backoff and must not mutate
    /// record state.
    pub fn is_transient(&self) -> bool {
        match self {
            OperatorError::AwsError { code, .. } => code.is_transient(),
            // Optimistic-concurrency conflicts resolve on the next pass.
            OperatorError::KubeError(kube::Error::Api(e)) => e.code == 409,
            _ => false,
        }
    }

    /// True when the record-store write lost an optimistic-concurrency race.
    pub fn is_conflict(&self) -> bool {
        matches!(self, OperatorError::KubeError(kube::Error::Api(e)) if e.code == 409)
    }
}

impl From<serde_yaml::Error> for OperatorError {
    fn from(err: serde_yaml::Error) -> OperatorError {
        OperatorError::InternalError(format!("YAML serialization error: {}", err))
    }
}
