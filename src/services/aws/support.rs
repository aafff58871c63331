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


use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::client_factory::{AwsClientFactory, CredentialsScope};
use super::error::map_aws_err;
use crate::errors::OperatorError;

// Support-specific types
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCaseRequest {
    pub subject: String,
    pub communication_body: String,
    pub severity_code: String,
    pub category_code: String,
    pub service_code: String,
    pub issue_type: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseView {
    pub case_id: String,
    pub status: String,
}

// Facade over the Support API
pub struct SupportService {
    factory: Arc<dyn AwsClientFactory>,
}

impl SupportService {
    pub fn new(factory: Arc<dyn AwsClientFactory>) -> Self {
        Self { factory }
    }

    pub async fn create_case(
        &self,
        scope: &CredentialsScope,
        request: &CreateCaseRequest,
    ) -> Result<String, OperatorError> {
        let client = self.factory.create_support_client(scope).await?;

        let response = client
            .create_case()
            .subject(&request.subject)
            .communication_body(&request.communication_body)
            .severity_code(&request.severity_code)
            .category_code(&request.category_code)
            .service_code(&request.service_code)
            .issue_type(&request.issue_type)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to create support case", e))?;

        response
            .case_id()
            .map(|id| id.to_string())
            .ok_or_else(|| {
                OperatorError::InternalError("CreateCase response missing case id".to_string())
            })
    }

    pub async fn describe_case(
        &self,
        scope: &CredentialsScope,
        case_id: &str,
    ) -> Result<CaseView, OperatorError> {
        let client = self.factory.create_support_client(scope).await?;

        let response = client
            .describe_cases()
            .case_id_list(case_id)
            .include_resolved_cases(true)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to describe support case", e))?;

        response
            .cases()
            .first()
            .map(|c| CaseView {
                case_id: c.case_id().unwrap_or_default().to_string(),
                status: c.status().unwrap_or_default().to_string(),
            })
            .ok_or_else(|| OperatorError::NotFound(format!("support case {} not found", case_id)))
    }
}
