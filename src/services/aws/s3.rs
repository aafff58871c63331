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


use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use std::sync::Arc;
use tracing::debug;

use super::client_factory::{AwsClientFactory, CredentialsScope};
use super::error::map_aws_err;
use crate::errors::OperatorError;

// Facade over the S3 API
pub struct S3Service {
    factory: Arc<dyn AwsClientFactory>,
}

impl S3Service {
    pub fn new(factory: Arc<dyn AwsClientFactory>) -> Self {
        Self { factory }
    }

    pub async fn list_buckets(
        &self,
        scope: &CredentialsScope,
    ) -> Result<Vec<String>, OperatorError> {
        let client = self.factory.create_s3_client(scope).await?;

        let response = client
            .list_buckets()
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to list buckets", e))?;

        Ok(response
            .buckets()
            .iter()
            .filter_map(|b| b.name())
            .map(|name| name.to_string())
            .collect())
    }

    /// Delete a bucket after purging its contents. Object listing follows
    /// pagination; deletes go out in batches of up to 1000 keys.
    pub async fn delete_bucket(
        &self,
        scope: &CredentialsScope,
        bucket: &str,
    ) -> Result<(), OperatorError> {
        let client = self.factory.create_s3_client(scope).await?;

        let mut continuation: Option<String> = None;
        loop {
            let mut request = client.list_objects_v2().bucket(bucket);
            if let Some(token) = continuation.as_ref() {
                request = request.continuation_token(token);
            }
            let response = request
                .send()
                .await
                .map_err(|e| map_aws_err("Failed to list bucket objects", e))?;

            let keys: Vec<String> = response
                .contents()
                .iter()
                .filter_map(|o| o.key())
                .map(|k| k.to_string())
                .collect();

            if !keys.is_empty() {
                debug!(bucket = %bucket, count = keys.len(), "Purging objects before bucket delete");
                let mut delete = Delete::builder();
                for key in &keys {
                    delete = delete.objects(
                        ObjectIdentifier::builder()
                            .key(key)
                            .build()
                            .map_err(|e| {
                                OperatorError::InternalError(format!("Invalid object key: {}", e))
                            })?,
                    );
                }
                client
                    .delete_objects()
                    .bucket(bucket)
                    .delete(delete.build().map_err(|e| {
                        OperatorError::InternalError(format!("Invalid delete request: {}", e))
                    })?)
                    .send()
                    .await
                    .map_err(|e| map_aws_err("Failed to delete bucket objects", e))?;
            }

            if response.is_truncated() == Some(true) {
                continuation = response.next_continuation_token().map(|t| t.to_string());
            } else {
                break;
            }
        }

        client
            .delete_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| map_aws_err("Failed to delete bucket", e))?;

        Ok(())
    }
}
