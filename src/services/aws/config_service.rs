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


use aws_config::{BehaviorVersion, Region, SdkConfig};
use aws_credential_types::Credentials;

use crate::errors::OperatorError;
use crate::services::kubernetes::secrets_service::AwsCredentials;

pub struct AwsConfigService {}

impl AwsConfigService {
    pub fn new() -> Self {
        AwsConfigService {}
    }

    /// Assemble an SDK config from static credentials held in an operator
    /// secret, scoped to one region.
    pub async fn get_aws_config(
        &self,
        region: &str,
        credentials: &AwsCredentials,
    ) -> Result<SdkConfig, OperatorError> {
        let mut builder = Credentials::builder()
            .access_key_id(credentials.access_key_id.as_str())
            .secret_access_key(credentials.secret_access_key.as_str());
        if let Some(token) = credentials.session_token.as_ref() {
            builder = builder.session_token(token.as_str());
        }

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .credentials_provider(builder.build())
            .load()
            .await;

        Ok(config)
    }
}
