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


use config::{Config as ConfigFile, Environment, File};
use serde::{Deserialize, Serialize};
use std::env;
use std::error::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub operator: OperatorConfig,
    pub aws: AwsConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            operator: OperatorConfig::default(),
            aws: AwsConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperatorConfig {
    /// Namespace the operator, its Account records and credential secrets live in.
    pub namespace: String,
    /// Name of the configmap carrying cluster-side settings.
    pub configmap_name: String,
    /// Name of the configmap mapping region name to warm-up AMI id.
    pub region_ami_configmap_name: String,
}

impl Default for OperatorConfig {
    fn default() -> Self {
        Self {
            namespace: "account-operator".to_string(),
            configmap_name: "account-operator-config".to_string(),
            region_ami_configmap_name: "aws-region-ami".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwsConfig {
    /// Region org-level and IAM calls are issued against.
    pub default_region: String,
    /// Operator-namespace secret holding the payer-account credentials.
    pub operator_credentials_secret: String,
    /// Role assumed inside member accounts for IAM bootstrap.
    pub org_access_role: String,
    /// Prefix for the e-mail addresses of newly created accounts.
    pub account_email_prefix: String,
    /// Domain appended to derived account e-mail addresses.
    pub account_email_domain: String,
    /// Instance type launched during region warm-up.
    pub warmup_instance_type: String,
    /// Deadline for a single region warm-up, in seconds.
    pub warmup_deadline_seconds: u64,
    /// Parallel warm-up workers within one account reconcile.
    pub warmup_workers: usize,
    /// Lifetime of minted STS session credentials before they are considered stale.
    pub sts_credential_ttl_minutes: i64,
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            default_region: "us-east-1".to_string(),
            operator_credentials_secret: "aws-account-operator-credentials".to_string(),
            org_access_role: "OrganizationAccountAccessRole".to_string(),
            account_email_prefix: "osd-creds-mgmt".to_string(),
            account_email_domain: "redhat.com".to_string(),
            warmup_instance_type: "t2.micro".to_string(),
            warmup_deadline_seconds: 300,
            warmup_workers: 4,
            sts_credential_ttl_minutes: 30,
        }
    }
}

pub fn load_config() -> Result<Config, Box<dyn Error>> {
    let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config".to_string());

    let config = ConfigFile::builder()
        // Start with default settings
        .add_source(File::with_name(&format!("{}.default", config_path)).required(false))
        // Add config file settings
        .add_source(File::with_name(&config_path).required(false))
        // Add environment variables (with prefix ACCOUNT_OPERATOR_)
        .add_source(Environment::with_prefix("ACCOUNT_OPERATOR").separator("__"))
        .build()?;

    let config: Config = match config.try_deserialize() {
        Ok(c) => c,
        Err(_) => Config::default(),
    };

    Ok(config)
}
