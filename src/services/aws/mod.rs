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


pub mod client_factory;
pub mod config_service;
pub mod ec2;
pub mod error;
pub mod iam;
pub mod organizations;
pub mod s3;
pub mod sts;
pub mod support;

use std::sync::Arc;

use client_factory::{AwsClientFactory, CredentialsScope, DefaultAwsClientFactory};
use ec2::Ec2Service;
use iam::IamService;
use organizations::OrganizationsService;
use s3::S3Service;
use sts::StsService;
use support::SupportService;

use crate::services::kubernetes::secrets_service::SecretsService;

/// Typed facade over the provider API. Sub-services share one client factory
/// so cache invalidation is visible to every call path.
pub struct AwsGateway {
    factory: Arc<dyn AwsClientFactory>,
    pub organizations: OrganizationsService,
    pub iam: IamService,
    pub sts: StsService,
    pub ec2: Ec2Service,
    pub s3: S3Service,
    pub support: SupportService,
}

impl AwsGateway {
    pub fn new(secrets: Arc<SecretsService>) -> Self {
        let factory: Arc<dyn AwsClientFactory> =
            Arc::new(DefaultAwsClientFactory::new(secrets));
        Self::with_factory(factory)
    }

    /// Wire the gateway over an explicit factory; tests substitute their own.
    pub fn with_factory(factory: Arc<dyn AwsClientFactory>) -> Self {
        Self {
            organizations: OrganizationsService::new(factory.clone()),
            iam: IamService::new(factory.clone()),
            sts: StsService::new(factory.clone()),
            ec2: Ec2Service::new(factory.clone()),
            s3: S3Service::new(factory.clone()),
            support: SupportService::new(factory.clone()),
            factory,
        }
    }

    /// Drop the cached credentials for `scope`; the next call re-reads the
    /// backing secret.
    pub fn invalidate_credentials(&self, scope: &CredentialsScope) {
        self.factory.invalidate(scope);
    }
}
