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


// Unit tests for the error-category requeue policy

use std::time::Duration;

use crate::controllers::requeue_after;
use crate::errors::OperatorError;
use crate::services::aws::error::AwsErrorCode;

#[test]
fn test_concurrent_modification_requeues_immediately() {
    let error = OperatorError::aws(AwsErrorCode::ConcurrentModification, "racing move");
    assert_eq!(requeue_after(&error), Duration::from_secs(1));
}

#[test]
fn test_throttling_backs_off_briefly() {
    let error = OperatorError::aws(AwsErrorCode::TooManyRequests, "slow down");
    assert_eq!(requeue_after(&error), Duration::from_secs(30));

    let error = OperatorError::aws(AwsErrorCode::InternalFailure, "oops");
    assert_eq!(requeue_after(&error), Duration::from_secs(30));
}

#[test]
fn test_quota_categories_wait_longer() {
    let error = OperatorError::aws(AwsErrorCode::AccountLimitExceeded, "limit");
    assert_eq!(requeue_after(&error), Duration::from_secs(300));

    let error = OperatorError::aws(AwsErrorCode::SupportCaseLimitExceeded, "case limit");
    assert_eq!(requeue_after(&error), Duration::from_secs(300));
}

#[test]
fn test_missing_pool_account_polls_the_pool() {
    let error = OperatorError::NotFound("no ready unclaimed account available".to_string());
    assert_eq!(requeue_after(&error), Duration::from_secs(30));
}
