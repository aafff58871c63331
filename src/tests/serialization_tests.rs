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


// Unit tests for the record wire shape consumed by platform tooling

use chrono::Utc;

use super::fixtures;
use crate::models::condition::{
    set_condition, Condition, ConditionStatus, ConditionType, UpdateConditionPolicy,
};
use crate::models::{AccountSpec, AccountState, AccountStatus};

#[test]
fn test_account_spec_serializes_camel_case() {
    let spec = AccountSpec {
        aws_account_id: "123456789012".to_string(),
        iam_user_secret: "acct-osdmanagedadmin-secret".to_string(),
        claim_link: "my-claim".to_string(),
        ..AccountSpec::default()
    };

    let value = serde_json::to_value(&spec).unwrap();
    assert_eq!(value["awsAccountId"], "123456789012");
    assert_eq!(value["iamUserSecret"], "acct-osdmanagedadmin-secret");
    assert_eq!(value["claimLink"], "my-claim");
    assert_eq!(value["byoc"], false);
}

#[test]
fn test_conditions_serialize_as_list_keyed_by_type() {
    let now = Utc::now();
    let mut conditions: Vec<Condition> = Vec::new();
    set_condition(
        &mut conditions,
        ConditionType::AccountCreating,
        ConditionStatus::True,
        "Creating",
        "requested",
        UpdateConditionPolicy::Always,
        now,
    );
    set_condition(
        &mut conditions,
        ConditionType::AccountReady,
        ConditionStatus::True,
        "Ready",
        "",
        UpdateConditionPolicy::Always,
        now,
    );

    let status = AccountStatus {
        state: Some(AccountState::Ready),
        conditions,
        ..AccountStatus::default()
    };

    let value = serde_json::to_value(&status).unwrap();
    assert_eq!(value["state"], "Ready");
    let list = value["conditions"].as_array().unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0]["type"], "AccountCreating");
    assert_eq!(list[0]["status"], "True");
    assert_eq!(list[1]["type"], "AccountReady");
    // Empty reason and message stay off the wire
    assert!(list[1].get("message").is_none());
}

#[test]
fn test_status_round_trips() {
    let mut account = fixtures::account("a1", "E1", false, true);
    let mut status = account.status.take().unwrap();
    set_condition(
        &mut status.conditions,
        ConditionType::AccountReused,
        ConditionStatus::True,
        "Reused",
        "back in pool",
        UpdateConditionPolicy::Always,
        Utc::now(),
    );

    let encoded = serde_json::to_string(&status).unwrap();
    let decoded: AccountStatus = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded.state, Some(AccountState::Ready));
    assert!(decoded.reused);
    assert_eq!(decoded.conditions, status.conditions);
}
