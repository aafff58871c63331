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


// Unit tests for the condition-list update semantics

use chrono::{Duration, Utc};

use crate::models::condition::{
    current_condition, find_condition, set_condition, Condition, ConditionStatus, ConditionType,
    UpdateConditionPolicy,
};

#[test]
fn test_set_condition_appends_only_when_true() {
    let now = Utc::now();
    let mut conditions: Vec<Condition> = Vec::new();

    // A False status on a missing type must not create an entry
    set_condition(
        &mut conditions,
        ConditionType::AccountReady,
        ConditionStatus::False,
        "NotReady",
        "still creating",
        UpdateConditionPolicy::Always,
        now,
    );
    assert!(conditions.is_empty());

    set_condition(
        &mut conditions,
        ConditionType::AccountReady,
        ConditionStatus::True,
        "Ready",
        "account ready",
        UpdateConditionPolicy::Always,
        now,
    );
    assert_eq!(conditions.len(), 1);
    assert_eq!(conditions[0].last_probe_time, now);
    assert_eq!(conditions[0].last_transition_time, now);
}

#[test]
fn test_set_condition_unique_per_type() {
    let now = Utc::now();
    let mut conditions: Vec<Condition> = Vec::new();

    for _ in 0..3 {
        set_condition(
            &mut conditions,
            ConditionType::AccountCreating,
            ConditionStatus::True,
            "Creating",
            "requested",
            UpdateConditionPolicy::Always,
            now,
        );
    }

    assert_eq!(conditions.len(), 1);
    assert!(find_condition(&conditions, ConditionType::AccountCreating).is_some());
}

#[test]
fn test_never_policy_without_status_change_is_identity() {
    let created = Utc::now();
    let mut conditions: Vec<Condition> = Vec::new();
    set_condition(
        &mut conditions,
        ConditionType::AccountClaimed,
        ConditionStatus::True,
        "Claimed",
        "claimed by c1",
        UpdateConditionPolicy::Always,
        created,
    );
    let before = conditions.clone();

    set_condition(
        &mut conditions,
        ConditionType::AccountClaimed,
        ConditionStatus::True,
        "Claimed",
        "claimed by someone else entirely",
        UpdateConditionPolicy::Never,
        created + Duration::seconds(90),
    );

    assert_eq!(conditions, before);
}

#[test]
fn test_status_flip_refreshes_transition_time() {
    let created = Utc::now();
    let later = created + Duration::seconds(120);
    let mut conditions: Vec<Condition> = Vec::new();
    set_condition(
        &mut conditions,
        ConditionType::AccountUnclaimed,
        ConditionStatus::True,
        "Unclaimed",
        "in pool",
        UpdateConditionPolicy::Always,
        created,
    );

    // A flip refreshes the transition time even under the Never policy
    set_condition(
        &mut conditions,
        ConditionType::AccountUnclaimed,
        ConditionStatus::False,
        "Claimed",
        "left the pool",
        UpdateConditionPolicy::Never,
        later,
    );

    let entry = find_condition(&conditions, ConditionType::AccountUnclaimed).unwrap();
    assert_eq!(entry.status, ConditionStatus::False);
    assert_eq!(entry.last_transition_time, later);
    assert_eq!(entry.reason, "Claimed");
    assert_eq!(entry.last_probe_time, later);
}

#[test]
fn test_reason_change_policy() {
    let created = Utc::now();
    let later = created + Duration::seconds(30);
    let mut conditions: Vec<Condition> = Vec::new();
    set_condition(
        &mut conditions,
        ConditionType::QuotaIncreaseRequested,
        ConditionStatus::True,
        "CaseOpened",
        "case 100",
        UpdateConditionPolicy::Always,
        created,
    );

    // Same reason and message: nothing moves
    set_condition(
        &mut conditions,
        ConditionType::QuotaIncreaseRequested,
        ConditionStatus::True,
        "CaseOpened",
        "case 100",
        UpdateConditionPolicy::IfReasonOrMessageChange,
        later,
    );
    let entry = find_condition(&conditions, ConditionType::QuotaIncreaseRequested).unwrap();
    assert_eq!(entry.last_probe_time, created);

    // A different message refreshes the probe time
    set_condition(
        &mut conditions,
        ConditionType::QuotaIncreaseRequested,
        ConditionStatus::True,
        "CaseOpened",
        "case 200",
        UpdateConditionPolicy::IfReasonOrMessageChange,
        later,
    );
    let entry = find_condition(&conditions, ConditionType::QuotaIncreaseRequested).unwrap();
    assert_eq!(entry.last_probe_time, later);
    assert_eq!(entry.message, "case 200");
    // No status flip, so the transition time is untouched
    assert_eq!(entry.last_transition_time, created);
}

#[test]
fn test_current_condition_is_most_recent_transition() {
    let t0 = Utc::now();
    let t1 = t0 + Duration::seconds(60);
    let mut conditions: Vec<Condition> = Vec::new();
    set_condition(
        &mut conditions,
        ConditionType::AccountCreating,
        ConditionStatus::True,
        "Creating",
        "",
        UpdateConditionPolicy::Always,
        t0,
    );
    set_condition(
        &mut conditions,
        ConditionType::AccountReady,
        ConditionStatus::True,
        "Ready",
        "",
        UpdateConditionPolicy::Always,
        t1,
    );

    let current = current_condition(&conditions).unwrap();
    assert_eq!(current.condition_type, ConditionType::AccountReady);
}
