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


use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition types surfaced on Account and AccountClaim records. A condition
/// list holds at most one entry per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionType {
    // Account lifecycle
    AccountCreating,
    AccountPendingVerification,
    AccountInitializingRegions,
    AccountReady,
    AccountFailed,
    AccountCreationFailed,
    AccountClaimed,
    AccountUnclaimed,
    AccountReused,
    AccountIsSts,
    // Claim lifecycle
    Unclaimed,
    Claimed,
    InvalidAccountClaim,
    CcsAccountClaimFailed,
    InternalError,
    QuotaIncreaseRequested,
    UnhandledError,
    AuthorizationError,
    AuthenticationError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

/// How an existing condition entry reacts to a same-status update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateConditionPolicy {
    Always,
    Never,
    IfReasonOrMessageChange,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    #[serde(rename = "type")]
    pub condition_type: ConditionType,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub message: String,
    pub last_probe_time: DateTime<Utc>,
    pub last_transition_time: DateTime<Utc>,
}

/// Find the entry for `condition_type`. Uniqueness per type is an invariant
/// maintained by `set_condition`.
pub fn find_condition(
    conditions: &[Condition],
    condition_type: ConditionType,
) -> Option<&Condition> {
    conditions.iter().find(|c| c.condition_type == condition_type)
}

/// Upsert a condition entry.
///
/// A missing entry is appended only when `status` is `True`. For an existing
/// entry the transition time refreshes whenever `status` flips; reason,
/// message and probe time refresh according to `policy` (a status flip always
/// counts as a change).
pub fn set_condition(
    conditions: &mut Vec<Condition>,
    condition_type: ConditionType,
    status: ConditionStatus,
    reason: &str,
    message: &str,
    policy: UpdateConditionPolicy,
    now: DateTime<Utc>,
) {
    match conditions.iter_mut().find(|c| c.condition_type == condition_type) {
        None => {
            if status == ConditionStatus::True {
                conditions.push(Condition {
                    condition_type,
                    status,
                    reason: reason.to_string(),
                    message: message.to_string(),
                    last_probe_time: now,
                    last_transition_time: now,
                });
            }
        }
        Some(existing) => {
            let status_changed = existing.status != status;
            let refresh = status_changed
                || match policy {
                    UpdateConditionPolicy::Always => true,
                    UpdateConditionPolicy::Never => false,
                    UpdateConditionPolicy::IfReasonOrMessageChange => {
                        existing.reason != reason || existing.message != message
                    }
                };

            if status_changed {
                existing.status = status;
                existing.last_transition_time = now;
            }
            if refresh {
                existing.reason = reason.to_string();
                existing.message = message.to_string();
                existing.last_probe_time = now;
            }
        }
    }
}

/// Most recent condition by transition time, the entry surfaced to users
/// alongside the coarse state field.
pub fn current_condition(conditions: &[Condition]) -> Option<&Condition> {
    conditions.iter().max_by_key(|c| c.last_transition_time)
}
