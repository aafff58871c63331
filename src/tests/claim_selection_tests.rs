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


// Unit tests for account selection during claim binding

use super::fixtures;
use crate::controllers::claim::select_account;
use kube::ResourceExt;

#[test]
fn test_reuse_affinity_wins_over_fresh_account() {
    // A recycled account of the claim's legal entity beats a fresh one
    let accounts = vec![
        fixtures::account("a2", "E2", false, false),
        fixtures::account("a1", "E1", false, true),
    ];

    let chosen = select_account(&accounts, "E1").unwrap();
    assert_eq!(chosen.name_any(), "a1");
}

#[test]
fn test_recycled_account_of_other_entity_is_skipped() {
    let accounts = vec![
        fixtures::account("a1", "E1", false, true),
        fixtures::account("a2", "E2", false, false),
    ];

    let chosen = select_account(&accounts, "E3").unwrap();
    assert_eq!(chosen.name_any(), "a2");
}

#[test]
fn test_claimed_accounts_never_qualify() {
    let accounts = vec![
        fixtures::account("a1", "E1", true, false),
        fixtures::account("a2", "E1", true, true),
    ];

    assert!(select_account(&accounts, "E1").is_none());
}

#[test]
fn test_account_with_pending_claim_link_is_skipped() {
    // claim_link is written before the claimed bit; a linked account is
    // spoken for even when its status has not caught up
    let mut racing = fixtures::account("a1", "E1", false, false);
    racing.spec.claim_link = "other-claim".to_string();
    let accounts = vec![racing, fixtures::account("a2", "E1", false, false)];

    let chosen = select_account(&accounts, "E1").unwrap();
    assert_eq!(chosen.name_any(), "a2");
}

#[test]
fn test_converging_accounts_are_not_selectable() {
    let accounts = vec![fixtures::creating_account("a1")];
    assert!(select_account(&accounts, "E1").is_none());
}

#[test]
fn test_empty_pool_selects_nothing() {
    assert!(select_account(&[], "E1").is_none());
}
