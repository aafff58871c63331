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


use crate::models::{Account, AccountSpec, AccountState, AccountStatus, LegalEntity};

/// A ready pool account in the requested claim/reuse configuration.
pub fn account(name: &str, legal_entity_id: &str, claimed: bool, reused: bool) -> Account {
    let mut account = Account::new(
        name,
        AccountSpec {
            aws_account_id: format!("{:012}", name.len()),
            legal_entity: LegalEntity {
                name: legal_entity_id.to_uppercase(),
                id: legal_entity_id.to_string(),
            },
            ..AccountSpec::default()
        },
    );
    account.status = Some(AccountStatus {
        state: Some(AccountState::Ready),
        claimed,
        reused,
        ..AccountStatus::default()
    });
    if claimed {
        account.spec.claim_link = format!("{}-claim", name);
    }
    account
}

/// An account still converging through creation.
pub fn creating_account(name: &str) -> Account {
    let mut account = Account::new(name, AccountSpec::default());
    account.status = Some(AccountStatus {
        state: Some(AccountState::Creating),
        ..AccountStatus::default()
    });
    account
}
