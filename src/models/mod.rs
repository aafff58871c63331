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


pub mod account;
pub mod account_claim;
pub mod account_pool;
pub mod condition;

pub use account::{Account, AccountSpec, AccountState, AccountStatus, LegalEntity};
pub use account_claim::{AccountClaim, AccountClaimSpec, AccountClaimStatus, ClaimState, SecretRef};
pub use account_pool::{AccountPool, AccountPoolSpec, AccountPoolStatus};
pub use condition::{Condition, ConditionStatus, ConditionType, UpdateConditionPolicy};
