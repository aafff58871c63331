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


// Unit tests for the pool census and deficit arithmetic

use super::fixtures;
use crate::controllers::pool::{count_accounts, deficit, PoolCounts};

#[test]
fn test_census_buckets() {
    let accounts = vec![
        fixtures::account("fresh-1", "E1", false, false),
        fixtures::account("fresh-2", "E2", false, false),
        fixtures::account("claimed-1", "E1", true, false),
        fixtures::account("recycled-1", "E2", false, true),
        fixtures::creating_account("converging-1"),
    ];

    let counts = count_accounts(&accounts);
    assert_eq!(
        counts,
        PoolCounts {
            unclaimed: 2,
            claimed: 1,
            recycled: 1,
            total: 5,
        }
    );
}

#[test]
fn test_recycled_accounts_do_not_count_as_unclaimed() {
    // Recycled accounts serve reuse affinity only; the pool deficit is
    // computed over truly fresh accounts
    let accounts = vec![fixtures::account("recycled-1", "E1", false, true)];
    let counts = count_accounts(&accounts);
    assert_eq!(counts.unclaimed, 0);
    assert_eq!(deficit(2, counts.unclaimed), 2);
}

#[test]
fn test_deficit_saturates_at_zero() {
    assert_eq!(deficit(2, 5), 0);
    assert_eq!(deficit(2, 2), 0);
    assert_eq!(deficit(3, 1), 2);
}

#[test]
fn test_zero_pool_size_needs_nothing() {
    let accounts = vec![
        fixtures::account("fresh-1", "E1", false, false),
        fixtures::account("fresh-2", "E2", false, false),
    ];
    let counts = count_accounts(&accounts);
    assert_eq!(deficit(0, counts.unclaimed), 0);
}
