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


// Unit tests for operator configmap parsing

use std::collections::BTreeMap;

use crate::services::kubernetes::configmaps_service::OperatorConfigView;

fn data(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
    entries
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_ou_ids_and_limit() {
    let view = OperatorConfigView::from_data(&data(&[
        ("base", "ou-base-1234"),
        ("root", "ou-root-5678"),
        ("account-limit", "120"),
    ]));

    assert_eq!(view.base_ou, "ou-base-1234");
    assert_eq!(view.root_ou, "ou-root-5678");
    assert_eq!(view.account_limit, Some(120));
}

#[test]
fn test_missing_limit_means_unbounded() {
    let view = OperatorConfigView::from_data(&data(&[("base", "ou-base")]));
    assert_eq!(view.account_limit, None);

    // Garbage is ignored rather than treated as zero
    let view = OperatorConfigView::from_data(&data(&[("account-limit", "plenty")]));
    assert_eq!(view.account_limit, None);
}

#[test]
fn test_per_controller_concurrency() {
    let view = OperatorConfigView::from_data(&data(&[
        ("MaxConcurrentReconciles.account", "5"),
        ("MaxConcurrentReconciles.accountclaim", "3"),
    ]));

    assert_eq!(view.max_concurrent_reconciles("account"), 5);
    assert_eq!(view.max_concurrent_reconciles("accountclaim"), 3);
    // Default worker count is one
    assert_eq!(view.max_concurrent_reconciles("accountpool"), 1);
}

#[test]
fn test_feature_flags() {
    let view = OperatorConfigView::from_data(&data(&[
        ("feature.byoc", "true"),
        ("feature.fedramp", "false"),
    ]));

    assert!(view.feature_enabled("byoc"));
    assert!(!view.feature_enabled("fedramp"));
    assert!(!view.feature_enabled("unknown"));
}

#[test]
fn test_managed_tags_json() {
    let view = OperatorConfigView::from_data(&data(&[
        (
            "aws-managed-tags",
            r#"[{"key":"owner","value":"sre"},{"key":"tier","value":"pool"}]"#,
        ),
        ("sre-access-shard-name", "shard-7"),
    ]));

    assert_eq!(
        view.managed_tags,
        vec![
            ("owner".to_string(), "sre".to_string()),
            ("tier".to_string(), "pool".to_string()),
        ]
    );
    assert_eq!(view.shard_name, "shard-7");
}

#[test]
fn test_malformed_tag_list_ignored() {
    let view = OperatorConfigView::from_data(&data(&[("aws-managed-tags", "not json")]));
    assert!(view.managed_tags.is_empty());
}
