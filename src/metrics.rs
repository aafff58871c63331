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


use lazy_static::lazy_static;
use prometheus::{
    register_histogram_vec, register_int_counter_vec, HistogramVec, IntCounterVec,
};

lazy_static! {
    pub static ref RECONCILE_TOTAL: IntCounterVec = register_int_counter_vec!(
        "account_operator_reconcile_total",
        "Reconcile passes per controller and outcome",
        &["controller", "outcome"]
    )
    .unwrap();
    pub static ref ACCOUNT_READY_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "account_operator_account_ready_duration_seconds",
        "Time from account creation to readiness",
        &["byoc"],
        vec![60.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0, 7200.0]
    )
    .unwrap();
    pub static ref ACCOUNT_CLAIM_DURATION_SECONDS: HistogramVec = register_histogram_vec!(
        "account_operator_account_claim_duration_seconds",
        "Time an account spent unclaimed before being claimed",
        &["reused"],
        vec![1.0, 5.0, 30.0, 60.0, 300.0, 1800.0, 3600.0, 86400.0]
    )
    .unwrap();
}

pub fn observe_reconcile(controller: &str, outcome: &str) {
    RECONCILE_TOTAL.with_label_values(&[controller, outcome]).inc();
}

pub fn observe_account_ready(byoc: bool, seconds: f64) {
    ACCOUNT_READY_DURATION_SECONDS
        .with_label_values(&[if byoc { "true" } else { "false" }])
        .observe(seconds);
}

pub fn observe_account_claimed(reused: bool, seconds: f64) {
    ACCOUNT_CLAIM_DURATION_SECONDS
        .with_label_values(&[if reused { "true" } else { "false" }])
        .observe(seconds);
}
