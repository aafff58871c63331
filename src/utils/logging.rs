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


use std::env;
use std::sync::OnceLock;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// The worker guard must outlive the process or the background flusher stops.
static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Install the global subscriber: console output plus a daily-rolled file
/// under `ACCOUNT_OPERATOR_LOG_DIR`.
///
/// `RUST_LOG` takes precedence when set; otherwise the crate logs at
/// `ACCOUNT_OPERATOR_LOG_LEVEL` (debug in debug builds, info in release)
/// with kube and tower capped so watch chatter stays out of the file.
pub fn init_logger() {
    let level = env::var("ACCOUNT_OPERATOR_LOG_LEVEL").unwrap_or_else(|_| {
        if cfg!(debug_assertions) {
            "debug".to_string()
        } else {
            "info".to_string()
        }
    });
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("account_operator={},kube=info,tower=warn", level))
    });

    let log_dir = env::var("ACCOUNT_OPERATOR_LOG_DIR").unwrap_or_else(|_| "logs".to_string());
    let appender = RollingFileAppender::new(Rotation::DAILY, log_dir, "account-operator.log");
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stdout))
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(file_writer),
        )
        .with(filter)
        .init();

    let _ = LOG_GUARD.set(guard);
}
