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


use clap::{Parser, Subcommand};
use kube::CustomResourceExt;
use std::error::Error;

use account_operator::models::{Account, AccountClaim, AccountPool};
use account_operator::{config, controllers, utils};

#[derive(Parser)]
#[command(name = "account-operator")]
#[command(about = "AWS account lifecycle operator for cluster-provisioning pools", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the reconciliation controllers
    Run,

    /// Print the CRD manifests for installation
    Crd,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run => {
            utils::logging::init_logger();
            let config = config::load_config()?;
            let client = kube::Client::try_default().await?;
            controllers::run(client, config).await?;
        }
        Commands::Crd => {
            println!("{}", serde_yaml::to_string(&Account::crd())?);
            println!("---");
            println!("{}", serde_yaml::to_string(&AccountClaim::crd())?);
            println!("---");
            println!("{}", serde_yaml::to_string(&AccountPool::crd())?);
        }
    }

    Ok(())
}
