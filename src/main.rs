use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use megaverse::{
    api::{MegaverseApi, MegaverseClient},
    config::Config,
    logic::service::{BuildMode, MegaverseService},
};

/// Builds and checks a megaverse grid against its goal.
#[derive(Debug, Parser)]
#[command(name = "megaverse", version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Print the current and goal maps.
    Show,
    /// Place every object of the goal map.
    Build {
        /// Send all placements at once instead of in dependency order.
        #[arg(long)]
        concurrent: bool,
    },
    /// Compare the current map with the goal; fails when they differ.
    Validate,
    /// Remove every object from the current map.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = Config::from_env().context("loading configuration")?;
    let base_url = config.base_url.clone();
    let api = Arc::new(MegaverseClient::new(config).context("creating http client")?);
    log::info!(
        "megaverse client for candidate {} at {base_url}",
        api.candidate_id()
    );
    let service = MegaverseService::new(Arc::clone(&api));

    match cli.command.unwrap_or(Command::Show) {
        Command::Show => {
            let current = api.current_map().await.context("fetching current map")?;
            let goal = api.goal_map().await.context("fetching goal map")?;
            println!("Current megaverse map:");
            println!("{}", serde_json::to_string_pretty(&current)?);
            println!();
            println!("Goal megaverse map:");
            println!("{}", serde_json::to_string_pretty(&goal)?);
        }
        Command::Build { concurrent } => {
            let mode = if concurrent {
                BuildMode::Concurrent
            } else {
                BuildMode::DependencyOrder
            };
            let report = service
                .build_from_goal(mode)
                .await
                .context("building megaverse from goal")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Validate => {
            let report = service.validate().await.context("validating megaverse")?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.matches {
                bail!(
                    "current map does not match the goal ({} mismatching cell(s))",
                    report.mismatch_count
                );
            }
        }
        Command::Clear => {
            let summary = service.clear().await.context("clearing megaverse")?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
    }
    Ok(())
}
