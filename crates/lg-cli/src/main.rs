//! lineagegraph CLI - SQL dependency lineage and change-impact analysis

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;
use commands::{column, common, explore, flow, graph, impact, serve};

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let cli = Cli::parse();

    let level = if cli.global.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();

    match run(&cli).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<common::ExitCode>() {
            Some(code) => std::process::ExitCode::from(code.0),
            None => {
                eprintln!("Error: {err:#}");
                std::process::ExitCode::FAILURE
            }
        },
    }
}

async fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        cli::Commands::Graph(args) => graph::execute(args, &cli.global).await,
        cli::Commands::Upstream(args) => {
            flow::execute(args, &cli.global, lg_core::Direction::Upstream).await
        }
        cli::Commands::Downstream(args) => {
            flow::execute(args, &cli.global, lg_core::Direction::Downstream).await
        }
        cli::Commands::Column(args) => column::execute(args, &cli.global).await,
        cli::Commands::Impact(args) => impact::execute(args, &cli.global).await,
        cli::Commands::Explore(args) => explore::execute(args, &cli.global).await,
        cli::Commands::Serve(args) => serve::execute(args, &cli.global).await,
    }
}
