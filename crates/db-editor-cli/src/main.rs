use clap::Parser;
use tracing_subscriber::EnvFilter;

mod args;
mod commands;
mod connect;
mod jsonschema;
mod rendergraph;

use args::{Cli, Command};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .init();

    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let result = match &cli.command {
        Command::Dump(args) => commands::dump::run(args).await,
        Command::Preview(args) => commands::preview::run(args).await,
        Command::Sync(args) => commands::sync::run(args).await,
        Command::Reset(args) => commands::reset::run(args).await,
        Command::Check(args) => commands::check::run(args).await,
        Command::Graph(args) => commands::graph::run(args).await,
        Command::Introspect(args) => commands::introspect::run(args).await,
    };

    if let Err(err) = result {
        eprintln!("Error: {:#}", err);
        std::process::exit(1);
    }
}
