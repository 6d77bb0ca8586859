//! Smart Librarian CLI and REST API entry point.
//!
//! Binary name: `librarian`
//!
//! Parses CLI arguments, loads configuration, wires services, then
//! dispatches to the command handler or starts the REST API server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use librarian_infra::config::{load_config, resolve_data_dir};

use cli::{Cli, Commands};
use state::{AppState, LibraryState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Shell completions need neither logging nor app state.
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "librarian", &mut std::io::stdout());
        return Ok(());
    }

    librarian_observe::init_tracing(cli.log_filter(), cli.otel)
        .map_err(|e| anyhow::anyhow!("cannot initialize tracing: {e}"))?;

    let result = run(cli).await;
    if let Err(e) = &result {
        tracing::error!(error = %e, "command failed");
    }
    librarian_observe::shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let Cli { json, command, .. } = cli;

    let data_dir = resolve_data_dir();
    let mut config = load_config(&data_dir).await;
    tracing::debug!(data_dir = %data_dir.display(), "configuration loaded");

    match command {
        Commands::Serve {
            host,
            port,
            no_reconcile,
        } => {
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            let library = LibraryState::init(config, data_dir).await?;
            let state = AppState::init(library).await?;
            cli::serve::serve(state, no_reconcile, json).await?;
        }

        Commands::Ingest { catalog, rebuild } => {
            if let Some(path) = catalog {
                config.catalog.path = path.display().to_string();
            }
            let library = LibraryState::init(config, data_dir).await?;
            cli::ingest::ingest(&library, rebuild, json).await?;
        }

        Commands::Ask {
            user,
            stream,
            message,
        } => {
            let library = LibraryState::init(config, data_dir).await?;
            let state = AppState::init(library).await?;
            cli::ask::ask(&state, &user, message.join(" "), stream, json).await?;
        }

        Commands::Books => {
            let library = LibraryState::init(config, data_dir).await?;
            cli::books::list_books(&library, json).await?;
        }

        Commands::Completions { .. } => unreachable!("handled before tracing setup"),
    }

    Ok(())
}
