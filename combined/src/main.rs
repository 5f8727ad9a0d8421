//! Staff Admin - command line entry point
//!
//! Dispatches each subcommand against the SQL-backed document store and the
//! local identity provider.

mod cli;
mod commands;

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use common::AppConfig;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    if let Some(url) = cli.database_url {
        config.store.database_url = url;
    }
    tracing::debug!(?config, "Configuration loaded");

    // Ctrl+C cancels the in-flight operation
    let cancel = CancellationToken::new();
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling...");
            on_signal.cancel();
        }
    });

    let result = match cli.command {
        Commands::Migrate(args) => commands::migrate::execute(args, config).await,
        Commands::Signup(args) => commands::account::signup(args, config, &cancel).await,
        Commands::Verify(args) => commands::account::verify(args, config).await,
        Commands::BootstrapAdmin(args) => {
            commands::account::bootstrap_admin(args, config, &cancel).await
        }
        Commands::Staff(args) => commands::staff::execute(args, config, &cancel).await,
        Commands::Catalog(args) => commands::catalog::execute(args, config, &cancel).await,
        Commands::Geo(args) => commands::geo::execute(args, config, &cancel).await,
    };

    if let Err(e) = result {
        let error = e.to_object();
        tracing::error!(code = %error.code, severity = ?error.severity, "{}: {}", error.name, error.message);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        "debug".to_string()
    } else {
        std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string())
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::new(filter))
        .init();
}
