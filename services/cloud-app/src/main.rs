//! GPV cloud animation service.
//!
//! Fetches the freshest MSM surface forecast file from the archive, renders
//! looping cloud-cover GIFs for central Honshu, and serves them with a
//! small status API. Also exposes one-shot subcommands for operations.

mod config;
mod server;
mod status;
mod update;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use config::AppConfig;
use server::AppState;
use status::StatusHandle;
use update::Updater;

#[derive(Parser, Debug)]
#[command(name = "cloud-app")]
#[command(about = "GPV cloud animation fetcher, renderer and web server")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(long, env = "CONFIG_PATH", default_value = "config/config.yaml")]
    config: PathBuf,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the web server with hourly scheduled updates (default)
    Serve,

    /// Run one fetch-and-render cycle and exit
    Update,

    /// Fetch one specific forecast cycle and exit
    Fetch {
        /// Cycle date as YYYYMMDD
        #[arg(long)]
        date: String,

        /// Cycle hour (UTC), e.g. 0, 3, 6
        #[arg(long)]
        hour: u32,
    },

    /// Remove stale cached dataset files and exit
    Cleanup {
        /// Also remove the newest file
        #[arg(long)]
        all: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = AppConfig::load(&args.config)?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Update => {
            let status = StatusHandle::new();
            Updater::new(config).run(&status).await
        }
        Command::Fetch { date, hour } => {
            let report = gpv_fetch::fetch_specific(&config.fetch, &date, hour).await;
            info!(success = report.success, message = %report.message, "Manual fetch finished");
            if report.success {
                Ok(())
            } else {
                anyhow::bail!(report.message)
            }
        }
        Command::Cleanup { all } => {
            let (deleted, freed) =
                gpv_fetch::cleanup_old_files(&config.fetch.raw_data_dir, !all);
            info!(
                deleted,
                freed = %gpv_fetch::format_size_mb(freed),
                "Cleanup finished"
            );
            Ok(())
        }
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    info!("Starting GPV cloud animation service");

    let status = StatusHandle::new();
    let updater = Arc::new(Updater::new(config.clone()));

    let state = Arc::new(AppState {
        status: status.clone(),
        output_dir: config.render.output_dir.clone(),
    });

    let (shutdown_tx, _) = broadcast::channel::<()>(1);

    // Bring the gallery up to date on boot if it has never been rendered.
    let first_gif = config
        .render
        .output_dir
        .join(cloud_render::Variant::AllLayers.gif_filename());
    if !first_gif.exists() {
        info!("No existing animations found, running initial update");
        let updater = updater.clone();
        let status = status.clone();
        tokio::spawn(async move {
            if let Err(e) = updater.run(&status).await {
                error!(error = %e, "Initial update failed");
            }
        });
    }

    // Web server in the background, scheduler in the foreground.
    {
        let state = state.clone();
        let server_config = config.server.clone();
        tokio::spawn(async move {
            if let Err(e) = server::run_server(state, &server_config).await {
                error!(error = %e, "Web server failed");
            }
        });
    }

    {
        let shutdown_tx = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Received shutdown signal");
            shutdown_tx.send(()).ok();
        });
    }

    update::run_scheduler(updater, status, shutdown_tx.subscribe()).await;

    Ok(())
}
