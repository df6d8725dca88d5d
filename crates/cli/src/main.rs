//! favicon command-line entry point.
//!
//! Reports go to stdout, logs to stderr. `RUST_LOG` overrides the level,
//! otherwise it is `debug` with the debug-mode setting (or
//! `autotest --debug`) and `warn` without.

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::AsyncReadExt;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use prefixer_client::FaviconPrefixer;
use prefixer_core::{AppConfig, CacheDb, Settings};

mod args;
mod commands;
mod output;

use args::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match cli.config.as_deref() {
        Some(path) => AppConfig::load_from(Some(path))?,
        None => AppConfig::load()?,
    };

    let db = CacheDb::open(&config.db_path)
        .await
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let settings = Settings::load(&db).await.unwrap_or_default();
    init_tracing(settings.debug_mode || cli.command.wants_debug());

    let app = FaviconPrefixer::from_db(config, db).await?;
    let mut stdout = std::io::stdout().lock();

    match cli.command {
        Commands::CacheClear => commands::cache_clear(&app, &mut stdout).await?,
        Commands::CacheStatus => commands::cache_status(&app, &mut stdout).await?,
        Commands::CacheList { format } => commands::cache_list(&app, format, &mut stdout).await?,
        Commands::Autotest { url, debug } => commands::autotest(&app, &url, debug, &mut stdout).await?,
        Commands::Process { post_type, file } => {
            let input = match file {
                Some(path) => tokio::fs::read_to_string(&path)
                    .await
                    .with_context(|| format!("failed to read {}", path.display()))?,
                None => {
                    let mut input = String::new();
                    tokio::io::stdin().read_to_string(&mut input).await?;
                    input
                }
            };
            commands::ensure_input(&input)?;
            commands::process(&app, &input, post_type.as_deref(), &mut stdout).await?;
        }
        Commands::Settings { post_types, ignore_internal, debug_mode } => {
            commands::settings(&app, post_types, ignore_internal, debug_mode, &mut stdout).await?
        }
        Commands::Uninstall => commands::uninstall(&app, &mut stdout).await?,
    }

    stdout.flush()?;
    Ok(())
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}
