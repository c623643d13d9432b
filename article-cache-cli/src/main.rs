use std::time::Duration;

use article_cache::{CacheConfig, CacheFileWriter};
use clap::Parser;
use error::AppError;
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

mod cli;
mod commands;
mod error;
mod utils;

use cli::{CliArgs, Commands};

fn main() {
    if let Err(e) = bootstrap() {
        eprintln!("Error: {e}");
        error!(error = ?e, "Application failed");
        std::process::exit(1);
    }
}

#[tokio::main]
async fn bootstrap() -> Result<(), AppError> {
    let args = CliArgs::parse();

    init_logging(args.verbose)?;

    let config = build_config(&args);
    let writer = CacheFileWriter::from_config(&config)?;

    match args.command {
        Commands::Add { group, keys } => commands::add(&writer, &group, &keys).await,
        Commands::Migrate {
            url,
            content,
            mime_type,
            keys,
        } => commands::migrate(&writer, &url, &content, &mime_type, keys).await,
        Commands::Inspect { image, keys } => commands::inspect(&writer, &config, &keys, image),
    }
}

fn init_logging(verbose: bool) -> Result<(), AppError> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .try_init()
        .map_err(|e| AppError::Initialization(e.to_string()))
}

fn build_config(args: &CliArgs) -> CacheConfig {
    let mut builder = CacheConfig::builder()
        .with_hashed_file_names(!args.raw_file_names)
        .with_timeout(Duration::from_secs(args.timeout))
        .with_connect_timeout(Duration::from_secs(args.connect_timeout))
        .with_headers(utils::parse_headers(&args.headers))
        .with_system_proxy(!args.no_system_proxy);

    if let Some(dir) = &args.cache_dir {
        builder = builder.with_cache_root(dir);
    }
    if let Some(dir) = &args.assets_dir {
        builder = builder.with_assets_dir(dir);
    }

    builder.build()
}
