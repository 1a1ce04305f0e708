//! dict-replacer - Main entry point
//!
//! A small host around the library: loads a JSON build configuration and
//! runs the source or markup path over files named on the command line.

mod cli;

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use dict_replacer::{CompiledAsset, HostConfig, KeyMode, Replacer, SourceFile};

use crate::cli::{Cli, Commands};

/// Initialize logging to stderr; `RUST_LOG` overrides the default `info` level
fn init_logger() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_logger();

    let cli = Cli::parse_args();
    debug!("CLI arguments parsed");

    match cli.command {
        Commands::Check { config } => {
            let replacer = load_replacer(&config, cli.key_mode)?;
            for entry in replacer.dictionary() {
                println!("{} => {}", entry.key, entry.value);
            }
            println!("pattern: {}", replacer.pattern());
        }
        Commands::Source { config, in_place, paths } => {
            let replacer = load_replacer(&config, cli.key_mode)?;
            for path in &paths {
                run_source(&replacer, path, in_place).await?;
            }
        }
        Commands::Markup { config, paths } => {
            let replacer = load_replacer(&config, cli.key_mode)?;
            let mut assets = Vec::with_capacity(paths.len());
            for path in paths {
                let compiled = tokio::fs::read(&path)
                    .await
                    .with_context(|| format!("Failed to read {:?}", path))?;
                assets.push(CompiledAsset::new(path, compiled));
            }

            let report = replacer.on_compile(&assets).await;
            if !report.is_success() {
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn load_replacer(path: &Path, key_mode: Option<KeyMode>) -> Result<Replacer> {
    info!("Loading configuration from {:?}", path);
    let host = HostConfig::load_from_file(path)
        .with_context(|| format!("Failed to load configuration from {:?}", path))?;

    let mut options = host.into_replacer_options();
    if let Some(mode) = key_mode {
        options.key_mode = mode;
    }

    Replacer::from_options(options).context("Invalid replacer configuration")
}

async fn run_source(replacer: &Replacer, path: &Path, in_place: bool) -> Result<()> {
    if !replacer.is_eligible(path) {
        warn!("Skipping {:?}: does not match {}", path, replacer.pattern());
        return Ok(());
    }

    let data = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;
    let file = replacer
        .compile(Some(SourceFile::new(path, data)))
        .await
        .with_context(|| format!("Replacement failed for {:?}", path))?;

    let Some(data) = file.and_then(|f| f.data) else {
        return Ok(());
    };
    if in_place {
        tokio::fs::write(path, data)
            .await
            .with_context(|| format!("Failed to write {:?}", path))?;
        info!("Rewrote {:?}", path);
    } else {
        print!("{data}");
    }
    Ok(())
}
