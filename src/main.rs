use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use s3conf::harness::{CONFIG_ENV, S3TestConfig};
use s3conf::{Document, ParseMode};

/// Inspect S3 test suite configuration files.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file to read.
    #[arg(short, long, env = CONFIG_ENV)]
    config: PathBuf,

    /// Skip malformed lines and merge repeated sections instead of failing.
    #[arg(long, global = true)]
    lenient: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the document in normalized form.
    Dump,
    /// Print one raw value.
    Get { section: String, key: String },
    /// List placeholder names that still need to be filled in.
    Placeholders,
    /// Check that the sections the test suite needs are present.
    Check,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let mode = if cli.lenient {
        ParseMode::Lenient
    } else {
        ParseMode::Strict
    };

    let doc = Document::load(&cli.config, mode)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    match cli.command {
        Command::Dump => print!("{doc}"),
        Command::Get { section, key } => println!("{}", doc.get(&section, &key)?),
        Command::Placeholders => {
            for name in doc.placeholders() {
                println!("{name}");
            }
        }
        Command::Check => {
            let config = S3TestConfig::from_document(&doc)
                .context("configuration is not usable by the test suite")?;

            println!("endpoint: {}", config.endpoint);
            println!("storage classes: {}", config.storage_classes().join(", "));

            let unresolved = doc.placeholders();
            if !unresolved.is_empty() {
                tracing::warn!(
                    count = unresolved.len(),
                    "configuration has unresolved placeholders"
                );
            }
        }
    }

    Ok(())
}
