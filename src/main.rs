use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use confquill::{Conf, Format, Options};

/// ConfQuill - read and write hierarchical file/directory configuration
#[derive(Parser)]
#[command(name = "confquill")]
#[command(version)]
#[command(about = "Read and write hierarchical file/directory configuration", long_about = None)]
struct Cli {
    /// Configuration file or directory; the first one that exists is used
    #[arg(short, long = "config", required = true)]
    configs: Vec<PathBuf>,

    /// Codec for every file (json, yaml, toml); inferred from extensions by default
    #[arg(long, value_parser = parse_format)]
    format: Option<Format>,

    /// Only load directory entries ending in this suffix
    #[arg(long)]
    extension: Option<String>,

    /// Only load directory entries whose full name matches this regex
    #[arg(long)]
    filter: Option<String>,

    /// Name of the file holding a directory's own properties
    #[arg(long)]
    dirfile: Option<String>,

    /// Defaults to merge in, as JSON
    #[arg(long)]
    defaults: Option<String>,

    /// Write the configuration if it does not exist yet
    #[arg(long)]
    create: bool,

    /// Copy files to <name>.bak before overwriting them
    #[arg(long)]
    backup: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a query
    Get { query: String },
    /// Set the value at a query (JSON, or a plain string)
    Set { query: String, value: String },
    /// Delete the key at a query
    Unset { query: String },
    /// Print the whole configuration
    Dump {
        /// Output codec
        #[arg(long, value_parser = parse_format, default_value = "json")]
        output: Format,
    },
}

fn parse_format(name: &str) -> std::result::Result<Format, String> {
    Format::from_name(name).ok_or_else(|| format!("unknown format '{}'", name))
}

/// Values that are not valid JSON are taken as plain strings, so
/// `set name demo` works without quoting.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

fn main() -> Result<()> {
    // Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut options = Options::load();
    options.format = cli.format.or(options.format);
    options.extension = cli.extension.or(options.extension);
    options.filter = cli.filter.or(options.filter);
    options.dirfile = cli.dirfile.or(options.dirfile);
    options.create |= cli.create;
    options.create_backup |= cli.backup;
    if let Some(defaults) = &cli.defaults {
        let defaults: Value =
            serde_json::from_str(defaults).context("Failed to parse --defaults as JSON")?;
        if !defaults.is_object() {
            bail!("--defaults must be a JSON object");
        }
        options.defaults = Some(defaults);
    }
    options.autosave = matches!(cli.command, Commands::Set { .. } | Commands::Unset { .. });

    let mut conf = Conf::open(&cli.configs, &options).context("Failed to open configuration")?;

    match cli.command {
        Commands::Get { query } => {
            let value = conf
                .get(&query)?
                .with_context(|| format!("Nothing found at '{}'", query))?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        Commands::Set { query, value } => {
            conf.put(&query, parse_value(&value))
                .with_context(|| format!("Failed to set '{}'", query))?;
        }
        Commands::Unset { query } => {
            conf.remove(&query)
                .with_context(|| format!("Failed to unset '{}'", query))?;
        }
        Commands::Dump { output } => {
            print!("{}", output.stringify(&conf.eject())?);
        }
    }

    Ok(())
}
