use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "stash",
    about = "stash — file-backed key-value store",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store file to operate on (overrides --config)
    #[arg(short, long, global = true)]
    pub store: Option<PathBuf>,

    /// TOML file with store settings
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the value stored under a key
    Get(KeyArgs),
    /// Store a value under a key and persist the store
    Set(SetArgs),
    /// Report whether a key is present
    Contains(KeyArgs),
    /// List all keys
    Keys,
    /// Print the whole store
    Dump,
    /// Show the cache and persisted hashes
    Hash,
    /// Delete the store file
    Delete,
}

#[derive(Args)]
pub struct KeyArgs {
    pub key: String,
}

#[derive(Args)]
pub struct SetArgs {
    pub key: String,
    /// JSON value; anything that is not valid JSON is stored as a string
    pub value: String,
    /// Keep the existing value if the key is already set
    #[arg(long)]
    pub no_override: bool,
    /// Write even if nothing changed
    #[arg(long)]
    pub force: bool,
}
