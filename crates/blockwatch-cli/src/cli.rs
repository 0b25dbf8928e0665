use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use blockwatch_ingest::{ReportFormat, ReportScope};

#[derive(Parser)]
#[command(
    name = "blockwatch",
    about = "Blockwatch: a hash-chained ledger of newly created files",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => ReportFormat::Text,
            OutputFormat::Json => ReportFormat::Json,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum ScopeArg {
    Chain,
    Tail,
}

impl From<ScopeArg> for ReportScope {
    fn from(scope: ScopeArg) -> Self {
        match scope {
            ScopeArg::Chain => ReportScope::Chain,
            ScopeArg::Tail => ReportScope::Tail,
        }
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Watch a directory and append a block for every new file
    Watch(WatchArgs),
    /// Build a ledger from literal transactions and print it
    Demo(DemoArgs),
}

#[derive(Args, Default)]
pub struct WatchArgs {
    /// Directory to watch (default: ./storage)
    pub path: Option<PathBuf>,
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,
    /// Milliseconds between directory scans
    #[arg(long)]
    pub interval_ms: Option<u64>,
    /// Also watch subdirectories
    #[arg(short, long)]
    pub recursive: bool,
    /// Print the whole chain or only the new block after each append
    #[arg(long)]
    pub scope: Option<ScopeArg>,
}

#[derive(Args)]
pub struct DemoArgs {
    /// Transactions to append, one block each
    #[arg(default_values = ["first transaction", "Second transaction"])]
    pub transactions: Vec<String>,
}
