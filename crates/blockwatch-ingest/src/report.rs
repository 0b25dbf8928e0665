//! Reporting sinks: read-only consumers of ledger state.
//!
//! Sinks are best-effort. Output failures are logged and swallowed so they
//! can never affect the ledger.

use std::io::{self, Write};

use colored::Colorize;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use blockwatch_ledger::{Block, Ledger};

use crate::error::IngestError;

/// Receives ledger state after each append, and ingestion failures.
pub trait ReportSink {
    /// Called after a block has been appended; the new block is `ledger.tail()`.
    fn block_appended(&mut self, ledger: &Ledger);

    /// Called for every recoverable ingestion or notification failure.
    fn ingest_failed(&mut self, error: &IngestError);
}

impl<S: ReportSink + ?Sized> ReportSink for Box<S> {
    fn block_appended(&mut self, ledger: &Ledger) {
        (**self).block_appended(ledger);
    }

    fn ingest_failed(&mut self, error: &IngestError) {
        (**self).ingest_failed(error);
    }
}

/// Which blocks a [`ConsoleReport`] renders after an append.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportScope {
    /// The whole chain, genesis first.
    #[default]
    Chain,
    /// Only the newly appended block.
    Tail,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReportFormat {
    #[default]
    Text,
    /// One JSON object per line.
    Json,
}

/// Serializable view of a block for JSON output.
#[derive(Debug, Serialize)]
struct BlockView<'a> {
    index: usize,
    timestamp: String,
    created_at_ms: u64,
    hash: String,
    previous_hash: String,
    payload: &'a str,
    payload_len: usize,
}

#[derive(Debug, Serialize)]
struct ErrorView {
    error: String,
    path: Option<String>,
    recoverable: bool,
}

/// Renders ledger state to a writer (stdout by default).
pub struct ConsoleReport<W = io::Stdout> {
    out: W,
    scope: ReportScope,
    format: ReportFormat,
}

impl ConsoleReport<io::Stdout> {
    pub fn stdout(scope: ReportScope, format: ReportFormat) -> Self {
        Self::new(io::stdout(), scope, format)
    }
}

impl<W: Write> ConsoleReport<W> {
    pub fn new(out: W, scope: ReportScope, format: ReportFormat) -> Self {
        Self { out, scope, format }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    /// Render every block of `ledger`, genesis first.
    pub fn render_chain(&mut self, ledger: &Ledger) -> io::Result<()> {
        for (index, block) in ledger.blocks().iter().enumerate() {
            self.render_block(index, block)?;
        }
        self.out.flush()
    }

    /// Render a single block at `index`.
    pub fn render_block(&mut self, index: usize, block: &Block) -> io::Result<()> {
        match self.format {
            ReportFormat::Text => {
                writeln!(self.out, "{} : {}", "Block ID".bold(), index.to_string().yellow())?;
                writeln!(self.out, "Timestamp : {}", block.created_at())?;
                writeln!(
                    self.out,
                    "Hash of the block : {}",
                    block.self_hash().to_hex().cyan()
                )?;
                writeln!(
                    self.out,
                    "Hash of the previous Block : {}",
                    block.previous_hash().to_hex().dimmed()
                )?;
                writeln!(self.out, "All the transactions : {}", block.payload_text())
            }
            ReportFormat::Json => {
                let payload = block.payload_text();
                let view = BlockView {
                    index,
                    timestamp: block.created_at().to_rfc3339(),
                    created_at_ms: block.created_at().as_millis(),
                    hash: block.self_hash().to_hex(),
                    previous_hash: block.previous_hash().to_hex(),
                    payload: &payload,
                    payload_len: block.payload().len(),
                };
                serde_json::to_writer(&mut self.out, &view)?;
                writeln!(self.out)
            }
        }
    }

    fn render_append(&mut self, ledger: &Ledger) -> io::Result<()> {
        let index = ledger.len() - 1;
        if self.format == ReportFormat::Text {
            writeln!(
                self.out,
                "{} Added block {} ({} bytes)",
                "✓".green().bold(),
                index.to_string().yellow(),
                ledger.tail().payload().len()
            )?;
        }
        match self.scope {
            ReportScope::Chain => self.render_chain(ledger),
            ReportScope::Tail => {
                self.render_block(index, ledger.tail())?;
                self.out.flush()
            }
        }
    }

    fn render_error(&mut self, error: &IngestError) -> io::Result<()> {
        match self.format {
            ReportFormat::Text => writeln!(self.out, "{} {}", "✗".red().bold(), error),
            ReportFormat::Json => {
                let view = ErrorView {
                    error: error.to_string(),
                    path: error.path().map(|p| p.display().to_string()),
                    recoverable: error.is_recoverable(),
                };
                serde_json::to_writer(&mut self.out, &view)?;
                writeln!(self.out)
            }
        }
    }
}

impl<W: Write> ReportSink for ConsoleReport<W> {
    fn block_appended(&mut self, ledger: &Ledger) {
        if let Err(e) = self.render_append(ledger) {
            debug!(error = %e, "report output failed");
        }
    }

    fn ingest_failed(&mut self, error: &IngestError) {
        if let Err(e) = self.render_error(error) {
            debug!(error = %e, "report output failed");
        }
    }
}

/// Sink that only emits structured `tracing` events.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReport;

impl ReportSink for TracingReport {
    fn block_appended(&mut self, ledger: &Ledger) {
        let block = ledger.tail();
        info!(
            index = ledger.len() - 1,
            hash = %block.self_hash(),
            previous_hash = %block.previous_hash(),
            bytes = block.payload().len(),
            "block appended"
        );
    }

    fn ingest_failed(&mut self, error: &IngestError) {
        warn!(error = %error, "ingestion failure");
    }
}
