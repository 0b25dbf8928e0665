use std::io::Write;

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;
use tracing::{info, warn};

use blockwatch_ingest::{
    ConsoleReport, FsReader, IngestSummary, Ingestor, PollWatcher, ReportFormat, ReportScope,
    Watcher,
};
use blockwatch_ledger::Ledger;

use crate::cli::*;
use crate::config::WatchConfig;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let format = ReportFormat::from(cli.format);
    match cli.command {
        Command::Watch(args) => cmd_watch(args, format).await,
        Command::Demo(args) => cmd_demo(args, format),
    }
}

async fn cmd_watch(args: WatchArgs, format: ReportFormat) -> anyhow::Result<()> {
    let config = WatchConfig::resolve(&args)?;
    let watcher = PollWatcher::new(config.poll_config());
    let mut subscription = watcher
        .subscribe(&config.path)
        .context("cannot start watching")?;

    let closer = subscription.closer();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("interrupt received, shutting down"),
            Err(e) => warn!(error = %e, "cannot listen for interrupt, shutting down"),
        }
        closer.close();
    });

    if format == ReportFormat::Text {
        println!(
            "Watching {} for new files (Ctrl-C to stop)",
            config.path.display().to_string().bold()
        );
    }

    let sink = ConsoleReport::stdout(config.scope, format);
    let mut ingestor = Ingestor::new(FsReader, sink);
    let summary = ingestor.run(&mut subscription).await?;

    print_verdict(ingestor.ledger(), Some(summary), format)
}

fn cmd_demo(args: DemoArgs, format: ReportFormat) -> anyhow::Result<()> {
    let mut ledger = Ledger::new();
    for tx in &args.transactions {
        ledger.append(tx.as_bytes());
    }

    let mut report = ConsoleReport::stdout(ReportScope::Chain, format);
    report.render_chain(&ledger).context("failed to write report")?;

    print_verdict(&ledger, None, format)
}

#[derive(Serialize)]
struct Verdict {
    blocks: usize,
    valid: bool,
    first_violation: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<IngestSummary>,
}

fn print_verdict(
    ledger: &Ledger,
    summary: Option<IngestSummary>,
    format: ReportFormat,
) -> anyhow::Result<()> {
    let audit = ledger.report();
    let verdict = Verdict {
        blocks: ledger.len(),
        valid: audit.is_valid(),
        first_violation: audit.first_violation(),
        summary,
    };

    match format {
        ReportFormat::Json => {
            let mut out = std::io::stdout().lock();
            serde_json::to_writer(&mut out, &verdict)?;
            writeln!(out)?;
        }
        ReportFormat::Text => {
            if let Some(s) = summary {
                println!();
                println!("Appended: {}", s.appended.to_string().bold());
                println!("Read failures: {}", s.read_failures);
                println!("Notification errors: {}", s.notification_errors);
            }
            println!("Blocks: {}", verdict.blocks.to_string().bold());
            if verdict.valid {
                println!("Chain valid: {}", "true".green().bold());
            } else {
                println!("Chain valid: {}", "false".red().bold());
                for v in &audit.violations {
                    println!("  {} block {}: {}", "✗".red(), v.index, v.description);
                }
            }
        }
    }
    Ok(())
}
