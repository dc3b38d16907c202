use anyhow::Context;
use clap::Parser;
use copycat::commands::copy;
use copycat::config::Cli;
use copycat::progress::ProgressSink;
use copycat::ui::{ProgressReporter, TerminalChooser};
use copycat::Config;
use std::sync::Arc;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    // Convert CLI args to Config - this validates immediately
    let config = Config::try_from(&cli)?;

    let chooser = TerminalChooser::new(cli.source.clone(), cli.destination.clone());
    let sink: Arc<dyn ProgressSink> = if cli.quiet || cli.json {
        Arc::new(ProgressReporter::hidden())
    } else {
        Arc::new(ProgressReporter::new())
    };

    match copy::run_selected(&chooser, &config, sink) {
        Ok(summary) => {
            if cli.json {
                let json =
                    serde_json::to_string_pretty(&summary).context("serialize summary")?;
                println!("{}", json);
            }
            Ok(())
        }
        Err(e) if e.is_clean_abort() => {
            if !cli.quiet {
                eprintln!("{}", e);
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// Log to stderr; `RUST_LOG` wins over the flags
fn init_logging(verbose: bool, quiet: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let level = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
