//! Data Loop CLI
//!
//! Replays a CSV command log against a fresh ledger and prints a report.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- commands.csv --config ledger.toml --report receipts > receipts.csv
//! ```
//!
//! Reports: `balances` (default), `receipts`, `streams`, `payments`.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Set to `debug` or `warn` to control logging verbosity
//! - `DATA_LOOP_SETTLEMENT`, `DATA_LOOP_CLOSE`: override the configured policies

use data_loop::{EngineError, Ledger, LedgerConfig, ReceiptWriter, Result};
use std::env;
use std::fs::File;
use std::io::{self, BufReader};
use std::process;

enum Report {
    Balances,
    Receipts,
    Streams,
    Payments,
}

struct Args {
    input: String,
    config: Option<String>,
    report: Report,
}

fn main() {
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut input = None;
    let mut config = None;
    let mut report = Report::Balances;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => {
                let path = iter.next().ok_or(EngineError::MissingArgument)?;
                config = Some(path.clone());
            }
            "--report" => {
                report = match iter.next().map(String::as_str) {
                    Some("balances") => Report::Balances,
                    Some("receipts") => Report::Receipts,
                    Some("streams") => Report::Streams,
                    Some("payments") => Report::Payments,
                    Some(other) => return Err(EngineError::UnknownArgument(other.to_string())),
                    None => return Err(EngineError::MissingArgument),
                };
            }
            other if other.starts_with("--") => {
                return Err(EngineError::UnknownArgument(other.to_string()));
            }
            other => input = Some(other.to_string()),
        }
    }

    Ok(Args {
        input: input.ok_or(EngineError::MissingArgument)?,
        config,
        report,
    })
}

fn run() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let args = parse_args(&args)?;

    let mut config = match &args.config {
        Some(path) => LedgerConfig::from_file(path)?,
        None => LedgerConfig::default(),
    };
    config.apply_env()?;

    let file = File::open(&args.input)?;
    let reader = BufReader::new(file);

    let mut ledger = Ledger::with_config(config)?;

    let stdout = io::stdout();
    let handle = stdout.lock();
    match args.report {
        Report::Receipts => {
            let mut receipts = ReceiptWriter::new(handle)?;
            ledger.replay(reader, |receipt| receipts.write(&receipt))?;
            receipts.finish()?;
        }
        Report::Balances => {
            ledger.process_csv(reader)?;
            ledger.write_balances(handle)?;
        }
        Report::Streams => {
            ledger.process_csv(reader)?;
            ledger.write_streams(handle)?;
        }
        Report::Payments => {
            ledger.process_csv(reader)?;
            ledger.write_payments(handle)?;
        }
    }

    Ok(())
}
