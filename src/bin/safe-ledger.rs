use std::{fs::File, path::PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use safe_ledger::{
    bin_utils::{ScriptError, Service, init_tracing},
    id_generator::{DEFAULT_SEQUENCE_START, RandomIdGenerator, SequentialIdGenerator},
    ledger::{LedgerService, SharedLedger},
    processor::TransactionProcessError,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum IdScheme {
    /// ACC001001, ACC001002, ...
    Sequential,
    /// ACCT- followed by 8 random hex digits
    Random,
}

#[derive(Parser)]
#[command(author, version, about = "Runs a ledger script and prints the final accounts", long_about = None)]
struct Cli {
    /// CSV script with `type,account,owner,to,amount` columns
    script: PathBuf,

    /// How new account numbers are generated
    #[arg(long, value_enum, default_value_t = IdScheme::Sequential)]
    id_scheme: IdScheme,

    /// Counter value the sequential scheme increments from
    #[arg(long, default_value_t = DEFAULT_SEQUENCE_START)]
    sequence_start: u64,
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let file = File::open(&cli.script)
        .with_context(|| format!("Failed to open `{}`", cli.script.display()))?;

    let ledger = match cli.id_scheme {
        IdScheme::Sequential => {
            LedgerService::new(SequentialIdGenerator::starting_at(cli.sequence_start))
        }
        IdScheme::Random => LedgerService::new(RandomIdGenerator::default()),
    };

    let service = Service {
        input: file,
        output: &mut std::io::stdout(),
        ledger: SharedLedger::new(ledger),
        error_printer: Box::new(|line, err| match err {
            // rejected business operations are expected, not technical errors
            ScriptError::Process(TransactionProcessError::LedgerErr(err)) => {
                tracing::warn!(line, %err, "transaction rejected")
            }
            err => eprintln!("Error at line {line}: {err}"),
        }),
    };
    service.run()
}
