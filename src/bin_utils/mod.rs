//! Host side of the ledger: reads a CSV script, drives [`crate::processor`] with it
//! and prints the resulting accounts. Everything the core deliberately leaves out
//! (aliases, reporting, logging setup) lives here.

use std::{
    collections::HashMap,
    io::{Read, Write},
};

use crate::{
    account::AccountId,
    command::AccountCommand,
    ledger::SharedLedger,
    processor::{
        TransactionProcessError, TransactionProcessor,
        in_memory_processor::InMemoryTransactionProcessor,
    },
};
use anyhow::Result;
use csv_parser::{CsvScriptParser, ScriptRow};
use csv_printer::{AccountRow, print_accounts};
use thiserror::Error;
use tracing::debug;
use tracing_subscriber::EnvFilter;
pub mod csv_parser;
pub mod csv_printer;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("Malformed row: {0}")]
    Csv(#[from] csv::Error),
    #[error("Unknown account alias `{0}`")]
    UnknownAlias(String),
    #[error("Account alias `{0}` is already bound")]
    DuplicateAlias(String),
    #[error(transparent)]
    Process(#[from] TransactionProcessError),
}

pub struct Service<'w, R, W: 'w> {
    pub input: R,
    pub output: &'w mut W,
    pub ledger: SharedLedger,
    pub error_printer: Box<dyn FnMut(u64, ScriptError)>,
}

impl<'w, R, W> Service<'w, R, W>
where
    R: Read,
    W: Write + 'w,
{
    pub fn run(mut self) -> Result<()> {
        let parser = CsvScriptParser::new(self.input);

        let mut processor = InMemoryTransactionProcessor::new(self.ledger);
        let mut aliases = HashMap::new();

        for (line, row) in parser {
            if let Err(err) = row
                .map_err(ScriptError::from)
                .and_then(|row| apply_row(&mut processor, &mut aliases, row))
            {
                (self.error_printer)(line, err);
            }
        }

        print_accounts(
            self.output,
            processor
                .accounts
                .values()
                .map(|handle| AccountRow::from(handle.snapshot())),
        )
    }
}

fn apply_row(
    processor: &mut impl TransactionProcessor,
    aliases: &mut HashMap<String, AccountId>,
    row: ScriptRow,
) -> Result<(), ScriptError> {
    let to = row
        .to
        .as_deref()
        .map(|alias| resolve(aliases, alias))
        .transpose()?;
    let command = AccountCommand::parse_command(row.kind, row.owner, to, row.amount)
        .map_err(TransactionProcessError::from)?;

    match command {
        AccountCommand::Open { owner } => {
            if aliases.contains_key(&row.account) {
                return Err(ScriptError::DuplicateAlias(row.account));
            }
            let id = processor.open_account(&owner)?;
            debug!(alias = %row.account, account = %id, "account opened");
            aliases.insert(row.account, id);
        }
        AccountCommand::Transact(intent) => {
            let id = resolve(aliases, &row.account)?;
            let outcome = processor.process_transaction(&id, intent)?;
            debug!(alias = %row.account, ?outcome, "transaction applied");
        }
    }
    Ok(())
}

fn resolve(aliases: &HashMap<String, AccountId>, alias: &str) -> Result<AccountId, ScriptError> {
    aliases
        .get(alias)
        .cloned()
        .ok_or_else(|| ScriptError::UnknownAlias(alias.to_owned()))
}

/// Installs a stderr `fmt` subscriber filtered by `RUST_LOG`, `warn` when unset.
///
/// Safe to call more than once, later calls are no-ops.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
