use rust_decimal::Decimal;
use thiserror::Error;

use crate::{
    account::AccountId,
    command::{AccountCommandError, TransactionIntent},
    error::LedgerError,
    ledger::{BalanceChange, TransferReceipt},
};

pub mod in_memory_processor;

#[derive(Debug, Error)]
pub enum TransactionProcessError {
    #[error(transparent)]
    CommandErr(#[from] AccountCommandError),
    #[error(transparent)]
    LedgerErr(#[from] LedgerError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionOutcome {
    Deposited(BalanceChange),
    Withdrawn(BalanceChange),
    Transferred(TransferReceipt),
}

pub trait TransactionProcessor {
    fn open_account(&mut self, owner: &str) -> Result<AccountId, TransactionProcessError>;

    fn process_transaction(
        &mut self,
        account: &AccountId,
        intent: TransactionIntent,
    ) -> Result<TransactionOutcome, TransactionProcessError>;

    fn balance(&self, account: &AccountId) -> Result<Decimal, TransactionProcessError>;
}
