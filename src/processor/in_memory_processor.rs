use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::instrument;

use crate::{
    account::AccountId,
    command::TransactionIntent,
    error::{InvalidInput, LedgerError},
    ledger::{AccountHandle, SharedLedger},
};

use super::{TransactionOutcome, TransactionProcessError, TransactionProcessor};

#[derive(Default)]
pub struct InMemoryTransactionProcessor {
    ledger: SharedLedger,
    pub accounts: BTreeMap<AccountId, AccountHandle>,
}

impl InMemoryTransactionProcessor {
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            ledger,
            accounts: BTreeMap::new(),
        }
    }

    fn handle(&self, id: &AccountId) -> Result<&AccountHandle, LedgerError> {
        self.accounts
            .get(id)
            .ok_or_else(|| InvalidInput::UnknownAccount(id.clone()).into())
    }
}

impl TransactionProcessor for InMemoryTransactionProcessor {
    fn open_account(&mut self, owner: &str) -> Result<AccountId, TransactionProcessError> {
        let handle = self.ledger.create_account(owner)?;
        let id = handle.id().clone();
        self.accounts.insert(id.clone(), handle);
        Ok(id)
    }

    #[instrument(level = "debug", skip(self, account), fields(account = %account))]
    fn process_transaction(
        &mut self,
        account: &AccountId,
        intent: TransactionIntent,
    ) -> Result<TransactionOutcome, TransactionProcessError> {
        let source = self.handle(account)?;
        let outcome = match intent {
            TransactionIntent::Deposit { amount } => {
                TransactionOutcome::Deposited(self.ledger.deposit(source, amount)?)
            }
            TransactionIntent::Withdraw { amount } => {
                TransactionOutcome::Withdrawn(self.ledger.withdraw(source, amount)?)
            }
            TransactionIntent::Transfer { to, amount } => {
                let target = self.handle(&to)?;
                TransactionOutcome::Transferred(self.ledger.transfer(source, target, amount)?)
            }
        };
        Ok(outcome)
    }

    fn balance(&self, account: &AccountId) -> Result<Decimal, TransactionProcessError> {
        let handle = self.handle(account)?;
        Ok(self.ledger.balance(Some(handle))?)
    }
}
