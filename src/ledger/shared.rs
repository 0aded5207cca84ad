//! Thread-safe access to accounts.
//!
//! Every mutation of an account happens while its mutex is held, so the
//! check-then-write inside a withdrawal cannot interleave with another writer.
//! Transfers hold both accounts for their whole duration and always lock in the
//! same global order (account id, then allocation address).

use std::{
    cmp::Ordering,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use rust_decimal::Decimal;

use crate::{
    account::{Account, AccountId},
    error::LedgerError,
};

use super::{BalanceChange, LedgerService, TransferReceipt};

#[derive(Debug, Clone)]
pub struct AccountHandle {
    id: AccountId,
    inner: Arc<Mutex<Account>>,
}

impl AccountHandle {
    pub fn new(account: Account) -> Self {
        Self {
            id: account.id().clone(),
            inner: Arc::new(Mutex::new(account)),
        }
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    // Mutations are a single `apply_delta`, a poisoned lock never guards a half-written account.
    fn lock(&self) -> MutexGuard<'_, Account> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Point-in-time copy of the account.
    pub fn snapshot(&self) -> Account {
        self.lock().clone()
    }

    pub fn balance(&self) -> Decimal {
        self.lock().balance()
    }

    fn is_same_account(&self, other: &AccountHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn lock_order(&self, other: &AccountHandle) -> Ordering {
        self.id
            .cmp(&other.id)
            .then_with(|| Arc::as_ptr(&self.inner).cmp(&Arc::as_ptr(&other.inner)))
    }
}

/// [`LedgerService`] for accounts shared between threads.
#[derive(Clone, Default)]
pub struct SharedLedger {
    service: LedgerService,
}

impl SharedLedger {
    pub fn new(service: LedgerService) -> Self {
        Self { service }
    }

    pub fn create_account(&self, owner: &str) -> Result<AccountHandle, LedgerError> {
        self.service.create_account(owner).map(AccountHandle::new)
    }

    pub fn deposit(
        &self,
        account: &AccountHandle,
        amount: Decimal,
    ) -> Result<BalanceChange, LedgerError> {
        self.service.deposit(&mut account.lock(), amount)
    }

    pub fn withdraw(
        &self,
        account: &AccountHandle,
        amount: Decimal,
    ) -> Result<BalanceChange, LedgerError> {
        self.service.withdraw(&mut account.lock(), amount)
    }

    pub fn transfer(
        &self,
        from: &AccountHandle,
        to: &AccountHandle,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        if from.is_same_account(to) {
            return self.service.transfer_to_self(&mut from.lock(), amount);
        }
        let (mut from_guard, mut to_guard) = match from.lock_order(to) {
            Ordering::Greater => {
                let to_guard = to.lock();
                (from.lock(), to_guard)
            }
            _ => {
                let from_guard = from.lock();
                (from_guard, to.lock())
            }
        };
        self.service.transfer(&mut from_guard, &mut to_guard, amount)
    }

    pub fn balance(&self, account: Option<&AccountHandle>) -> Result<Decimal, LedgerError> {
        let guard = account.map(AccountHandle::lock);
        self.service.get_account_balance(guard.as_deref())
    }
}
