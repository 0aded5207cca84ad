use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use crate::error::InvalidInput;

/// System generated account number. Never taken from a client.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    id: AccountId,
    owner: String,
    balance: Decimal,
}

impl Account {
    /// Accounts are only minted by [`crate::ledger::LedgerService`], which owns id generation.
    pub(crate) fn new(id: AccountId, owner: &str) -> Result<Self, InvalidInput> {
        let owner = owner.trim();
        if owner.is_empty() {
            return Err(InvalidInput::BlankOwner);
        }
        Ok(Self {
            id,
            owner: owner.to_owned(),
            balance: Decimal::ZERO,
        })
    }

    pub fn id(&self) -> &AccountId {
        &self.id
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    /// Unconditional ledger write. Callers validate first, this never checks anything.
    pub(crate) fn apply_delta(&mut self, amount: Decimal) {
        self.balance += amount;
    }
}
