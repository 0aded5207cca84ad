use rust_decimal::Decimal;
use thiserror::Error;

use crate::account::AccountId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidInput {
    #[error("Owner name must not be empty")]
    BlankOwner,
    #[error("Account reference is missing")]
    MissingAccount,
    #[error("Account {0} does not exist")]
    UnknownAccount(AccountId),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
    #[error("Amount must be positive, got {amount}")]
    InvalidAmount { amount: Decimal },
    #[error(
        "Insufficient funds in account {account}: balance {balance}, requested {requested}, shortfall {shortfall}"
    )]
    InsufficientFunds {
        account: AccountId,
        balance: Decimal,
        requested: Decimal,
        shortfall: Decimal,
    },
    #[error("Balance of account {account} cannot hold another {amount}")]
    BalanceOverflow { account: AccountId, amount: Decimal },
    #[error("Balance of account {account} cannot represent a change of exactly {amount}")]
    PrecisionLoss { account: AccountId, amount: Decimal },
}

impl LedgerError {
    /// How much was missing for a rejected withdrawal.
    pub fn shortfall(&self) -> Option<Decimal> {
        match self {
            LedgerError::InsufficientFunds { shortfall, .. } => Some(*shortfall),
            _ => None,
        }
    }
}
