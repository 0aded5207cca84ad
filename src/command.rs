use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{account::AccountId, error::LedgerError};

/// Strictly positive transaction amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount(Decimal);

impl Amount {
    pub fn new(value: Decimal) -> Result<Self, LedgerError> {
        if value > Decimal::ZERO {
            Ok(Self(value))
        } else {
            Err(LedgerError::InvalidAmount { amount: value })
        }
    }

    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = LedgerError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Open,
    Deposit,
    Withdraw,
    Transfer,
}

/// A request against a single source account. The amount is still raw here,
/// the ledger validates it before touching any balance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionIntent {
    Deposit { amount: Decimal },
    Withdraw { amount: Decimal },
    Transfer { to: AccountId, amount: Decimal },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AccountCommandError {
    #[error("Amount is required for {kind:?}")]
    AmountRequired { kind: TransactionKind },
    #[error("Owner name is required to open an account")]
    OwnerRequired,
    #[error("Target account is required for a transfer")]
    TargetRequired,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountCommand {
    Open { owner: String },
    Transact(TransactionIntent),
}

impl AccountCommand {
    /// Builds a command from loosely typed row fields. Only presence is checked here;
    /// amount sign and owner blankness are ledger rules.
    pub fn parse_command(
        kind: TransactionKind,
        owner: Option<String>,
        to: Option<AccountId>,
        amount: Option<Decimal>,
    ) -> Result<Self, AccountCommandError> {
        let amount_for = |kind| amount.ok_or(AccountCommandError::AmountRequired { kind });
        match kind {
            TransactionKind::Open => owner
                .map(|owner| Self::Open { owner })
                .ok_or(AccountCommandError::OwnerRequired),
            TransactionKind::Deposit => Ok(Self::Transact(TransactionIntent::Deposit {
                amount: amount_for(kind)?,
            })),
            TransactionKind::Withdraw => Ok(Self::Transact(TransactionIntent::Withdraw {
                amount: amount_for(kind)?,
            })),
            TransactionKind::Transfer => {
                let to = to.ok_or(AccountCommandError::TargetRequired)?;
                Ok(Self::Transact(TransactionIntent::Transfer {
                    to,
                    amount: amount_for(kind)?,
                }))
            }
        }
    }
}
