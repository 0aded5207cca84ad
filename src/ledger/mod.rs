use rust_decimal::Decimal;

use crate::account::AccountId;

mod service;
pub mod shared;

pub use service::LedgerService;
pub use shared::{AccountHandle, SharedLedger};

/// Effect of a single deposit or withdrawal on one account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChange {
    pub account: AccountId,
    pub amount: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReceipt {
    pub withdrawal: BalanceChange,
    pub deposit: BalanceChange,
}

impl TransferReceipt {
    pub fn from_balance(&self) -> Decimal {
        self.withdrawal.new_balance
    }

    pub fn to_balance(&self) -> Decimal {
        self.deposit.new_balance
    }
}
