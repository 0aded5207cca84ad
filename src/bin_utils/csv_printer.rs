use std::io::Write;

use crate::account::{Account, AccountId};
use anyhow::Context;
use csv::Writer;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AccountRow {
    pub id: AccountId,
    pub owner: String,
    pub balance: Decimal,
}

impl From<Account> for AccountRow {
    fn from(account: Account) -> Self {
        Self {
            id: account.id().clone(),
            owner: account.owner().to_owned(),
            balance: account.balance(),
        }
    }
}

/// Writes `id,owner,balance` with a header row, one line per account.
pub fn print_accounts<W: Write>(
    output: &mut W,
    accounts: impl IntoIterator<Item = AccountRow>,
) -> anyhow::Result<()> {
    let mut writer = Writer::from_writer(output);
    accounts
        .into_iter()
        .try_for_each(|row| writer.serialize(row))
        .context("Failed to write account table")?;
    writer.flush().context("Failed to flush account table")
}
