use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    account::Account,
    command::Amount,
    error::{InvalidInput, LedgerError},
    id_generator::{AccountIdGenerator, SequentialIdGenerator},
};

use super::{BalanceChange, TransferReceipt};

/// Validated entry points over [`Account`]. The only code allowed to move a balance.
///
/// Holds no account state, only the id generator it was built with, so one instance
/// can serve any number of accounts.
#[derive(Clone)]
pub struct LedgerService {
    ids: Arc<dyn AccountIdGenerator>,
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new(SequentialIdGenerator::default())
    }
}

impl LedgerService {
    pub fn new(ids: impl AccountIdGenerator + 'static) -> Self {
        Self { ids: Arc::new(ids) }
    }

    pub fn create_account(&self, owner: &str) -> Result<Account, LedgerError> {
        // checked up front so a rejected owner does not burn an id
        if owner.trim().is_empty() {
            return Err(InvalidInput::BlankOwner.into());
        }
        let account = Account::new(self.ids.next_id(), owner)?;
        debug!(account = %account.id(), owner = account.owner(), "account created");
        Ok(account)
    }

    pub fn deposit(
        &self,
        account: &mut Account,
        amount: Decimal,
    ) -> Result<BalanceChange, LedgerError> {
        let amount = Amount::new(amount)?.value();
        let previous_balance = account.balance();
        let next = previous_balance
            .checked_add(amount)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: account.id().clone(),
                amount,
            })?;
        ensure_exact(account, previous_balance, next, amount)?;
        account.apply_delta(amount);
        debug!(account = %account.id(), %amount, balance = %account.balance(), "deposited");
        Ok(BalanceChange {
            account: account.id().clone(),
            amount,
            previous_balance,
            new_balance: account.balance(),
        })
    }

    pub fn withdraw(
        &self,
        account: &mut Account,
        amount: Decimal,
    ) -> Result<BalanceChange, LedgerError> {
        let amount = Amount::new(amount)?.value();
        let previous_balance = account.balance();
        if amount > previous_balance {
            return Err(LedgerError::InsufficientFunds {
                account: account.id().clone(),
                balance: previous_balance,
                requested: amount,
                shortfall: amount - previous_balance,
            });
        }
        ensure_exact(account, previous_balance, previous_balance - amount, -amount)?;
        account.apply_delta(-amount);
        debug!(account = %account.id(), %amount, balance = %account.balance(), "withdrawn");
        Ok(BalanceChange {
            account: account.id().clone(),
            amount,
            previous_balance,
            new_balance: account.balance(),
        })
    }

    /// Withdraws from `from` first, so a transfer can never move money `from` does not hold.
    /// If the deposit into `to` is refused, the withdrawn amount is put back before the
    /// error is returned.
    pub fn transfer(
        &self,
        from: &mut Account,
        to: &mut Account,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        let withdrawal = self.withdraw(from, amount)?;
        match self.deposit(to, amount) {
            Ok(deposit) => Ok(TransferReceipt {
                withdrawal,
                deposit,
            }),
            Err(err) => {
                from.apply_delta(withdrawal.amount);
                Err(err)
            }
        }
    }

    /// Transfer where source and target are the same account. Balance neutral, but the
    /// amount still has to be positive and covered by the balance.
    pub fn transfer_to_self(
        &self,
        account: &mut Account,
        amount: Decimal,
    ) -> Result<TransferReceipt, LedgerError> {
        let withdrawal = self.withdraw(account, amount)?;
        match self.deposit(account, amount) {
            Ok(deposit) => Ok(TransferReceipt {
                withdrawal,
                deposit,
            }),
            Err(err) => {
                account.apply_delta(withdrawal.amount);
                Err(err)
            }
        }
    }

    pub fn get_account_balance(&self, account: Option<&Account>) -> Result<Decimal, LedgerError> {
        account
            .map(Account::balance)
            .ok_or_else(|| InvalidInput::MissingAccount.into())
    }
}

// Decimal arithmetic rounds past 28 significant digits, so a tiny amount against a large
// balance can come back with the balance unmoved.
fn ensure_exact(
    account: &Account,
    previous: Decimal,
    next: Decimal,
    delta: Decimal,
) -> Result<(), LedgerError> {
    if next - previous == delta {
        Ok(())
    } else {
        Err(LedgerError::PrecisionLoss {
            account: account.id().clone(),
            amount: delta.abs(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    use crate::account::AccountId;

    use super::*;

    fn funded(ledger: &LedgerService, owner: &str, amount: Decimal) -> Account {
        let mut acc = ledger.create_account(owner).unwrap();
        if amount > Decimal::ZERO {
            ledger.deposit(&mut acc, amount).unwrap();
        }
        acc
    }

    #[test]
    fn create_account() {
        let ledger = LedgerService::default();
        let alice = ledger.create_account("Alice").unwrap();
        assert_eq!(alice.balance(), dec!(0.00));
        assert_eq!(alice.owner(), "Alice");
        assert_eq!(alice.id().as_str(), "ACC001001");

        let bob = ledger.create_account("Bob").unwrap();
        assert_ne!(alice.id(), bob.id());
    }

    #[test]
    fn create_account_rejects_blank_owner_without_spending_id() {
        let ledger = LedgerService::default();
        let err = ledger.create_account("   ").unwrap_err();
        assert_eq!(err, LedgerError::InvalidInput(InvalidInput::BlankOwner));
        assert_eq!(err.to_string(), "Owner name must not be empty");

        let acc = ledger.create_account("Alice").unwrap();
        assert_eq!(acc.id().as_str(), "ACC001001");
    }

    #[test]
    fn create_account_uses_injected_generator() {
        let counter = AtomicU64::new(7);
        let ledger = LedgerService::new(move || {
            AccountId::new(format!("X{}", counter.fetch_add(1, Ordering::Relaxed)))
        });
        assert_eq!(ledger.create_account("Alice").unwrap().id().as_str(), "X7");
        assert_eq!(ledger.create_account("Bob").unwrap().id().as_str(), "X8");
    }

    #[test]
    fn deposit() {
        let ledger = LedgerService::default();
        let mut acc = ledger.create_account("Alice").unwrap();

        let change = ledger.deposit(&mut acc, dec!(1000.00)).unwrap();
        assert_eq!(change.previous_balance, dec!(0));
        assert_eq!(change.new_balance, dec!(1000.00));
        assert_eq!(change.amount, dec!(1000.00));
        assert_eq!(&change.account, acc.id());
        assert_eq!(acc.balance(), dec!(1000.00));

        let err = ledger.deposit(&mut acc, dec!(-50.00)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InvalidAmount {
                amount: dec!(-50.00)
            }
        );
        assert_eq!(acc.balance(), dec!(1000.00));

        let err = ledger.deposit(&mut acc, Decimal::ZERO).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert_eq!(acc.balance(), dec!(1000.00));
    }

    #[test]
    fn deposit_overflow_is_rejected() {
        let ledger = LedgerService::default();
        let mut acc = funded(&ledger, "Alice", Decimal::MAX);
        let err = ledger.deposit(&mut acc, dec!(1)).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow { .. }));
        assert_eq!(acc.balance(), Decimal::MAX);
    }

    #[test]
    fn deposit_below_balance_precision_is_rejected() {
        let ledger = LedgerService::default();
        let mut acc = funded(&ledger, "Alice", dec!(1000));
        let tiny = dec!(0.0000000000000000000000000001);

        let err = ledger.deposit(&mut acc, tiny).unwrap_err();
        assert_eq!(
            err,
            LedgerError::PrecisionLoss {
                account: acc.id().clone(),
                amount: tiny,
            }
        );
        assert_eq!(acc.balance(), dec!(1000));

        // a small balance can still take the same amount
        let mut small = funded(&ledger, "Bob", dec!(0.1));
        let change = ledger.deposit(&mut small, tiny).unwrap();
        assert_eq!(change.new_balance - change.previous_balance, tiny);
    }

    #[test]
    fn withdraw_below_balance_precision_is_rejected() {
        let ledger = LedgerService::default();
        let mut acc = funded(&ledger, "Alice", dec!(1000));
        let tiny = dec!(0.0000000000000000000000000004);

        let err = ledger.withdraw(&mut acc, tiny).unwrap_err();
        assert!(matches!(err, LedgerError::PrecisionLoss { amount, .. } if amount == tiny));
        assert_eq!(acc.balance(), dec!(1000));
    }

    #[test]
    fn transfer_of_unrepresentable_amount_keeps_total() {
        let ledger = LedgerService::default();
        let mut a = funded(&ledger, "Alice", dec!(1));
        let mut b = funded(&ledger, "Bob", dec!(1000));
        let tiny = dec!(0.0000000000000000000000000004);

        let err = ledger.transfer(&mut a, &mut b, tiny).unwrap_err();
        assert!(matches!(err, LedgerError::PrecisionLoss { account, .. } if &account == b.id()));
        assert_eq!(a.balance(), dec!(1));
        assert_eq!(b.balance(), dec!(1000));
    }

    #[test]
    fn withdraw() {
        let ledger = LedgerService::default();
        let mut acc = funded(&ledger, "Alice", dec!(1000.00));

        let change = ledger.withdraw(&mut acc, dec!(250.00)).unwrap();
        assert_eq!(change.previous_balance, dec!(1000.00));
        assert_eq!(change.new_balance, dec!(750.00));
        assert_eq!(acc.balance(), dec!(750.00));

        // the whole balance can be withdrawn
        ledger.withdraw(&mut acc, dec!(750.00)).unwrap();
        assert_eq!(acc.balance(), Decimal::ZERO);

        let err = ledger.withdraw(&mut acc, dec!(-1)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
    }

    #[test]
    fn withdraw_insufficient_funds() {
        let ledger = LedgerService::default();
        let mut acc = funded(&ledger, "Alice", dec!(1000.00));

        let err = ledger.withdraw(&mut acc, dec!(1500.00)).unwrap_err();
        assert_eq!(err.shortfall(), Some(dec!(500.00)));
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                account: acc.id().clone(),
                balance: dec!(1000.00),
                requested: dec!(1500.00),
                shortfall: dec!(500.00),
            }
        );
        assert_eq!(
            err.to_string(),
            "Insufficient funds in account ACC001001: balance 1000.00, requested 1500.00, shortfall 500.00"
        );
        assert_eq!(acc.balance(), dec!(1000.00));
    }

    #[test]
    fn transfer() {
        let ledger = LedgerService::default();
        let mut a = funded(&ledger, "Alice", dec!(1000.00));
        let mut b = funded(&ledger, "Bob", dec!(750.50));

        let receipt = ledger.transfer(&mut a, &mut b, dec!(200.00)).unwrap();
        assert_eq!(a.balance(), dec!(800.00));
        assert_eq!(b.balance(), dec!(950.50));
        assert_eq!(receipt.from_balance(), dec!(800.00));
        assert_eq!(receipt.to_balance(), dec!(950.50));
        assert_eq!(&receipt.withdrawal.account, a.id());
        assert_eq!(&receipt.deposit.account, b.id());
    }

    #[test]
    fn transfer_with_insufficient_funds_leaves_target_untouched() {
        let ledger = LedgerService::default();
        let mut a = funded(&ledger, "Alice", dec!(100.00));
        let mut b = funded(&ledger, "Bob", dec!(750.50));

        let err = ledger.transfer(&mut a, &mut b, dec!(200.00)).unwrap_err();
        assert_eq!(err.shortfall(), Some(dec!(100.00)));
        assert_eq!(a.balance(), dec!(100.00));
        assert_eq!(b.balance(), dec!(750.50));

        let err = ledger.transfer(&mut a, &mut b, dec!(-5)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert_eq!(a.balance(), dec!(100.00));
        assert_eq!(b.balance(), dec!(750.50));
    }

    #[test]
    fn transfer_restores_source_when_deposit_fails() {
        let ledger = LedgerService::default();
        let mut a = funded(&ledger, "Alice", dec!(10));
        let mut b = funded(&ledger, "Bob", Decimal::MAX);

        let err = ledger.transfer(&mut a, &mut b, dec!(1)).unwrap_err();
        assert!(matches!(err, LedgerError::BalanceOverflow { account, .. } if &account == b.id()));
        assert_eq!(a.balance(), dec!(10));
        assert_eq!(b.balance(), Decimal::MAX);
    }

    #[test]
    fn transfer_to_self() {
        let ledger = LedgerService::default();
        let mut a = funded(&ledger, "Alice", dec!(100.00));

        let receipt = ledger.transfer_to_self(&mut a, dec!(40)).unwrap();
        assert_eq!(receipt.withdrawal.new_balance, dec!(60.00));
        assert_eq!(receipt.to_balance(), dec!(100.00));
        assert_eq!(a.balance(), dec!(100.00));

        // same checks as any other transfer
        let err = ledger.transfer_to_self(&mut a, dec!(100.01)).unwrap_err();
        assert_eq!(err.shortfall(), Some(dec!(0.01)));
        let err = ledger.transfer_to_self(&mut a, dec!(0)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        assert_eq!(a.balance(), dec!(100.00));
    }

    #[test]
    fn get_account_balance() {
        let ledger = LedgerService::default();
        let acc = funded(&ledger, "Alice", dec!(12.34));
        assert_eq!(ledger.get_account_balance(Some(&acc)).unwrap(), dec!(12.34));
        assert_eq!(ledger.get_account_balance(Some(&acc)).unwrap(), dec!(12.34));

        let err = ledger.get_account_balance(None).unwrap_err();
        assert_eq!(err, LedgerError::InvalidInput(InvalidInput::MissingAccount));
    }

    #[derive(Debug, Clone, Copy)]
    enum Op {
        Deposit(bool, Decimal),
        Withdraw(bool, Decimal),
        Transfer(bool, Decimal),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        let amount = prop_oneof![
            (-5_000i64..100_000i64).prop_map(|cents| Decimal::new(cents, 2)),
            (1i64..1_000_000i64, 0u32..=28).prop_map(|(num, scale)| Decimal::new(num, scale)),
        ];
        prop_oneof![
            (any::<bool>(), amount.clone()).prop_map(|(first, amount)| Op::Deposit(first, amount)),
            (any::<bool>(), amount.clone()).prop_map(|(first, amount)| Op::Withdraw(first, amount)),
            (any::<bool>(), amount).prop_map(|(first, amount)| Op::Transfer(first, amount)),
        ]
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Balances never go negative, failed operations change nothing and successful
        /// operations move exactly the requested amount, on both legs of a transfer.
        #[test]
        fn ledger_invariants_hold(
            opening in prop_oneof![Just(0i64), 1i64..1_000_000_000_000i64],
            ops in prop::collection::vec(op_strategy(), 1..40),
        ) {
            let ledger = LedgerService::default();
            let opening = Decimal::new(opening, 2);
            let mut a = funded(&ledger, "Alice", opening);
            let mut b = funded(&ledger, "Bob", opening);

            for op in ops {
                let before = (a.balance(), b.balance());
                let (first, second) = match &op {
                    Op::Deposit(true, _) | Op::Withdraw(true, _) | Op::Transfer(true, _) => (&mut a, &mut b),
                    _ => (&mut b, &mut a),
                };
                let delta = |change: &BalanceChange| change.new_balance - change.previous_balance;
                let result = match op {
                    Op::Deposit(_, amount) => ledger
                        .deposit(first, amount)
                        .map(|change| (Decimal::ZERO, delta(&change), amount)),
                    Op::Withdraw(_, amount) => ledger
                        .withdraw(first, amount)
                        .map(|change| (-delta(&change), Decimal::ZERO, amount)),
                    Op::Transfer(_, amount) => ledger
                        .transfer(first, second, amount)
                        .map(|receipt| {
                            (-delta(&receipt.withdrawal), delta(&receipt.deposit), amount)
                        }),
                };

                prop_assert!(a.balance() >= Decimal::ZERO);
                prop_assert!(b.balance() >= Decimal::ZERO);
                match result {
                    Err(_) => {
                        prop_assert_eq!(before, (a.balance(), b.balance()));
                    }
                    Ok((debited, credited, amount)) => {
                        match op {
                            Op::Deposit(..) => {
                                prop_assert_eq!(credited, amount);
                            }
                            Op::Withdraw(..) => {
                                prop_assert_eq!(debited, amount);
                            }
                            Op::Transfer(..) => {
                                prop_assert_eq!(debited, amount);
                                prop_assert_eq!(credited, amount);
                            }
                        }
                    }
                }
            }
        }
    }
}
