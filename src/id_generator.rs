use std::{
    collections::HashSet,
    sync::{
        Mutex, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use uuid::Uuid;

use crate::account::AccountId;

pub const SEQUENTIAL_PREFIX: &str = "ACC";
pub const RANDOM_PREFIX: &str = "ACCT-";
pub const DEFAULT_SEQUENCE_START: u64 = 1000;

/// Source of fresh account ids. Implementations must never hand out the same id twice
/// within the process lifetime.
pub trait AccountIdGenerator: Send + Sync {
    fn next_id(&self) -> AccountId;
}

impl<F> AccountIdGenerator for F
where
    F: Fn() -> AccountId + Send + Sync,
{
    fn next_id(&self) -> AccountId {
        self()
    }
}

/// Produces `ACC001001`, `ACC001002`, ...
///
/// The counter is incremented before formatting, so a generator starting at 1000
/// issues `ACC001001` first.
#[derive(Debug)]
pub struct SequentialIdGenerator {
    counter: AtomicU64,
}

impl SequentialIdGenerator {
    pub fn starting_at(start: u64) -> Self {
        Self {
            counter: AtomicU64::new(start),
        }
    }
}

impl Default for SequentialIdGenerator {
    fn default() -> Self {
        Self::starting_at(DEFAULT_SEQUENCE_START)
    }
}

impl AccountIdGenerator for SequentialIdGenerator {
    fn next_id(&self) -> AccountId {
        let n = self.counter.fetch_add(1, Ordering::Relaxed) + 1;
        AccountId::new(format!("{SEQUENTIAL_PREFIX}{n:06}"))
    }
}

/// Checks the `ACC` + six digits shape produced by [`SequentialIdGenerator`].
pub fn is_valid_account_number(value: &str) -> bool {
    value.len() == SEQUENTIAL_PREFIX.len() + 6
        && value
            .strip_prefix(SEQUENTIAL_PREFIX)
            .is_some_and(|digits| digits.bytes().all(|b| b.is_ascii_digit()))
}

/// Produces `ACCT-` followed by the first 8 hex digits of a v4 uuid, upper-cased.
///
/// Eight hex digits can collide, so every issued id is remembered and a clash is re-rolled.
#[derive(Debug, Default)]
pub struct RandomIdGenerator {
    issued: Mutex<HashSet<String>>,
}

impl AccountIdGenerator for RandomIdGenerator {
    fn next_id(&self) -> AccountId {
        let mut issued = self.issued.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            let token = Uuid::new_v4().simple().to_string();
            let candidate = format!("{RANDOM_PREFIX}{}", token[..8].to_uppercase());
            if issued.insert(candidate.clone()) {
                return AccountId::new(candidate);
            }
        }
    }
}
