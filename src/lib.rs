/// Account entity: identity, owner and balance.
/// The balance can only be changed through [`ledger`].
pub mod account;

/// Typed transaction intents, plus parsing them from loosely typed input.
pub mod command;

/// Error taxonomy shared by the ledger layers.
pub mod error;

/// Account id generation, injected into [`ledger::LedgerService`].
pub mod id_generator;

/// Validated deposit, withdraw and transfer operations, single-threaded
/// over `&mut Account` and lock-based over shared handles.
pub mod ledger;

/// Transaction processor interface, plus "in memory" implementation
/// that keeps accounts by id.
pub mod processor;

/// Bootstraps the core from a CSV script. Kept in the library so the
/// integration tests can drive it.
pub mod bin_utils;
