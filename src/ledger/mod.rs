//! Ledger engine module.
//!
//! This module contains the core ledger logic including:
//! - `Ledger` - The engine tying the stores together
//! - `AccountStore` - Concurrent account state and the balance mutation primitive
//! - `TransactionLog` - Append-only record of committed transactions
//! - `AccountTransactionIndex` - Per-account history lookup
//! - `NonceGenerator` - Single-use credentials
//! - `Error` types - Validation and verification errors

mod account;
mod account_store;
mod config;
mod engine;
mod error;
mod index;
mod nonce;
mod transaction;
mod transaction_log;

pub use account::{Account, AccountId, ANONYMOUS};
pub use account_store::AccountStore;
pub use config::LedgerConfig;
pub use engine::{Ledger, Receipt};
pub use error::{ConfigError, Error, LedgerError, ScriptError, SessionError};
pub use index::AccountTransactionIndex;
pub use nonce::{Nonce, NonceGenerator, DEFAULT_NONCE_LEN};
pub use transaction::{
    Movement, Transaction, TransactionId, TransactionKind, TransactionRequest, TransactionState,
};
pub use transaction_log::TransactionLog;

/// Empty after trimming spaces.
pub(crate) fn is_blank(s: &str) -> bool {
    s.trim_matches(' ').is_empty()
}
