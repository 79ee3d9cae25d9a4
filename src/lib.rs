//! An in-memory account ledger.
//!
//! Accounts are opened with a password and a positive balance. Every
//! authorized call presents the account's current nonce, and every successful
//! money movement consumes it and hands back the next one.
//!
//! ```
//! use nonce_ledger::Ledger;
//!
//! let ledger = Ledger::new();
//! ledger.create_account_with_id("alice", "secret", "Alice", 100).unwrap();
//!
//! let nonce = ledger.issue_nonce("alice", "secret").unwrap();
//! let receipt = ledger.deposit("alice", 50, nonce.as_str()).unwrap();
//! assert_eq!(ledger.balance("alice").unwrap(), 150);
//!
//! // the first nonce is spent
//! assert!(ledger.deposit("alice", 50, nonce.as_str()).is_err());
//! ledger.deposit("alice", 50, receipt.nonce.as_str()).unwrap();
//! ```

mod ledger;
mod session;
mod teller;

pub use ledger::*;
pub use session::{Session, SessionConfig, DEFAULT_SESSION_TTL_SECS, MAX_SESSION_TTL_SECS};
pub use teller::{ReplaySummary, ScriptKind, ScriptRecord, ScriptStep, Teller};
