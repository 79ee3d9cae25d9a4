use crate::ledger::account::AccountId;
use crate::ledger::transaction::TransactionKind;

/// Top-level error type for script replay and export.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),
    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

/// Malformed script rows (hard errors, replay stops).
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("row {row}: `{kind}` requires column `{column}`")]
    MissingColumn {
        row: u64,
        kind: &'static str,
        column: &'static str,
    },
}

/// Errors returned by ledger operations.
///
/// Every variant is terminal for the call that produced it and no state
/// has been changed when one is returned.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum LedgerError {
    #[error("account is empty")]
    EmptyAccount,

    #[error("password is empty")]
    EmptyPassword,

    #[error("nonce is empty")]
    EmptyNonce,

    #[error("account {account} already exists")]
    AccountExists { account: AccountId },

    #[error("account {account} not found")]
    AccountNotFound { account: AccountId },

    /// Bad password, unknown account, or stale/mismatched nonce.
    #[error("account or credential is not correct")]
    Verification,

    #[error("amount must be positive, got {amount}")]
    NonPositiveAmount { amount: i64 },

    #[error("insufficient balance: account {account} has {available}, requested {requested}")]
    InsufficientBalance {
        account: AccountId,
        available: i64,
        requested: i64,
    },

    #[error("balance of account {account} would overflow")]
    BalanceOverflow { account: AccountId },

    #[error("{kind}: `{field}` account is not correct")]
    MalformedOperation {
        kind: TransactionKind,
        field: &'static str,
    },

    #[error("could not generate nonce: {0}")]
    EntropyUnavailable(String),
}

impl From<rand_core::Error> for LedgerError {
    fn from(err: rand_core::Error) -> Self {
        LedgerError::EntropyUnavailable(err.to_string())
    }
}

/// Invalid ledger or session configuration.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("nonce length must be at least one byte")]
    ZeroNonceLength,

    #[error("session ttl must be positive")]
    NonPositiveTtl,

    #[error("session ttl must not exceed {max_secs} seconds")]
    TtlTooLong { max_secs: i64 },
}

/// Errors raised by the session layer on top of the ledger.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("session for account {account} has expired")]
    Expired { account: AccountId },

    #[error("no session for account {account}")]
    NotLoggedIn { account: AccountId },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Ledger(#[from] LedgerError),
}
