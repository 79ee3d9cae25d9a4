use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::account::AccountId;
use super::error::LedgerError;
use super::is_blank;

pub type TransactionId = u64;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    Transfer,
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransactionKind::Deposit => write!(f, "deposit"),
            TransactionKind::Withdrawal => write!(f, "withdrawal"),
            TransactionKind::Transfer => write!(f, "transfer"),
        }
    }
}

/// Only `Success` is ever written; failed attempts are not logged.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TransactionState {
    Pending,
    Success,
    Failed,
}

/// Raw money-movement request as received from a caller.
///
/// This is the unvalidated form; [`Movement::try_from`] checks which of
/// `from` and `to` must be populated for `kind` and that `amount` is positive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionRequest {
    pub kind: TransactionKind,
    pub from: String,
    pub to: String,
    pub amount: i64,
}

impl TransactionRequest {
    pub fn deposit(to: impl Into<String>, amount: i64) -> Self {
        Self {
            kind: TransactionKind::Deposit,
            from: String::new(),
            to: to.into(),
            amount,
        }
    }

    pub fn withdrawal(from: impl Into<String>, amount: i64) -> Self {
        Self {
            kind: TransactionKind::Withdrawal,
            from: from.into(),
            to: String::new(),
            amount,
        }
    }

    pub fn transfer(from: impl Into<String>, to: impl Into<String>, amount: i64) -> Self {
        Self {
            kind: TransactionKind::Transfer,
            from: from.into(),
            to: to.into(),
            amount,
        }
    }
}

/// A validated money movement ready to be applied by the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Movement {
    Deposit { to: AccountId, amount: i64 },
    Withdrawal { from: AccountId, amount: i64 },
    Transfer { from: AccountId, to: AccountId, amount: i64 },
}

impl Movement {
    pub fn kind(&self) -> TransactionKind {
        match self {
            Movement::Deposit { .. } => TransactionKind::Deposit,
            Movement::Withdrawal { .. } => TransactionKind::Withdrawal,
            Movement::Transfer { .. } => TransactionKind::Transfer,
        }
    }

    pub fn amount(&self) -> i64 {
        match self {
            Movement::Deposit { amount, .. }
            | Movement::Withdrawal { amount, .. }
            | Movement::Transfer { amount, .. } => *amount,
        }
    }

    /// The account whose nonce authorizes this movement
    pub fn authenticating_account(&self) -> &str {
        match self {
            Movement::Deposit { to, .. } => to,
            Movement::Withdrawal { from, .. } | Movement::Transfer { from, .. } => from,
        }
    }
}

impl TryFrom<TransactionRequest> for Movement {
    type Error = LedgerError;

    fn try_from(request: TransactionRequest) -> Result<Self, Self::Error> {
        let TransactionRequest {
            kind,
            from,
            to,
            amount,
        } = request;
        let malformed = |field| LedgerError::MalformedOperation { kind, field };

        let movement = match kind {
            TransactionKind::Deposit => {
                if !is_blank(&from) {
                    return Err(malformed("from"));
                }
                if is_blank(&to) {
                    return Err(malformed("to"));
                }
                Movement::Deposit { to, amount }
            }
            TransactionKind::Withdrawal => {
                if is_blank(&from) {
                    return Err(malformed("from"));
                }
                if !is_blank(&to) {
                    return Err(malformed("to"));
                }
                Movement::Withdrawal { from, amount }
            }
            TransactionKind::Transfer => {
                if is_blank(&from) {
                    return Err(malformed("from"));
                }
                if is_blank(&to) || to == from {
                    return Err(malformed("to"));
                }
                Movement::Transfer { from, to, amount }
            }
        };

        if amount <= 0 {
            return Err(LedgerError::NonPositiveAmount { amount });
        }
        Ok(movement)
    }
}

impl fmt::Display for Movement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Movement::Deposit { to, amount } => write!(f, "[deposit] to={to} amount={amount}"),
            Movement::Withdrawal { from, amount } => {
                write!(f, "[withdrawal] from={from} amount={amount}")
            }
            Movement::Transfer { from, to, amount } => {
                write!(f, "[transfer] from={from} to={to} amount={amount}")
            }
        }
    }
}

/// An immutable record of a committed balance change.
#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Transaction {
    id: TransactionId,
    kind: TransactionKind,
    from: Option<AccountId>,
    to: Option<AccountId>,
    amount: i64,
    state: TransactionState,
    created_at: DateTime<Utc>,
}

impl Transaction {
    pub(super) fn committed(id: TransactionId, movement: Movement, now: DateTime<Utc>) -> Self {
        let kind = movement.kind();
        let (from, to, amount) = match movement {
            Movement::Deposit { to, amount } => (None, Some(to), amount),
            Movement::Withdrawal { from, amount } => (Some(from), None, amount),
            Movement::Transfer { from, to, amount } => (Some(from), Some(to), amount),
        };
        Self {
            id,
            kind,
            from,
            to,
            amount,
            state: TransactionState::Success,
            created_at: now,
        }
    }

    pub fn id(&self) -> TransactionId {
        self.id
    }

    pub fn kind(&self) -> TransactionKind {
        self.kind
    }

    /// Source account, `None` for deposits
    pub fn from(&self) -> Option<&str> {
        self.from.as_deref()
    }

    /// Destination account, `None` for withdrawals
    pub fn to(&self) -> Option<&str> {
        self.to.as_deref()
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }

    pub fn state(&self) -> TransactionState {
        self.state
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Whether this transaction credited or debited `account`
    pub fn touches(&self, account: &str) -> bool {
        self.from() == Some(account) || self.to() == Some(account)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_deposit() {
        let movement = Movement::try_from(TransactionRequest::deposit("a", 10)).unwrap();
        assert_eq!(
            movement,
            Movement::Deposit {
                to: "a".to_owned(),
                amount: 10
            }
        );
        assert_eq!(movement.authenticating_account(), "a");
    }

    #[test]
    fn test_deposit_rejects_source() {
        let mut request = TransactionRequest::deposit("a", 10);
        request.from = "b".to_owned();
        assert_eq!(
            Movement::try_from(request).unwrap_err(),
            LedgerError::MalformedOperation {
                kind: TransactionKind::Deposit,
                field: "from"
            }
        );
    }

    #[test]
    fn test_deposit_requires_destination() {
        let err = Movement::try_from(TransactionRequest::deposit("  ", 10)).unwrap_err();
        assert!(matches!(
            err,
            LedgerError::MalformedOperation { field: "to", .. }
        ));
    }

    #[test]
    fn test_withdrawal_rejects_destination() {
        let mut request = TransactionRequest::withdrawal("a", 10);
        request.to = "b".to_owned();
        assert!(matches!(
            Movement::try_from(request).unwrap_err(),
            LedgerError::MalformedOperation {
                kind: TransactionKind::Withdrawal,
                field: "to"
            }
        ));
    }

    #[test]
    fn test_transfer_requires_both_sides() {
        assert!(matches!(
            Movement::try_from(TransactionRequest::transfer("", "b", 10)).unwrap_err(),
            LedgerError::MalformedOperation { field: "from", .. }
        ));
        assert!(matches!(
            Movement::try_from(TransactionRequest::transfer("a", "", 10)).unwrap_err(),
            LedgerError::MalformedOperation { field: "to", .. }
        ));
    }

    #[test]
    fn test_transfer_to_self_is_malformed() {
        assert!(matches!(
            Movement::try_from(TransactionRequest::transfer("a", "a", 10)).unwrap_err(),
            LedgerError::MalformedOperation { field: "to", .. }
        ));
    }

    #[test]
    fn test_rejects_zero_and_negative_amount() {
        assert_eq!(
            Movement::try_from(TransactionRequest::withdrawal("a", 0)).unwrap_err(),
            LedgerError::NonPositiveAmount { amount: 0 }
        );
        assert_eq!(
            Movement::try_from(TransactionRequest::transfer("a", "b", -5)).unwrap_err(),
            LedgerError::NonPositiveAmount { amount: -5 }
        );
    }

    #[test]
    fn test_shape_is_checked_before_amount() {
        let err = Movement::try_from(TransactionRequest::deposit("", -1)).unwrap_err();
        assert!(matches!(err, LedgerError::MalformedOperation { .. }));
    }

    #[test]
    fn test_committed_transfer_touches_both_accounts() {
        let movement = Movement::try_from(TransactionRequest::transfer("a", "b", 7)).unwrap();
        let tx = Transaction::committed(3, movement, Utc::now());

        assert_eq!(tx.id(), 3);
        assert_eq!(tx.kind(), TransactionKind::Transfer);
        assert_eq!(tx.state(), TransactionState::Success);
        assert!(tx.touches("a"));
        assert!(tx.touches("b"));
        assert!(!tx.touches("c"));
    }

    #[test]
    fn test_committed_deposit_has_no_source() {
        let movement = Movement::try_from(TransactionRequest::deposit("a", 7)).unwrap();
        let tx = Transaction::committed(1, movement, Utc::now());
        assert_eq!(tx.from(), None);
        assert_eq!(tx.to(), Some("a"));
    }
}
