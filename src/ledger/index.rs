use std::collections::HashMap;

use parking_lot::RwLock;

use super::account::AccountId;
use super::transaction::TransactionId;

/// Per-account list of transaction identifiers in commit order.
///
/// Lives behind its own lock so history readers never wait on the account
/// store or the log. A query sees every append completed before it started.
#[derive(Debug, Default)]
pub struct AccountTransactionIndex {
    entries: RwLock<HashMap<AccountId, Vec<TransactionId>>>,
}

impl AccountTransactionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&self, account: &str, id: TransactionId) {
        let mut entries = self.entries.write();
        match entries.get_mut(account) {
            Some(ids) => ids.push(id),
            None => {
                entries.insert(account.to_owned(), vec![id]);
            }
        }
    }

    /// Snapshot of the identifiers recorded for `account`, empty if none.
    pub fn query(&self, account: &str) -> Vec<TransactionId> {
        self.entries
            .read()
            .get(account)
            .cloned()
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_account_is_empty() {
        let index = AccountTransactionIndex::new();
        assert!(index.query("a").is_empty());
    }

    #[test]
    fn test_keeps_insertion_order() {
        let index = AccountTransactionIndex::new();
        index.record("a", 5);
        index.record("a", 2);
        index.record("b", 3);
        index.record("a", 9);

        assert_eq!(index.query("a"), [5, 2, 9]);
        assert_eq!(index.query("b"), [3]);
    }

    #[test]
    fn test_query_is_a_snapshot() {
        let index = AccountTransactionIndex::new();
        index.record("a", 1);
        let before = index.query("a");
        index.record("a", 2);

        assert_eq!(before, [1]);
        assert_eq!(index.query("a"), [1, 2]);
    }
}
