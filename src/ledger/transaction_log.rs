use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::Utc;
use parking_lot::{RwLock, RwLockWriteGuard};

use super::transaction::{Movement, Transaction, TransactionId};

/// Append-only store of committed transactions.
///
/// Records are appended by [`Ledger`](super::Ledger) while it holds the
/// account lock; there is no public append:
///
/// ```compile_fail
/// use nonce_ledger::{Movement, TransactionLog, TransactionRequest};
///
/// let movement = Movement::try_from(TransactionRequest::deposit("a", 1)).unwrap();
/// TransactionLog::new().append(movement);
/// ```
#[derive(Debug)]
pub struct TransactionLog {
    records: RwLock<HashMap<TransactionId, Transaction>>,
    /// Next identifier to hand out; only advanced while `records` is write-locked
    next_id: AtomicU64,
}

impl Default for TransactionLog {
    fn default() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }
}

impl TransactionLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a committed movement under the log's own lock.
    #[cfg(test)]
    pub(crate) fn append(&self, movement: Movement) -> Transaction {
        self.write().append(movement)
    }

    pub fn get(&self, id: TransactionId) -> Option<Transaction> {
        self.records.read().get(&id).cloned()
    }

    /// Records for `ids` in the given order; unknown identifiers are skipped.
    pub fn get_many(&self, ids: &[TransactionId]) -> Vec<Transaction> {
        let records = self.records.read();
        ids.iter()
            .filter_map(|id| records.get(id).cloned())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Exclusive access for appends that must commit with other state.
    pub(crate) fn write(&self) -> LogMut<'_> {
        LogMut {
            records: self.records.write(),
            next_id: &self.next_id,
        }
    }
}

/// Exclusive view over the log; the lock is released on drop.
pub(crate) struct LogMut<'a> {
    records: RwLockWriteGuard<'a, HashMap<TransactionId, Transaction>>,
    next_id: &'a AtomicU64,
}

impl LogMut<'_> {
    /// Assign the next identifier, stamp and store the record. Never fails.
    pub(crate) fn append(&mut self, movement: Movement) -> Transaction {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        debug_assert!(
            !self.records.contains_key(&id),
            "transaction id {id} assigned twice"
        );
        let transaction = Transaction::committed(id, movement, Utc::now());
        self.records.insert(id, transaction.clone());
        log::trace!("[log] appended tx={id}");
        transaction
    }
}
