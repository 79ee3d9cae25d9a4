use std::collections::HashMap;

use chrono::Utc;
use parking_lot::{RwLock, RwLockWriteGuard};
use rand_core::OsRng;

use super::account::{Account, AccountId, PasswordDigest, ANONYMOUS};
use super::error::LedgerError;
use super::is_blank;
use super::nonce::{Nonce, NonceGenerator};

/// Concurrent map from account identifier to account state.
///
/// Balances only change through [`Ledger`](super::Ledger), which also
/// records the transaction. The store offers no public mutation of its own:
///
/// ```compile_fail
/// use nonce_ledger::{AccountStore, NonceGenerator};
///
/// let store = AccountStore::new();
/// store.apply_delta("a", 10, "nonce", &NonceGenerator::default());
/// ```
#[derive(Debug, Default)]
pub struct AccountStore {
    accounts: RwLock<HashMap<AccountId, Account>>,
}

impl AccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a new account holding `balance`.
    ///
    /// Digest and nonce are produced before the store is locked, so an
    /// entropy failure never leaves a half-created account behind.
    pub fn create(
        &self,
        id: &str,
        password: &str,
        name: &str,
        balance: i64,
        nonces: &NonceGenerator,
    ) -> Result<Account, LedgerError> {
        if is_blank(id) {
            return Err(LedgerError::EmptyAccount);
        }
        if is_blank(password) {
            return Err(LedgerError::EmptyPassword);
        }
        let name = if is_blank(name) { ANONYMOUS } else { name };
        if balance <= 0 {
            return Err(LedgerError::NonPositiveAmount { amount: balance });
        }

        let digest = PasswordDigest::new(password, &mut OsRng)?;
        let nonce = nonces.generate()?;
        let account = Account::new(
            id.to_owned(),
            digest,
            name.to_owned(),
            balance,
            nonce,
            Utc::now(),
        );

        let mut accounts = self.accounts.write();
        if accounts.contains_key(id) {
            return Err(LedgerError::AccountExists {
                account: id.to_owned(),
            });
        }
        accounts.insert(id.to_owned(), account.clone());
        log::debug!("[create] account={id} balance={balance}");
        Ok(account)
    }

    /// Exchange a password for a fresh nonce, invalidating the previous one.
    pub fn issue_nonce(
        &self,
        id: &str,
        password: &str,
        nonces: &NonceGenerator,
    ) -> Result<Nonce, LedgerError> {
        if is_blank(id) {
            return Err(LedgerError::EmptyAccount);
        }
        if is_blank(password) {
            return Err(LedgerError::EmptyPassword);
        }

        let mut accounts = self.accounts.write();
        let account = accounts
            .get_mut(id)
            .filter(|account| account.verify_password(password))
            .ok_or(LedgerError::Verification)?;

        let nonce = nonces.generate()?;
        account.rotate_nonce(nonce.clone(), Utc::now());
        log::debug!("[nonce] issued for account={id}");
        Ok(nonce)
    }

    /// Current balance of `id`.
    pub fn balance(&self, id: &str) -> Result<i64, LedgerError> {
        if is_blank(id) {
            return Err(LedgerError::EmptyAccount);
        }
        self.accounts
            .read()
            .get(id)
            .map(Account::balance)
            .ok_or_else(|| LedgerError::AccountNotFound {
                account: id.to_owned(),
            })
    }

    /// Snapshot of one account
    pub fn get(&self, id: &str) -> Option<Account> {
        self.accounts.read().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.accounts.read().contains_key(id)
    }

    /// Probe whether `presented` is the current nonce of `id` under a read lock.
    ///
    /// The answer can be stale by the time the caller acts on it; mutations
    /// check again under the write lock.
    pub fn verify(&self, id: &str, presented: &str) -> Result<(), LedgerError> {
        self.accounts
            .read()
            .get(id)
            .filter(|account| account.nonce_matches(presented))
            .map(|_| ())
            .ok_or(LedgerError::Verification)
    }

    /// Single-account [`AccountsMut::apply_delta`] under its own lock.
    #[cfg(test)]
    pub(crate) fn apply_delta(
        &self,
        id: &str,
        delta: i64,
        presented: &str,
        nonces: &NonceGenerator,
    ) -> Result<Nonce, LedgerError> {
        self.write().apply_delta(id, delta, presented, nonces)
    }

    /// All accounts sorted by identifier.
    pub fn snapshot(&self) -> Vec<Account> {
        let mut accounts: Vec<Account> = self.accounts.read().values().cloned().collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        accounts
    }

    pub fn len(&self) -> usize {
        self.accounts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.read().is_empty()
    }

    /// Exclusive access for mutations that must validate and apply atomically.
    pub(crate) fn write(&self) -> AccountsMut<'_> {
        AccountsMut {
            accounts: self.accounts.write(),
        }
    }
}

/// Exclusive view over the account map; the lock is released on drop.
pub(crate) struct AccountsMut<'a> {
    accounts: RwLockWriteGuard<'a, HashMap<AccountId, Account>>,
}

impl AccountsMut<'_> {
    fn authenticated(&self, id: &str, presented: &str) -> Result<&Account, LedgerError> {
        self.accounts
            .get(id)
            .filter(|account| account.nonce_matches(presented))
            .ok_or(LedgerError::Verification)
    }

    /// Apply a signed delta to `id`, authorized by its current nonce.
    ///
    /// On success the balance is updated, the nonce rotated and the new
    /// nonce returned. On error nothing has changed.
    pub(crate) fn apply_delta(
        &mut self,
        id: &str,
        delta: i64,
        presented: &str,
        nonces: &NonceGenerator,
    ) -> Result<Nonce, LedgerError> {
        let balance = self.authenticated(id, presented)?.balance_after(delta)?;
        let nonce = nonces.generate()?;

        let now = Utc::now();
        let account = self
            .accounts
            .get_mut(id)
            .ok_or(LedgerError::Verification)?;
        account.set_balance(balance, now);
        account.rotate_nonce(nonce.clone(), now);
        Ok(nonce)
    }

    /// Move `amount` from `from` to `to`, authorized by the sender's nonce.
    ///
    /// Both legs are validated before either is applied. Only the sender's
    /// nonce rotates. A missing receiver is a verification failure.
    pub(crate) fn transfer(
        &mut self,
        from: &str,
        to: &str,
        amount: i64,
        presented: &str,
        nonces: &NonceGenerator,
    ) -> Result<Nonce, LedgerError> {
        let sender = self.authenticated(from, presented)?;
        let receiver = self.accounts.get(to).ok_or(LedgerError::Verification)?;
        let sender_balance = sender.balance_after(-amount)?;
        let receiver_balance = receiver.balance_after(amount)?;
        let nonce = nonces.generate()?;

        let now = Utc::now();
        if let Some(receiver) = self.accounts.get_mut(to) {
            receiver.set_balance(receiver_balance, now);
        }
        if let Some(sender) = self.accounts.get_mut(from) {
            sender.set_balance(sender_balance, now);
            sender.rotate_nonce(nonce.clone(), now);
        }
        Ok(nonce)
    }
}
