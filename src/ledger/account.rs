use std::fmt;

use chrono::{DateTime, Utc};
use rand_core::RngCore;
use serde::Serialize;
use sha2::{Digest, Sha256};

use super::error::LedgerError;
use super::nonce::Nonce;

pub type AccountId = String;

/// Display name used when an account is opened without one
pub const ANONYMOUS: &str = "anonymous";

const SALT_LEN: usize = 16;

/// Salted SHA-256 digest of an account password.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct PasswordDigest {
    salt: [u8; SALT_LEN],
    digest: [u8; 32],
}

impl PasswordDigest {
    pub(crate) fn new<R: RngCore + ?Sized>(password: &str, rng: &mut R) -> Result<Self, LedgerError> {
        let mut salt = [0u8; SALT_LEN];
        rng.try_fill_bytes(&mut salt)?;
        Ok(Self {
            salt,
            digest: Self::hash(&salt, password),
        })
    }

    /// Compares every byte regardless of where the first difference is.
    pub(crate) fn matches(&self, password: &str) -> bool {
        let candidate = Self::hash(&self.salt, password);
        candidate
            .iter()
            .zip(self.digest.iter())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
    }

    fn hash(salt: &[u8], password: &str) -> [u8; 32] {
        let mut hasher = Sha256::new();
        hasher.update(salt);
        hasher.update(password.as_bytes());
        hasher.finalize().into()
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(..)")
    }
}

/// A named balance holder with a password and a rotating nonce.
///
/// Serializes to `account,name,balance,created_at,updated_at`; the password
/// digest and the current nonce never leave the ledger that way.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Account {
    #[serde(rename = "account")]
    id: AccountId,
    #[serde(skip)]
    password: PasswordDigest,
    name: String,
    balance: i64,
    #[serde(skip)]
    nonce: Nonce,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Account {
    pub(super) fn new(
        id: AccountId,
        password: PasswordDigest,
        name: String,
        balance: i64,
        nonce: Nonce,
        now: DateTime<Utc>,
    ) -> Self {
        debug_assert!(balance >= 0, "account opened with negative balance");
        Self {
            id,
            password,
            name,
            balance,
            nonce,
            created_at: now,
            updated_at: now,
        }
    }

    /// Returns the account identifier
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Returns the display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the current balance
    pub fn balance(&self) -> i64 {
        self.balance
    }

    /// Returns the nonce that must be presented for the next authorized call
    pub fn nonce(&self) -> &Nonce {
        &self.nonce
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub(super) fn verify_password(&self, password: &str) -> bool {
        self.password.matches(password)
    }

    pub(super) fn nonce_matches(&self, presented: &str) -> bool {
        self.nonce == presented
    }

    /// Balance after applying `delta`, without changing anything.
    pub(super) fn balance_after(&self, delta: i64) -> Result<i64, LedgerError> {
        let next = self
            .balance
            .checked_add(delta)
            .ok_or_else(|| LedgerError::BalanceOverflow {
                account: self.id.clone(),
            })?;
        if next < 0 {
            return Err(LedgerError::InsufficientBalance {
                account: self.id.clone(),
                available: self.balance,
                requested: delta.saturating_neg(),
            });
        }
        Ok(next)
    }

    /// Apply a delta already checked by [`Account::balance_after`].
    pub(super) fn set_balance(&mut self, balance: i64, now: DateTime<Utc>) {
        debug_assert!(balance >= 0, "negative balance on {}", self.id);
        self.balance = balance;
        self.updated_at = now;
    }

    pub(super) fn rotate_nonce(&mut self, nonce: Nonce, now: DateTime<Utc>) {
        self.nonce = nonce;
        self.updated_at = now;
    }
}
