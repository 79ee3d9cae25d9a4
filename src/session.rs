use chrono::{DateTime, Duration, Utc};

use crate::ledger::{AccountId, ConfigError, Ledger, Nonce, SessionError, Transaction};

/// Lifetime of a session unless configured otherwise
pub const DEFAULT_SESSION_TTL_SECS: i64 = 5 * 60;

/// Longest lifetime a session may be configured with.
pub const MAX_SESSION_TTL_SECS: i64 = 24 * 60 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    pub ttl: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::seconds(DEFAULT_SESSION_TTL_SECS),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ttl <= Duration::zero() {
            return Err(ConfigError::NonPositiveTtl);
        }
        if self.ttl > Duration::seconds(MAX_SESSION_TTL_SECS) {
            return Err(ConfigError::TtlTooLong {
                max_secs: MAX_SESSION_TTL_SECS,
            });
        }
        Ok(())
    }

    /// Expiry of a session opened at `now`.
    fn expiry_from(&self, now: DateTime<Utc>) -> Result<DateTime<Utc>, ConfigError> {
        self.validate()?;
        now.checked_add_signed(self.ttl)
            .ok_or(ConfigError::TtlTooLong {
                max_secs: MAX_SESSION_TTL_SECS,
            })
    }
}

/// A short-lived credential for one account.
///
/// Holds the account's current nonce and swaps in the nonce returned by each
/// successful money movement, so callers never handle nonces themselves.
/// Expiry is a property of the session only; the ledger knows nothing of it.
#[derive(Debug)]
pub struct Session<'a> {
    ledger: &'a Ledger,
    account: AccountId,
    nonce: Nonce,
    expires_at: DateTime<Utc>,
}

impl<'a> Session<'a> {
    /// Log in with a password, invalidating any earlier session of the account.
    pub fn open(
        ledger: &'a Ledger,
        account: &str,
        password: &str,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        // a bad config must not spend the account's current nonce
        config.validate()?;
        let nonce = ledger.issue_nonce(account, password)?;
        Self::resume(ledger, account, nonce, config)
    }

    /// Wrap a nonce obtained elsewhere, e.g. the one assigned at account opening.
    pub fn resume(
        ledger: &'a Ledger,
        account: &str,
        nonce: Nonce,
        config: &SessionConfig,
    ) -> Result<Self, SessionError> {
        let expires_at = config.expiry_from(Utc::now())?;
        log::debug!("[session] opened for account={account}");
        Ok(Self {
            ledger,
            account: account.to_owned(),
            nonce,
            expires_at,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    fn ensure_live(&self) -> Result<(), SessionError> {
        if self.is_expired_at(Utc::now()) {
            return Err(SessionError::Expired {
                account: self.account.clone(),
            });
        }
        Ok(())
    }

    pub fn balance(&self) -> Result<i64, SessionError> {
        self.ensure_live()?;
        self.ledger.verify_nonce(&self.account, self.nonce.as_str())?;
        Ok(self.ledger.balance(&self.account)?)
    }

    pub fn history(&self) -> Result<Vec<Transaction>, SessionError> {
        self.ensure_live()?;
        self.ledger.verify_nonce(&self.account, self.nonce.as_str())?;
        Ok(self.ledger.history(&self.account)?)
    }

    pub fn deposit(&mut self, amount: i64) -> Result<Transaction, SessionError> {
        self.ensure_live()?;
        let receipt = self
            .ledger
            .deposit(&self.account, amount, self.nonce.as_str())?;
        self.nonce = receipt.nonce;
        Ok(receipt.transaction)
    }

    pub fn withdraw(&mut self, amount: i64) -> Result<Transaction, SessionError> {
        self.ensure_live()?;
        let receipt = self
            .ledger
            .withdraw(&self.account, amount, self.nonce.as_str())?;
        self.nonce = receipt.nonce;
        Ok(receipt.transaction)
    }

    pub fn transfer(&mut self, to: &str, amount: i64) -> Result<Transaction, SessionError> {
        self.ensure_live()?;
        let receipt = self
            .ledger
            .transfer(&self.account, to, amount, self.nonce.as_str())?;
        self.nonce = receipt.nonce;
        Ok(receipt.transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::LedgerError;

    fn ledger_with(accounts: &[(&str, i64)]) -> Ledger {
        let ledger = Ledger::new();
        for (id, balance) in accounts {
            ledger
                .create_account_with_id(id, "pwd", "", *balance)
                .unwrap();
        }
        ledger
    }

    #[test]
    fn test_session_threads_nonces() {
        let ledger = ledger_with(&[("a", 100), ("b", 0)]);
        let config = SessionConfig::default();
        let mut session = Session::open(&ledger, "a", "pwd", &config).unwrap();

        session.deposit(50).unwrap();
        session.withdraw(20).unwrap();
        session.transfer("b", 30).unwrap();

        assert_eq!(session.balance().unwrap(), 100);
        assert_eq!(session.history().unwrap().len(), 3);
        assert_eq!(ledger.balance("b").unwrap(), 30);
    }

    #[test]
    fn test_new_login_invalidates_old_session() {
        let ledger = ledger_with(&[("a", 100)]);
        let config = SessionConfig::default();
        let mut first = Session::open(&ledger, "a", "pwd", &config).unwrap();
        let _second = Session::open(&ledger, "a", "pwd", &config).unwrap();

        assert_eq!(
            first.deposit(1).unwrap_err(),
            SessionError::Ledger(LedgerError::Verification)
        );
        assert_eq!(
            first.balance().unwrap_err(),
            SessionError::Ledger(LedgerError::Verification)
        );
    }

    #[test]
    fn test_wrong_password_opens_nothing() {
        let ledger = ledger_with(&[("a", 100)]);
        let err = Session::open(&ledger, "a", "nope", &SessionConfig::default()).unwrap_err();
        assert_eq!(err, SessionError::Ledger(LedgerError::Verification));
    }

    #[test]
    fn test_expired_session_is_refused() {
        let ledger = ledger_with(&[("a", 100)]);
        let config = SessionConfig {
            ttl: Duration::milliseconds(1),
        };
        let mut session = Session::open(&ledger, "a", "pwd", &config).unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));

        assert!(session.is_expired_at(Utc::now()));
        assert!(matches!(
            session.deposit(10).unwrap_err(),
            SessionError::Expired { .. }
        ));
        assert_eq!(ledger.balance("a").unwrap(), 100);
    }

    #[test]
    fn test_is_expired_at_boundary() {
        let ledger = ledger_with(&[("a", 1)]);
        let session = Session::open(&ledger, "a", "pwd", &SessionConfig::default()).unwrap();

        assert!(!session.is_expired_at(session.expires_at() - Duration::seconds(1)));
        assert!(session.is_expired_at(session.expires_at()));
    }

    #[test]
    fn test_config_rejects_non_positive_ttl() {
        let config = SessionConfig {
            ttl: Duration::zero(),
        };
        assert_eq!(config.validate(), Err(ConfigError::NonPositiveTtl));
        assert!(SessionConfig::default().validate().is_ok());
    }

    #[test]
    fn test_config_rejects_ttl_beyond_cap() {
        let at_cap = SessionConfig {
            ttl: Duration::seconds(MAX_SESSION_TTL_SECS),
        };
        assert!(at_cap.validate().is_ok());

        let config = SessionConfig {
            ttl: Duration::try_seconds(9_000_000_000_000).unwrap(),
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TtlTooLong {
                max_secs: MAX_SESSION_TTL_SECS
            })
        );
    }

    #[test]
    fn test_huge_ttl_is_an_error_not_a_panic() {
        let ledger = ledger_with(&[("a", 100)]);
        let initial = ledger.account("a").unwrap().nonce().clone();
        let config = SessionConfig {
            ttl: Duration::try_seconds(9_000_000_000_000).unwrap(),
        };

        assert!(matches!(
            Session::open(&ledger, "a", "pwd", &config).unwrap_err(),
            SessionError::Config(ConfigError::TtlTooLong { .. })
        ));
        // the refused login left the current nonce valid
        ledger.verify_nonce("a", initial.as_str()).unwrap();

        assert!(matches!(
            Session::resume(&ledger, "a", initial, &config).unwrap_err(),
            SessionError::Config(ConfigError::TtlTooLong { .. })
        ));
    }

    #[test]
    fn test_expiry_overflow_is_reported() {
        let config = SessionConfig {
            ttl: Duration::seconds(MAX_SESSION_TTL_SECS),
        };
        assert_eq!(
            config.expiry_from(DateTime::<Utc>::MAX_UTC),
            Err(ConfigError::TtlTooLong {
                max_secs: MAX_SESSION_TTL_SECS
            })
        );
    }
}
