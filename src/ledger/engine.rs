use std::io::Write;

use super::account::Account;
use super::account_store::AccountStore;
use super::config::LedgerConfig;
use super::error::{ConfigError, Error, LedgerError};
use super::index::AccountTransactionIndex;
use super::is_blank;
use super::nonce::{Nonce, NonceGenerator};
use super::transaction::{Movement, Transaction, TransactionId, TransactionRequest};
use super::transaction_log::TransactionLog;

/// A committed transaction together with the nonce for the caller's next request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub transaction: Transaction,
    pub nonce: Nonce,
}

/// The ledger engine.
///
/// Owns the account store, the transaction log and the per-account index,
/// and implements account opening, nonce issuance and money movement on top
/// of them. All operations are synchronous and safe to call from many
/// threads through a shared reference.
#[derive(Debug, Default)]
pub struct Ledger {
    accounts: AccountStore,
    transactions: TransactionLog,
    index: AccountTransactionIndex,
    nonces: NonceGenerator,
}

impl Ledger {
    /// Create an empty `Ledger` with the default configuration
    pub fn new() -> Self {
        log::trace!("Ledger initialized");
        Self::default()
    }

    pub fn with_config(config: LedgerConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        log::trace!("Ledger initialized with nonce_len={}", config.nonce_len);
        Ok(Self {
            nonces: NonceGenerator::new(config.nonce_len),
            ..Self::default()
        })
    }

    /// Open an account under a freshly generated identifier.
    pub fn create_account(
        &self,
        password: &str,
        name: &str,
        balance: i64,
    ) -> Result<Account, LedgerError> {
        let id = uuid::Uuid::new_v4().to_string();
        self.create_account_with_id(&id, password, name, balance)
    }

    /// Open an account under a caller-chosen identifier.
    pub fn create_account_with_id(
        &self,
        id: &str,
        password: &str,
        name: &str,
        balance: i64,
    ) -> Result<Account, LedgerError> {
        self.accounts.create(id, password, name, balance, &self.nonces)
    }

    /// Exchange (account, password) for a fresh nonce.
    pub fn issue_nonce(&self, account: &str, password: &str) -> Result<Nonce, LedgerError> {
        self.accounts.issue_nonce(account, password, &self.nonces)
    }

    pub fn balance(&self, account: &str) -> Result<i64, LedgerError> {
        self.accounts.balance(account)
    }

    /// Snapshot of an account
    pub fn account(&self, account: &str) -> Option<Account> {
        self.accounts.get(account)
    }

    /// Check that `nonce` is the current nonce of `account` without consuming it.
    pub fn verify_nonce(&self, account: &str, nonce: &str) -> Result<(), LedgerError> {
        if is_blank(account) {
            return Err(LedgerError::EmptyAccount);
        }
        if is_blank(nonce) {
            return Err(LedgerError::EmptyNonce);
        }
        self.accounts.verify(account, nonce)
    }

    pub fn deposit(&self, to: &str, amount: i64, nonce: &str) -> Result<Receipt, LedgerError> {
        self.execute(TransactionRequest::deposit(to, amount), nonce)
    }

    pub fn withdraw(&self, from: &str, amount: i64, nonce: &str) -> Result<Receipt, LedgerError> {
        self.execute(TransactionRequest::withdrawal(from, amount), nonce)
    }

    pub fn transfer(
        &self,
        from: &str,
        to: &str,
        amount: i64,
        nonce: &str,
    ) -> Result<Receipt, LedgerError> {
        self.execute(TransactionRequest::transfer(from, to, amount), nonce)
    }

    /// Validate and commit a money movement.
    ///
    /// Checks run in a fixed order: request shape, amount, nonce presence,
    /// then account and nonce match (once optimistically, again under the
    /// lock), then balance. The account store and log stay write-locked from
    /// the re-check until the index is updated.
    pub fn execute(&self, request: TransactionRequest, nonce: &str) -> Result<Receipt, LedgerError> {
        let movement = Movement::try_from(request)?;
        if is_blank(nonce) {
            return Err(LedgerError::EmptyNonce);
        }
        log::trace!("Processing movement: {movement}");

        self.accounts
            .verify(movement.authenticating_account(), nonce)?;

        // Lock order: accounts, then log.
        let mut accounts = self.accounts.write();
        let mut records = self.transactions.write();

        let next_nonce = match &movement {
            Movement::Deposit { to, amount } => {
                accounts.apply_delta(to, *amount, nonce, &self.nonces)?
            }
            Movement::Withdrawal { from, amount } => {
                accounts.apply_delta(from, -*amount, nonce, &self.nonces)?
            }
            Movement::Transfer { from, to, amount } => {
                accounts.transfer(from, to, *amount, nonce, &self.nonces)?
            }
        };

        let transaction = records.append(movement);
        for account in [transaction.from(), transaction.to()].into_iter().flatten() {
            self.index.record(account, transaction.id());
        }

        log::trace!(
            "[{}] tx={} amount={} committed",
            transaction.kind(),
            transaction.id(),
            transaction.amount()
        );
        Ok(Receipt {
            transaction,
            nonce: next_nonce,
        })
    }

    /// Transactions that credited or debited `account`, in commit order.
    pub fn history(&self, account: &str) -> Result<Vec<Transaction>, LedgerError> {
        if is_blank(account) {
            return Err(LedgerError::EmptyAccount);
        }
        if !self.accounts.contains(account) {
            return Err(LedgerError::AccountNotFound {
                account: account.to_owned(),
            });
        }
        let ids = self.index.query(account);
        Ok(self.transactions.get_many(&ids))
    }

    pub fn transaction(&self, id: TransactionId) -> Option<Transaction> {
        self.transactions.get(id)
    }

    /// Returns the number of accounts in the ledger
    pub fn account_count(&self) -> usize {
        self.accounts.len()
    }

    /// Returns the number of committed transactions
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Write all accounts, sorted by identifier, to any sink as CSV.
    /// The CSV writer is buffered already, so don't wrap `writer` in a `BufWriter`.
    pub fn export_accounts<W: Write>(&self, writer: W) -> Result<(), Error> {
        let accounts = self.accounts.snapshot();
        log::info!("Exporting {} accounts", accounts.len());

        let mut csv_writer = csv::Writer::from_writer(writer);
        for account in &accounts {
            csv_writer.serialize(account)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Write the history of `account` to any sink as CSV.
    pub fn export_history<W: Write>(&self, account: &str, writer: W) -> Result<(), Error> {
        let history = self.history(account)?;
        log::info!("Exporting {} transactions for {account}", history.len());

        let mut csv_writer = csv::Writer::from_writer(writer);
        for transaction in &history {
            csv_writer.serialize(transaction)?;
        }
        csv_writer.flush()?;
        Ok(())
    }
}
