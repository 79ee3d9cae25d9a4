use std::collections::HashMap;
use std::io::Read;

use serde::Deserialize;

use crate::ledger::{AccountId, Error, Ledger, ScriptError, SessionError};
use crate::session::{Session, SessionConfig};

/// Raw script row as parsed from CSV input.
///
/// Columns: `type,account,to,amount,password,name`. Which ones are required
/// depends on `type`; see [`ScriptStep::parse`].
#[derive(Debug, Deserialize, Clone)]
pub struct ScriptRecord {
    #[serde(rename = "type")]
    pub kind: ScriptKind,
    pub account: String,
    pub to: Option<String>,
    pub amount: Option<i64>,
    pub password: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ScriptKind {
    Open,
    Login,
    Deposit,
    Withdraw,
    Transfer,
}

impl ScriptKind {
    fn as_str(self) -> &'static str {
        match self {
            ScriptKind::Open => "open",
            ScriptKind::Login => "login",
            ScriptKind::Deposit => "deposit",
            ScriptKind::Withdraw => "withdraw",
            ScriptKind::Transfer => "transfer",
        }
    }
}

/// A script row with every column its type needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    Open {
        account: AccountId,
        password: String,
        name: String,
        balance: i64,
    },
    Login {
        account: AccountId,
        password: String,
    },
    Deposit {
        account: AccountId,
        amount: i64,
    },
    Withdraw {
        account: AccountId,
        amount: i64,
    },
    Transfer {
        account: AccountId,
        to: AccountId,
        amount: i64,
    },
}

impl ScriptStep {
    pub fn parse(row: u64, record: ScriptRecord) -> Result<Self, ScriptError> {
        let kind = record.kind.as_str();
        let missing = |column| ScriptError::MissingColumn { row, kind, column };
        let ScriptRecord {
            account,
            to,
            amount,
            password,
            name,
            ..
        } = record;

        let step = match record.kind {
            ScriptKind::Open => ScriptStep::Open {
                account,
                password: password.unwrap_or_default(),
                name: name.unwrap_or_default(),
                balance: amount.ok_or_else(|| missing("amount"))?,
            },
            ScriptKind::Login => ScriptStep::Login {
                account,
                password: password.unwrap_or_default(),
            },
            ScriptKind::Deposit => ScriptStep::Deposit {
                account,
                amount: amount.ok_or_else(|| missing("amount"))?,
            },
            ScriptKind::Withdraw => ScriptStep::Withdraw {
                account,
                amount: amount.ok_or_else(|| missing("amount"))?,
            },
            ScriptKind::Transfer => ScriptStep::Transfer {
                account,
                to: to.ok_or_else(|| missing("to"))?,
                amount: amount.ok_or_else(|| missing("amount"))?,
            },
        };
        Ok(step)
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplaySummary {
    pub applied: u64,
    pub skipped: u64,
}

/// Replays account scripts against a [`Ledger`], one session per account.
#[derive(Debug)]
pub struct Teller<'a> {
    ledger: &'a Ledger,
    config: SessionConfig,
    sessions: HashMap<AccountId, Session<'a>>,
}

impl<'a> Teller<'a> {
    pub fn new(ledger: &'a Ledger, config: SessionConfig) -> Self {
        Self {
            ledger,
            config,
            sessions: HashMap::new(),
        }
    }

    /// Replay a CSV script from any source (File, `TcpStream`, etc.)
    /// The CSV reader is buffered already, so don't wrap `reader` in a `BufReader`.
    ///
    /// Malformed rows abort the replay. Rows the ledger rejects are logged
    /// and skipped.
    pub fn replay<R: Read>(&mut self, reader: R) -> Result<ReplaySummary, Error> {
        log::info!("Starting script replay");

        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let mut summary = ReplaySummary::default();
        for result in csv_reader.deserialize() {
            let record: ScriptRecord = result?;
            let row = summary.applied + summary.skipped + 1;
            log::trace!(
                "[row {row}] Parsing: type={:?} account={}",
                record.kind,
                record.account
            );

            let step = ScriptStep::parse(row, record)?;
            if let Err(e) = self.apply(step) {
                log::warn!("[row {row}] - Skipped: {e}");
                summary.skipped += 1;
            } else {
                summary.applied += 1;
            }
        }

        log::info!(
            "Replay complete: {} applied, {} skipped, {} accounts",
            summary.applied,
            summary.skipped,
            self.ledger.account_count()
        );
        Ok(summary)
    }

    pub fn apply(&mut self, step: ScriptStep) -> Result<(), SessionError> {
        match step {
            ScriptStep::Open {
                account,
                password,
                name,
                balance,
            } => {
                let opened = self
                    .ledger
                    .create_account_with_id(&account, &password, &name, balance)?;
                let session =
                    Session::resume(self.ledger, &account, opened.nonce().clone(), &self.config)?;
                self.sessions.insert(account, session);
            }
            ScriptStep::Login { account, password } => {
                let session = Session::open(self.ledger, &account, &password, &self.config)?;
                self.sessions.insert(account, session);
            }
            ScriptStep::Deposit { account, amount } => {
                self.session(&account)?.deposit(amount)?;
            }
            ScriptStep::Withdraw { account, amount } => {
                self.session(&account)?.withdraw(amount)?;
            }
            ScriptStep::Transfer {
                account,
                to,
                amount,
            } => {
                self.session(&account)?.transfer(&to, amount)?;
            }
        }
        Ok(())
    }

    fn session(&mut self, account: &str) -> Result<&mut Session<'a>, SessionError> {
        self.sessions
            .get_mut(account)
            .ok_or_else(|| SessionError::NotLoggedIn {
                account: account.to_owned(),
            })
    }
}
