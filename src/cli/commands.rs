pub(crate) use clap::Parser;
use std::path::PathBuf;

use nonce_ledger::{DEFAULT_NONCE_LEN, DEFAULT_SESSION_TTL_SECS};

#[derive(Parser, Debug)]
#[command(
    name = "nonce-ledger",
    author,
    version,
    about = "Replay account scripts against an in-memory nonce-guarded ledger",
    long_about = None,
    after_help = "OUTPUT:\n    Final accounts are printed to stdout in CSV format.\n    Use shell redirection to save to a file:\n\n    nonce-ledger script.csv > accounts.csv"
)]
pub struct Args {
    /// Path to the input script CSV file
    #[arg(
        index = 1,
        value_name = "FILE",
        help = "Input CSV file with columns: type, account, to, amount, password, name"
    )]
    pub input_file: PathBuf,

    /// Bytes of entropy per nonce
    #[arg(long, default_value_t = DEFAULT_NONCE_LEN)]
    pub nonce_len: usize,

    /// Session lifetime in seconds, at most one day
    #[arg(long, value_name = "SECS", default_value_t = DEFAULT_SESSION_TTL_SECS)]
    pub session_ttl: i64,

    /// Also print this account's transaction history after the accounts
    #[arg(long, value_name = "ACCOUNT")]
    pub history: Option<String>,
}
