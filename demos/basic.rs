//! Basic example of using the `Ledger`.
//!
//! Run with: `cargo run --example basic`

use nonce_ledger::{Ledger, SessionConfig, Teller};
use std::io::Cursor;

fn main() {
    // Initialize logger (optional, but shows what's happening)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // Sample script as CSV
    let script = r"type,account,to,amount,password,name
open,alice,,100,alice-pwd,Alice
open,bob,,10,bob-pwd,Bob
deposit,alice,,50,,
withdraw,alice,,30,,
transfer,alice,bob,70,,
withdraw,bob,,500,,
login,bob,,,bob-pwd,
withdraw,bob,,20,,
";

    // Create ledger and replay the script
    let ledger = Ledger::new();
    let mut teller = Teller::new(&ledger, SessionConfig::default());
    let summary = teller
        .replay(Cursor::new(script))
        .expect("Failed to replay script");
    println!(
        "applied {} rows, skipped {}",
        summary.applied, summary.skipped
    );

    // Export results to stdout
    println!("\n=== Final Account State ===");
    ledger
        .export_accounts(std::io::stdout())
        .expect("Failed to export accounts");

    println!("\n=== History of bob ===");
    ledger
        .export_history("bob", std::io::stdout())
        .expect("Failed to export history");
}
