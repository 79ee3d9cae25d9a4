mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::Args;
use nonce_ledger::{Ledger, LedgerConfig, SessionConfig, Teller};

fn main() -> Result<()> {
    // Parse the CLI arguments
    let args = Args::parse();

    // Initialize logger with default level of info (can be overridden with RUST_LOG)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    // 1. Initialize the Ledger and the session settings
    let ledger = Ledger::with_config(LedgerConfig {
        nonce_len: args.nonce_len,
    })
    .context("Invalid ledger configuration")?;

    let ttl = chrono::Duration::try_seconds(args.session_ttl)
        .context("Session ttl is out of range")?;
    let session_config = SessionConfig { ttl };
    session_config
        .validate()
        .context("Invalid session configuration")?;

    // 2. Open and replay the input script
    log::info!("Replaying script from {}", args.input_file.display());
    let file = std::fs::File::open(&args.input_file)
        .with_context(|| format!("Failed to open input file: {}", args.input_file.display()))?;

    let mut teller = Teller::new(&ledger, session_config);
    teller.replay(file).context("Failed to replay script")?;

    // 3. Export the accounts (and optionally one history) to stdout
    ledger
        .export_accounts(std::io::stdout())
        .context("Failed to export accounts to stdout")?;

    if let Some(account) = &args.history {
        ledger
            .export_history(account, std::io::stdout())
            .with_context(|| format!("Failed to export history of {account}"))?;
    }

    log::info!("Export complete");

    Ok(())
}
