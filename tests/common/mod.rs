#![allow(dead_code)]

use assert_cmd::cargo_bin;
use std::path::Path;
use std::process::Command;

pub const LEDGER_HEADER: [&str; 6] = ["type", "tx", "account", "amount", "currency", "target"];

/// Writes a ledger file with the standard header followed by `rows`.
pub fn write_ledger(path: &Path, rows: &[[&str; 6]]) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new().from_path(path)?;
    wtr.write_record(LEDGER_HEADER)?;
    for row in rows {
        wtr.write_record(row)?;
    }
    wtr.flush()?;
    Ok(())
}

/// The binary with a clean configuration, priced offline.
pub fn ledgerdesk() -> Command {
    let mut cmd = Command::new(cargo_bin!("ledgerdesk"));
    cmd.arg("--offline")
        .env_remove("LEDGER_DB_PATH")
        .env_remove("TELEGRAM_BOT_TOKEN")
        .env_remove("TELEGRAM_CHAT_ID")
        .env_remove("RUST_LOG");
    cmd
}
