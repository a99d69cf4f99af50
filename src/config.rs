use crate::error::{LedgerError, Result};
use crate::infrastructure::tcmb::DEFAULT_FEED_URL;
use rust_decimal::Decimal;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Telegram bot credentials; both values are needed to send anything.
#[derive(Debug, Clone, PartialEq)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
}

/// Runtime configuration loaded from environment variables.
///
/// | Env Var                       | Default                          |
/// |-------------------------------|----------------------------------|
/// | `LEDGER_RATE_FEED_URL`        | `https://www.tcmb.gov.tr/kurlar` |
/// | `LEDGER_RATE_LOOKBACK_DAYS`   | `12`                             |
/// | `LEDGER_MIN_PAYMENT_THRESHOLD`| `50000`                          |
/// | `LEDGER_HTTP_TIMEOUT_SECS`    | `10`                             |
/// | `LEDGER_DB_PATH`              | unset (in-memory storage)        |
/// | `TELEGRAM_BOT_TOKEN`          | unset                            |
/// | `TELEGRAM_CHAT_ID`            | unset                            |
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub rate_feed_url: String,
    pub rate_lookback_days: u32,
    /// Credit limit up to which the lower minimum-payment ratio applies.
    pub min_payment_threshold: Decimal,
    pub http_timeout: Duration,
    pub db_path: Option<PathBuf>,
    pub telegram: Option<TelegramConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rate_feed_url: DEFAULT_FEED_URL.to_string(),
            rate_lookback_days: 12,
            min_payment_threshold: Decimal::from(50_000),
            http_timeout: Duration::from_secs(10),
            db_path: None,
            telegram: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from the process environment with defaults.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let value = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let rate_feed_url = value("LEDGER_RATE_FEED_URL").unwrap_or(defaults.rate_feed_url);
        let rate_lookback_days = parse_or("LEDGER_RATE_LOOKBACK_DAYS", value("LEDGER_RATE_LOOKBACK_DAYS"), defaults.rate_lookback_days)?;
        let min_payment_threshold = parse_or(
            "LEDGER_MIN_PAYMENT_THRESHOLD",
            value("LEDGER_MIN_PAYMENT_THRESHOLD"),
            defaults.min_payment_threshold,
        )?;
        let http_timeout = Duration::from_secs(parse_or(
            "LEDGER_HTTP_TIMEOUT_SECS",
            value("LEDGER_HTTP_TIMEOUT_SECS"),
            defaults.http_timeout.as_secs(),
        )?);
        let db_path = value("LEDGER_DB_PATH").map(PathBuf::from);
        let telegram = match (value("TELEGRAM_BOT_TOKEN"), value("TELEGRAM_CHAT_ID")) {
            (Some(bot_token), Some(chat_id)) => Some(TelegramConfig { bot_token, chat_id }),
            _ => None,
        };

        Ok(Self {
            rate_feed_url,
            rate_lookback_days,
            min_payment_threshold,
            http_timeout,
            db_path,
            telegram,
        })
    }
}

fn parse_or<T: FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T> {
    match raw {
        Some(raw) => raw
            .parse()
            .map_err(|_| LedgerError::ConfigError(format!("{key} has an invalid value: {raw:?}"))),
        None => Ok(default),
    }
}
