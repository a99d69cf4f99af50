//! Central-bank (TCMB) daily exchange-rate bulletin.
//!
//! The bulletin is an XML document published on business days:
//!
//! ```xml
//! <Tarih_Date Tarih="17.10.2026" Date="10/17/2026" Bulten_No="2026/199">
//!   <Currency CrossOrder="0" Kod="USD" CurrencyCode="USD">
//!     <Unit>1</Unit>
//!     <ForexBuying>41.8461</ForexBuying>
//!     <ForexSelling>41.9215</ForexSelling>
//!   </Currency>
//! </Tarih_Date>
//! ```

use crate::domain::currency::{Currency, ExchangeRate, RateSource, RateTable};
use crate::domain::ports::RateFeed;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_FEED_URL: &str = "https://www.tcmb.gov.tr/kurlar";

#[derive(Debug, Deserialize)]
struct Bulletin {
    #[serde(rename = "@Tarih")]
    date: String,
    #[serde(rename = "Currency", default)]
    currencies: Vec<BulletinCurrency>,
}

#[derive(Debug, Deserialize)]
struct BulletinCurrency {
    #[serde(rename = "@CurrencyCode")]
    code: String,
    #[serde(rename = "Unit", default)]
    unit: String,
    #[serde(rename = "ForexBuying", default)]
    forex_buying: String,
    #[serde(rename = "ForexSelling", default)]
    forex_selling: String,
}

fn parse_decimal(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw).ok()
}

/// Parses a bulletin into a rate table of per-unit TRY prices.
///
/// Currencies without a forex buying or selling price are left out.
pub fn parse_bulletin(xml: &str) -> Result<RateTable> {
    let bulletin: Bulletin = quick_xml::de::from_str(xml)?;
    let published = NaiveDate::parse_from_str(bulletin.date.trim(), "%d.%m.%Y").map_err(|e| {
        LedgerError::validation(format!("Invalid bulletin date {:?}: {e}", bulletin.date))
    })?;

    let mut table = RateTable::new(RateSource::Feed(published));
    for entry in bulletin.currencies {
        let Ok(currency) = Currency::from_str(&entry.code) else {
            continue;
        };
        let unit = parse_decimal(&entry.unit).unwrap_or(Decimal::ONE);
        if unit.is_zero() {
            continue;
        }
        if let (Some(buying), Some(selling)) = (
            parse_decimal(&entry.forex_buying),
            parse_decimal(&entry.forex_selling),
        ) {
            table
                .rates
                .insert(currency, ExchangeRate::new(buying / unit, selling / unit));
        }
    }

    if table.rates.is_empty() {
        return Err(LedgerError::validation("Bulletin contains no rates"));
    }
    Ok(table)
}

/// Fetches bulletins over HTTP.
pub struct TcmbRateFeed {
    client: reqwest::Client,
    base_url: String,
}

impl TcmbRateFeed {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Bulletin URL for a date; today's bulletin has a fixed name.
    pub fn url_for(&self, date: NaiveDate, today: NaiveDate) -> String {
        if date == today {
            format!("{}/today.xml", self.base_url)
        } else {
            format!(
                "{}/{}/{}.xml",
                self.base_url,
                date.format("%Y%m"),
                date.format("%d%m%Y")
            )
        }
    }
}

#[async_trait]
impl RateFeed for TcmbRateFeed {
    async fn fetch(&self, date: NaiveDate) -> Result<RateTable> {
        let url = self.url_for(date, Local::now().date_naive());
        tracing::debug!(%url, "Fetching exchange-rate bulletin");

        let response = self.client.get(&url).send().await?.error_for_status()?;
        let body = response.text().await?;
        parse_bulletin(&body)
    }
}
