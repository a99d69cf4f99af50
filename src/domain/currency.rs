use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// ISO-4217 alphabetic currency code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Currency([u8; 3]);

impl Currency {
    pub const TRY: Currency = Currency(*b"TRY");
    pub const USD: Currency = Currency(*b"USD");
    pub const EUR: Currency = Currency(*b"EUR");
    pub const GBP: Currency = Currency(*b"GBP");

    pub fn as_str(&self) -> &str {
        // Only ASCII uppercase letters are ever stored.
        std::str::from_utf8(&self.0).unwrap_or("???")
    }
}

impl Default for Currency {
    fn default() -> Self {
        Currency::TRY
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self> {
        let code = s.trim().to_ascii_uppercase();
        let bytes = code.as_bytes();
        if bytes.len() != 3 || !bytes.iter().all(u8::is_ascii_uppercase) {
            return Err(LedgerError::validation(format!(
                "Invalid currency code: {s:?}"
            )));
        }
        Ok(Currency([bytes[0], bytes[1], bytes[2]]))
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Currency {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Currency {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = String::deserialize(deserializer)?;
        code.parse().map_err(serde::de::Error::custom)
    }
}

/// Buying and selling price of one unit of a currency, expressed in TRY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub buying: Decimal,
    pub selling: Decimal,
}

impl ExchangeRate {
    pub fn new(buying: Decimal, selling: Decimal) -> Self {
        Self { buying, selling }
    }
}

/// Where a rate table came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "source", content = "published")]
pub enum RateSource {
    /// A central-bank bulletin published on the given day.
    Feed(NaiveDate),
    /// The built-in table used when no bulletin could be found.
    Fallback,
}

/// One day's rates against the base currency (TRY).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateTable {
    pub source: RateSource,
    pub rates: BTreeMap<Currency, ExchangeRate>,
}

impl RateTable {
    pub fn new(source: RateSource) -> Self {
        Self {
            source,
            rates: BTreeMap::new(),
        }
    }

    pub fn with_rate(mut self, currency: Currency, rate: ExchangeRate) -> Self {
        self.rates.insert(currency, rate);
        self
    }

    pub fn get(&self, currency: Currency) -> Option<&ExchangeRate> {
        self.rates.get(&currency)
    }

    pub fn is_fallback(&self) -> bool {
        self.source == RateSource::Fallback
    }

    fn require(&self, currency: Currency) -> Result<&ExchangeRate> {
        let rate = self.get(currency).ok_or_else(|| {
            LedgerError::validation(format!("No exchange rate for {currency}"))
        })?;
        if rate.buying.is_zero() || rate.selling.is_zero() {
            return Err(LedgerError::validation(format!(
                "Zero exchange rate for {currency}"
            )));
        }
        Ok(rate)
    }

    /// Price of one unit of `from` expressed in `to`.
    ///
    /// TRY is the base: TRY→X uses X's selling price, X→TRY its buying price,
    /// and any other pair is crossed through USD.
    pub fn cross_rate(&self, from: Currency, to: Currency) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        if from == Currency::TRY {
            return Ok(Decimal::ONE / self.require(to)?.selling);
        }
        if to == Currency::TRY {
            return Ok(self.require(from)?.buying);
        }
        let usd = self.require(Currency::USD)?;
        let from_rate = self.require(from)?;
        let to_rate = self.require(to)?;
        Ok((from_rate.buying / usd.buying) / (to_rate.selling / usd.selling))
    }
}
