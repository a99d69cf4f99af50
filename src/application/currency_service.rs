use crate::domain::currency::{Currency, RateTable};
use crate::domain::money::round_money;
use crate::domain::ports::RateFeed;
use crate::error::Result;
use crate::infrastructure::static_rates::fallback_table;
use chrono::{Datelike, Days, NaiveDate, Weekday};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Days walked back from the requested date before giving up on the feed.
pub const DEFAULT_LOOKBACK_DAYS: u32 = 12;

/// Exchange rates with day-by-day fallback.
///
/// Bulletins are memoised per date. When neither the requested day nor any of
/// the previous `lookback_days` days has a bulletin, the built-in table is used.
pub struct CurrencyService {
    feed: Arc<dyn RateFeed>,
    cache: RwLock<HashMap<NaiveDate, RateTable>>,
    lookback_days: u32,
    fallback: RateTable,
}

fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

impl CurrencyService {
    pub fn new(feed: Arc<dyn RateFeed>) -> Self {
        Self {
            feed,
            cache: RwLock::new(HashMap::new()),
            lookback_days: DEFAULT_LOOKBACK_DAYS,
            fallback: fallback_table(),
        }
    }

    pub fn with_lookback_days(mut self, days: u32) -> Self {
        self.lookback_days = days;
        self
    }

    /// The rate table in effect on `date`.
    pub async fn rates_for(&self, date: NaiveDate) -> RateTable {
        let cached = self.cache.read().await.get(&date).cloned();
        if let Some(table) = cached {
            return table;
        }

        for offset in 0..=self.lookback_days {
            let Some(day) = date.checked_sub_days(Days::new(offset.into())) else {
                break;
            };
            if is_weekend(day) {
                continue;
            }
            let cached = self.cache.read().await.get(&day).cloned();
            if let Some(table) = cached {
                self.cache.write().await.insert(date, table.clone());
                return table;
            }
            match self.feed.fetch(day).await {
                Ok(table) => {
                    let mut cache = self.cache.write().await;
                    cache.insert(day, table.clone());
                    cache.insert(date, table.clone());
                    return table;
                }
                Err(e) => {
                    tracing::debug!(%day, error = %e, "No exchange-rate bulletin, trying previous day");
                }
            }
        }

        tracing::warn!(%date, lookback_days = self.lookback_days, "Falling back to built-in exchange rates");
        self.fallback.clone()
    }

    /// Price of one unit of `from` in `to` on `date`.
    ///
    /// Currencies missing from the day's bulletin are priced from the
    /// built-in table.
    pub async fn rate(&self, from: Currency, to: Currency, date: NaiveDate) -> Result<Decimal> {
        if from == to {
            return Ok(Decimal::ONE);
        }
        let table = self.rates_for(date).await;
        match table.cross_rate(from, to) {
            Ok(rate) => Ok(rate),
            Err(_) if !table.is_fallback() => {
                let mut merged = self.fallback.clone();
                merged.rates.extend(table.rates);
                merged.cross_rate(from, to)
            }
            Err(e) => Err(e),
        }
    }

    /// Converts `amount` and rounds the result to money scale.
    pub async fn convert(&self, amount: Decimal, from: Currency, to: Currency, date: NaiveDate) -> Result<Decimal> {
        let rate = self.rate(from, to, date).await?;
        Ok(round_money(amount * rate))
    }

    pub async fn to_try(&self, amount: Decimal, from: Currency, date: NaiveDate) -> Result<Decimal> {
        self.convert(amount, from, Currency::TRY, date).await
    }

    /// Number of dates currently memoised.
    pub async fn cached_dates(&self) -> usize {
        self.cache.read().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::currency::{ExchangeRate, RateSource};
    use crate::error::LedgerError;
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Serves bulletins for the listed dates and records every request.
    struct ScriptedFeed {
        published: HashSet<NaiveDate>,
        requests: Mutex<Vec<NaiveDate>>,
    }

    impl ScriptedFeed {
        fn new(published: &[NaiveDate]) -> Arc<Self> {
            Arc::new(Self {
                published: published.iter().copied().collect(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<NaiveDate> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl RateFeed for ScriptedFeed {
        async fn fetch(&self, date: NaiveDate) -> Result<RateTable> {
            self.requests.lock().unwrap().push(date);
            if self.published.contains(&date) {
                Ok(RateTable::new(RateSource::Feed(date))
                    .with_rate(Currency::USD, ExchangeRate::new(dec!(40), dec!(40.2)))
                    .with_rate(Currency::EUR, ExchangeRate::new(dec!(46), dec!(46.2))))
            } else {
                Err(LedgerError::validation("no bulletin"))
            }
        }
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_weekend_uses_friday_without_fetching_weekend() {
        // 2026-10-16 is a Friday
        let feed = ScriptedFeed::new(&[date(2026, 10, 16)]);
        let service = CurrencyService::new(feed.clone());

        let table = service.rates_for(date(2026, 10, 18)).await;
        assert_eq!(table.source, RateSource::Feed(date(2026, 10, 16)));
        assert_eq!(feed.requests(), vec![date(2026, 10, 16)]);
    }

    #[tokio::test]
    async fn test_holiday_walks_back() {
        // Thursday 2026-10-29 is a public holiday
        let feed = ScriptedFeed::new(&[date(2026, 10, 28)]);
        let service = CurrencyService::new(feed.clone());

        let table = service.rates_for(date(2026, 10, 29)).await;
        assert_eq!(table.source, RateSource::Feed(date(2026, 10, 28)));
        assert_eq!(feed.requests(), vec![date(2026, 10, 29), date(2026, 10, 28)]);
    }

    #[tokio::test]
    async fn test_cache_prevents_refetch() {
        let feed = ScriptedFeed::new(&[date(2026, 10, 16)]);
        let service = CurrencyService::new(feed.clone());

        service.rates_for(date(2026, 10, 16)).await;
        service.rates_for(date(2026, 10, 16)).await;
        // Saturday resolves to the cached Friday bulletin.
        service.rates_for(date(2026, 10, 17)).await;

        assert_eq!(feed.requests().len(), 1);
        assert_eq!(service.cached_dates().await, 2);
    }

    #[tokio::test]
    async fn test_fallback_after_lookback_exhausted() {
        let feed = ScriptedFeed::new(&[]);
        let service = CurrencyService::new(feed.clone()).with_lookback_days(3);

        let table = service.rates_for(date(2026, 10, 14)).await;
        assert!(table.is_fallback());
        // Wednesday back to Sunday: Sunday is skipped without a request.
        assert_eq!(
            feed.requests(),
            vec![date(2026, 10, 14), date(2026, 10, 13), date(2026, 10, 12)]
        );
    }

    #[tokio::test]
    async fn test_rate_formulas() {
        let feed = ScriptedFeed::new(&[date(2026, 10, 16)]);
        let service = CurrencyService::new(feed);
        let day = date(2026, 10, 16);

        assert_eq!(service.rate(Currency::USD, Currency::USD, day).await.unwrap(), Decimal::ONE);
        assert_eq!(service.rate(Currency::USD, Currency::TRY, day).await.unwrap(), dec!(40));
        assert_eq!(
            service.rate(Currency::TRY, Currency::EUR, day).await.unwrap(),
            Decimal::ONE / dec!(46.2)
        );
        assert_eq!(
            service.rate(Currency::EUR, Currency::USD, day).await.unwrap(),
            (dec!(46) / dec!(40)) / (dec!(40.2) / dec!(40.2))
        );
    }

    #[tokio::test]
    async fn test_missing_currency_priced_from_fallback() {
        let feed = ScriptedFeed::new(&[date(2026, 10, 16)]);
        let service = CurrencyService::new(feed);

        let rate = service
            .rate(Currency::GBP, Currency::TRY, date(2026, 10, 16))
            .await
            .unwrap();
        assert_eq!(rate, fallback_table().get(Currency::GBP).unwrap().buying);
    }

    #[tokio::test]
    async fn test_convert_rounds_to_money_scale() {
        let feed = ScriptedFeed::new(&[date(2026, 10, 16)]);
        let service = CurrencyService::new(feed);

        let converted = service
            .convert(dec!(100), Currency::TRY, Currency::USD, date(2026, 10, 16))
            .await
            .unwrap();
        assert_eq!(converted, dec!(2.49));
    }

    #[tokio::test]
    async fn test_unknown_currency_is_error() {
        let feed = ScriptedFeed::new(&[date(2026, 10, 16)]);
        let service = CurrencyService::new(feed);
        let result = service
            .rate("XYZ".parse().unwrap(), Currency::TRY, date(2026, 10, 16))
            .await;
        assert!(result.is_err());
    }
}
