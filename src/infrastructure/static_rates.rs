use crate::domain::currency::{Currency, ExchangeRate, RateSource, RateTable};
use crate::domain::ports::RateFeed;
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal_macros::dec;

/// Built-in TRY prices used when no bulletin can be found.
pub fn fallback_table() -> RateTable {
    let rate = |code: &str| code.parse::<Currency>().unwrap_or_default();
    RateTable::new(RateSource::Fallback)
        .with_rate(Currency::USD, ExchangeRate::new(dec!(41.80), dec!(41.90)))
        .with_rate(Currency::EUR, ExchangeRate::new(dec!(48.60), dec!(48.70)))
        .with_rate(Currency::GBP, ExchangeRate::new(dec!(55.90), dec!(56.20)))
        .with_rate(rate("CHF"), ExchangeRate::new(dec!(52.30), dec!(52.60)))
        .with_rate(rate("JPY"), ExchangeRate::new(dec!(0.2770), dec!(0.2790)))
        .with_rate(rate("SAR"), ExchangeRate::new(dec!(11.10), dec!(11.20)))
        .with_rate(rate("AUD"), ExchangeRate::new(dec!(27.20), dec!(27.40)))
        .with_rate(rate("CAD"), ExchangeRate::new(dec!(29.80), dec!(30.00)))
        .with_rate(rate("RUB"), ExchangeRate::new(dec!(0.5100), dec!(0.5200)))
        .with_rate(rate("CNY"), ExchangeRate::new(dec!(5.85), dec!(5.90)))
}

/// A feed that never goes to the network and always answers with the
/// built-in table.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticRateFeed;

#[async_trait]
impl RateFeed for StaticRateFeed {
    async fn fetch(&self, _date: NaiveDate) -> Result<RateTable> {
        Ok(fallback_table())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_table_covers_common_currencies() {
        let table = fallback_table();
        assert!(table.is_fallback());
        for code in ["USD", "EUR", "GBP", "CHF", "JPY", "SAR", "AUD", "CAD", "RUB", "CNY"] {
            let rate = table.get(code.parse().unwrap()).unwrap();
            assert!(rate.selling >= rate.buying, "{code} spread is inverted");
        }
    }
}
