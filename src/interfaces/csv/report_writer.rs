use crate::application::credit_card::Statement;
use crate::domain::account::Account;
use crate::domain::currency::RateTable;
use crate::domain::money::round_money;
use crate::error::Result;
use std::io::Write;

/// Writes account balances and rate tables as CSV.
pub struct ReportWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    /// One `account,currency,balance` row per account, in the given order.
    pub fn write_balances(&mut self, accounts: &[Account]) -> Result<()> {
        self.writer.write_record(["account", "currency", "balance"])?;
        for account in accounts {
            let balance = round_money(account.balance.value()).normalize().to_string();
            self.writer
                .write_record([account.name.as_str(), account.currency.as_str(), balance.as_str()])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    pub fn write_rates(&mut self, table: &RateTable) -> Result<()> {
        self.writer.write_record(["currency", "buying", "selling"])?;
        for (currency, rate) in &table.rates {
            self.writer.write_record([
                currency.to_string(),
                rate.buying.normalize().to_string(),
                rate.selling.normalize().to_string(),
            ])?;
        }
        self.writer.flush()?;
        Ok(())
    }

    /// A header row followed by the statement's fields.
    pub fn write_statement(&mut self, statement: &Statement) -> Result<()> {
        self.writer.serialize(statement)?;
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::AccountType;
    use crate::domain::currency::{Currency, ExchangeRate, RateSource};
    use crate::domain::entity::TenantId;
    use crate::domain::money::Balance;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn written<F: FnOnce(&mut ReportWriter<&mut Vec<u8>>)>(write: F) -> String {
        let mut out = Vec::new();
        write(&mut ReportWriter::new(&mut out));
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_balances_are_rounded_and_normalized() {
        let mut main = Account::new(TenantId(1), "Main", AccountType::BankAccount, Currency::TRY);
        main.balance = Balance::new(dec!(1068.000));
        let mut wallet = Account::new(TenantId(1), "Wallet", AccountType::Cash, Currency::EUR);
        wallet.balance = Balance::new(dec!(-2.505));

        let text = written(|w| w.write_balances(&[main, wallet]).unwrap());
        assert_eq!(text, "account,currency,balance\nMain,TRY,1068\nWallet,EUR,-2.51\n");
    }

    #[test]
    fn test_rates_table() {
        let table = RateTable::new(RateSource::Fallback).with_rate(Currency::USD, ExchangeRate::new(dec!(41.80), dec!(41.90)));
        let text = written(|w| w.write_rates(&table).unwrap());
        assert_eq!(text, "currency,buying,selling\nUSD,41.8,41.9\n");
    }

    #[test]
    fn test_statement_row() {
        let statement = Statement {
            period_start: NaiveDate::from_ymd_opt(2026, 2, 15).unwrap(),
            statement_date: NaiveDate::from_ymd_opt(2026, 3, 15).unwrap(),
            due_date: NaiveDate::from_ymd_opt(2026, 3, 25).unwrap(),
            balance: dec!(1000),
            minimum_payment: dec!(200.00),
        };
        let text = written(|w| w.write_statement(&statement).unwrap());
        assert_eq!(
            text,
            "period_start,statement_date,due_date,balance,minimum_payment\n2026-02-15,2026-03-15,2026-03-25,1000,200.00\n"
        );
    }
}
