use crate::application::backoffice::Backoffice;
use crate::application::dto::{AccountData, TransactionData};
use crate::domain::account::{Account, AccountType};
use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::Amount;
use crate::domain::transaction::TransactionType;
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    /// Opens a bank account, with `amount` as the opening balance.
    Open,
    Income,
    Expense,
    /// Moves `amount` from `account` to `target`.
    Transfer,
}

/// One line of a ledger file.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LedgerEntry {
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub tx: u64,
    pub account: String,
    pub amount: Option<Decimal>,
    /// Currency of `amount`; defaults to the account's own.
    pub currency: Option<Currency>,
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    pub applied: usize,
    pub skipped: usize,
    pub opened: usize,
}

/// Applies ledger entries for one tenant, looking accounts up by name.
pub struct LedgerImporter<'a> {
    office: &'a Backoffice,
    tenant: TenantId,
    date: NaiveDate,
    accounts: HashMap<String, EntityId>,
    seen: HashSet<u64>,
    summary: ImportSummary,
}

impl<'a> LedgerImporter<'a> {
    /// Prepares an import dated `date`. Accounts already stored for the
    /// tenant can be referenced by name.
    pub async fn new(office: &'a Backoffice, tenant: TenantId, date: NaiveDate) -> Result<Self> {
        let accounts = office
            .accounts
            .list(tenant)
            .await?
            .into_iter()
            .map(|account| (account.name, account.id))
            .collect();
        Ok(Self {
            office,
            tenant,
            date,
            accounts,
            seen: HashSet::new(),
            summary: ImportSummary::default(),
        })
    }

    fn account_id(&self, name: &str) -> Result<EntityId> {
        self.accounts
            .get(name.trim())
            .copied()
            .ok_or_else(|| LedgerError::validation(format!("Unknown account {:?}", name.trim())))
    }

    async fn account(&self, name: &str) -> Result<Account> {
        self.office.accounts.find(self.tenant, self.account_id(name)?).await
    }

    async fn open(&mut self, entry: &LedgerEntry) -> Result<()> {
        let name = entry.account.trim();
        if self.accounts.contains_key(name) {
            return Err(LedgerError::validation(format!("Account {name:?} already exists")));
        }
        let data = AccountData {
            name: name.to_string(),
            account_type: AccountType::BankAccount,
            currency: entry.currency.unwrap_or_default(),
            balance: entry.amount.unwrap_or_default(),
            card: None,
            is_active: true,
        };
        let account = self.office.accounts.create(self.tenant, &data).await?;
        self.accounts.insert(account.name.clone(), account.id);
        self.summary.opened += 1;
        Ok(())
    }

    async fn post(&self, entry: &LedgerEntry, transaction_type: TransactionType) -> Result<()> {
        let account = self.account(&entry.account).await?;
        let amount = entry
            .amount
            .ok_or_else(|| LedgerError::validation(format!("Entry {} has no amount", entry.tx)))?;
        let amount = Amount::new(amount)?.value();
        let amount = match entry.currency {
            Some(currency) if currency != account.currency => {
                self.office
                    .currency
                    .convert(amount, currency, account.currency, self.date)
                    .await?
            }
            _ => amount,
        };
        let destination_account_id = match transaction_type {
            TransactionType::Transfer => {
                let target = entry
                    .target
                    .as_deref()
                    .ok_or_else(|| LedgerError::validation(format!("Transfer {} has no target", entry.tx)))?;
                Some(self.account_id(target)?)
            }
            _ => None,
        };
        let data = TransactionData {
            account_id: account.id,
            destination_account_id,
            transaction_type,
            category: Some("import".into()),
            amount,
            date: self.date,
            description: Some(format!("tx {}", entry.tx)),
            customer_id: None,
            installments: None,
            billing_period: None,
        };
        self.office.transactions.create(self.tenant, &data).await?;
        Ok(())
    }

    /// Applies one entry. Transaction ids may appear only once per import.
    pub async fn apply(&mut self, entry: &LedgerEntry) -> Result<()> {
        if self.seen.contains(&entry.tx) {
            return Err(LedgerError::validation(format!("Duplicate transaction id {}", entry.tx)));
        }
        match entry.kind {
            EntryKind::Open => self.open(entry).await?,
            EntryKind::Income => self.post(entry, TransactionType::Income).await?,
            EntryKind::Expense => self.post(entry, TransactionType::Expense).await?,
            EntryKind::Transfer => self.post(entry, TransactionType::Transfer).await?,
        }
        self.seen.insert(entry.tx);
        debug!(tx = entry.tx, kind = ?entry.kind, "entry applied");
        Ok(())
    }

    /// Applies every entry in order. Unreadable or rejected entries are
    /// logged and skipped; storage failures abort the import.
    pub async fn run<I>(mut self, entries: I) -> Result<ImportSummary>
    where
        I: IntoIterator<Item = Result<LedgerEntry>>,
    {
        for (index, entry) in entries.into_iter().enumerate() {
            let line = index + 2;
            let outcome = match entry {
                Ok(entry) => self.apply(&entry).await,
                Err(e) => Err(e),
            };
            match outcome {
                Ok(()) => self.summary.applied += 1,
                Err(e @ (LedgerError::InternalError(_) | LedgerError::IoError(_))) => return Err(e),
                Err(e) => {
                    warn!(line, error = %e, "skipping ledger entry");
                    self.summary.skipped += 1;
                }
            }
        }
        info!(
            tenant = %self.tenant,
            applied = self.summary.applied,
            skipped = self.summary.skipped,
            opened = self.summary.opened,
            "ledger import finished"
        );
        Ok(self.summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::infrastructure::static_rates::StaticRateFeed;
    use crate::infrastructure::telegram::LogNotifier;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    const TENANT: TenantId = TenantId(1);

    fn office() -> Backoffice {
        let config = AppConfig {
            rate_lookback_days: 0,
            ..AppConfig::default()
        };
        Backoffice::in_memory(Arc::new(StaticRateFeed), Arc::new(LogNotifier), &config)
    }

    fn entry(kind: EntryKind, tx: u64, account: &str, amount: Option<Decimal>) -> LedgerEntry {
        LedgerEntry {
            kind,
            tx,
            account: account.into(),
            amount,
            currency: None,
            target: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    async fn balances(office: &Backoffice) -> Vec<(String, Decimal)> {
        office
            .accounts
            .list(TENANT)
            .await
            .unwrap()
            .into_iter()
            .map(|a| (a.name, a.balance.value()))
            .collect()
    }

    #[tokio::test]
    async fn test_import_applies_entries_in_order() {
        let office = office();
        let mut usd = entry(EntryKind::Income, 3, "Main", Some(dec!(10)));
        usd.currency = Some(Currency::USD);
        let mut transfer = entry(EntryKind::Transfer, 5, "Main", Some(dec!(100)));
        transfer.target = Some("Savings".into());
        let entries = vec![
            Ok(entry(EntryKind::Open, 1, "Main", Some(dec!(1000)))),
            Ok(entry(EntryKind::Open, 2, "Savings", None)),
            Ok(usd),
            Ok(entry(EntryKind::Expense, 4, "Main", Some(dec!(250)))),
            Ok(transfer),
        ];

        let importer = LedgerImporter::new(&office, TENANT, date()).await.unwrap();
        let summary = importer.run(entries).await.unwrap();

        assert_eq!(
            summary,
            ImportSummary {
                applied: 5,
                skipped: 0,
                opened: 2
            }
        );
        assert_eq!(
            balances(&office).await,
            vec![("Main".to_string(), dec!(1068.00)), ("Savings".to_string(), dec!(100))]
        );
    }

    #[tokio::test]
    async fn test_bad_entries_are_skipped() {
        let office = office();
        let entries = vec![
            Ok(entry(EntryKind::Open, 1, "Main", Some(dec!(50)))),
            Ok(entry(EntryKind::Open, 2, "Main", None)),
            Ok(entry(EntryKind::Income, 1, "Main", Some(dec!(5)))),
            Ok(entry(EntryKind::Income, 3, "Nowhere", Some(dec!(5)))),
            Ok(entry(EntryKind::Expense, 4, "Main", Some(dec!(-5)))),
            Ok(entry(EntryKind::Transfer, 5, "Main", Some(dec!(5)))),
            Err(LedgerError::validation("unreadable")),
            Ok(entry(EntryKind::Income, 6, "Main", Some(dec!(7.5)))),
        ];

        let importer = LedgerImporter::new(&office, TENANT, date()).await.unwrap();
        let summary = importer.run(entries).await.unwrap();

        assert_eq!(summary.applied, 2);
        assert_eq!(summary.skipped, 6);
        assert_eq!(balances(&office).await, vec![("Main".to_string(), dec!(57.5))]);
    }

    #[tokio::test]
    async fn test_existing_accounts_are_found_by_name() {
        let office = office();
        let first = LedgerImporter::new(&office, TENANT, date()).await.unwrap();
        first
            .run(vec![Ok(entry(EntryKind::Open, 1, "Main", Some(dec!(10))))])
            .await
            .unwrap();

        let second = LedgerImporter::new(&office, TENANT, date()).await.unwrap();
        let summary = second
            .run(vec![Ok(entry(EntryKind::Income, 1, "Main", Some(dec!(5))))])
            .await
            .unwrap();

        assert_eq!(summary.applied, 1);
        assert_eq!(balances(&office).await, vec![("Main".to_string(), dec!(15))]);
    }
}
