use crate::application::currency_service::CurrencyService;
use crate::application::payment_service::PaymentService;
use crate::domain::account::{Account, AccountType, CardDetails};
use crate::domain::currency::Currency;
use crate::domain::entity::{Entity, EntityId, TenantId};
use crate::domain::money::Balance;
use crate::domain::ports::{EntityStore, SharedStore};
use crate::domain::transaction::Transaction;
use crate::error::{LedgerError, Result};
use crate::infrastructure::in_memory::InMemoryStore;
use crate::infrastructure::static_rates::StaticRateFeed;
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

pub const TENANT: TenantId = TenantId(1);

pub struct Ledger {
    pub accounts: SharedStore<Account>,
    pub transactions: SharedStore<Transaction>,
    pub payments: Arc<PaymentService>,
}

impl Ledger {
    pub async fn balance(&self, id: EntityId) -> Decimal {
        self.accounts.get(id).await.unwrap().unwrap().balance.value()
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        let mut rows = self.transactions.get_all().await.unwrap();
        rows.sort_by_key(|tx| tx.id);
        rows
    }
}

/// In-memory stores priced with the built-in rate table.
pub fn ledger() -> Ledger {
    ledger_with(InMemoryStore::shared(), InMemoryStore::shared())
}

pub fn ledger_with(accounts: SharedStore<Account>, transactions: SharedStore<Transaction>) -> Ledger {
    let currency = Arc::new(CurrencyService::new(Arc::new(StaticRateFeed)).with_lookback_days(0));
    let payments = Arc::new(PaymentService::new(accounts.clone(), transactions.clone(), currency));
    Ledger {
        accounts,
        transactions,
        payments,
    }
}

pub async fn account(ledger: &Ledger, account_type: AccountType, currency: Currency, balance: Decimal) -> Account {
    let mut account = Account::new(TENANT, format!("{account_type:?}"), account_type, currency);
    account.balance = Balance::new(balance);
    ledger.accounts.insert(account).await.unwrap()
}

pub async fn bank_account(ledger: &Ledger, balance: Decimal) -> Account {
    account(ledger, AccountType::BankAccount, Currency::TRY, balance).await
}

pub async fn card_account(ledger: &Ledger, credit_limit: Decimal, statement_day: u32, due_day: u32) -> Account {
    let mut card = Account::new(TENANT, "Card", AccountType::CreditCard, Currency::TRY);
    card.card = Some(CardDetails {
        credit_limit,
        statement_day,
        due_day,
    });
    ledger.accounts.insert(card).await.unwrap()
}

/// In-memory store whose writes can be made to fail on demand.
pub struct FlakyStore<E> {
    inner: InMemoryStore<E>,
    /// Every insert fails while set.
    pub fail_inserts: AtomicBool,
    /// Updates of this id fail; 0 disables.
    pub fail_update_of: AtomicU64,
}

impl<E> Default for FlakyStore<E> {
    fn default() -> Self {
        Self {
            inner: InMemoryStore::new(),
            fail_inserts: AtomicBool::new(false),
            fail_update_of: AtomicU64::new(0),
        }
    }
}

fn storage_failure() -> LedgerError {
    LedgerError::InternalError("disk full".into())
}

#[async_trait]
impl<E: Entity> EntityStore<E> for FlakyStore<E> {
    async fn insert(&self, entity: E) -> Result<E> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(storage_failure());
        }
        self.inner.insert(entity).await
    }

    async fn update(&self, entity: E) -> Result<()> {
        if self.fail_update_of.load(Ordering::SeqCst) == entity.id() {
            return Err(storage_failure());
        }
        self.inner.update(entity).await
    }

    async fn get(&self, id: EntityId) -> Result<Option<E>> {
        self.inner.get(id).await
    }

    async fn remove(&self, id: EntityId) -> Result<bool> {
        self.inner.remove(id).await
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        self.inner.get_all().await
    }
}

/// In-memory store that answers every `get` after a delay, widening the
/// window between a read and the write that follows it.
pub struct SlowStore<E> {
    inner: InMemoryStore<E>,
    delay: Duration,
}

impl<E> SlowStore<E> {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for SlowStore<E> {
    async fn insert(&self, entity: E) -> Result<E> {
        self.inner.insert(entity).await
    }

    async fn update(&self, entity: E) -> Result<()> {
        self.inner.update(entity).await
    }

    async fn get(&self, id: EntityId) -> Result<Option<E>> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(id).await
    }

    async fn remove(&self, id: EntityId) -> Result<bool> {
        self.inner.remove(id).await
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        self.inner.get_all().await
    }
}
