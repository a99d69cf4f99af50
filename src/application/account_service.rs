use crate::application::crud::CrudService;
use crate::application::dto::AccountData;
use crate::application::payment_service::PaymentService;
use crate::domain::account::Account;
use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::error::Result;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::warn;

pub struct AccountService {
    crud: CrudService<AccountData>,
    payments: Arc<PaymentService>,
}

impl AccountService {
    pub fn new(crud: CrudService<AccountData>, payments: Arc<PaymentService>) -> Self {
        Self { crud, payments }
    }

    pub async fn create(&self, tenant: TenantId, data: &AccountData) -> Result<Account> {
        self.crud.create(tenant, data).await
    }

    /// Edits the account's details; the balance only moves through the ledger.
    ///
    /// The row is rewritten whole, so the read and the write happen under the
    /// ledger lock.
    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &AccountData) -> Result<Account> {
        let _ledger = self.payments.lock().await;
        self.crud.update(tenant, id, data).await
    }

    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        let _ledger = self.payments.lock().await;
        let account = self.crud.find(tenant, id).await?;
        if !account.balance.value().is_zero() {
            warn!(account = id, balance = %account.balance, "closing an account that still holds a balance");
        }
        self.crud.delete(tenant, id).await
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<Account> {
        self.crud.find(tenant, id).await
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<Account>> {
        self.crud.list(tenant).await
    }

    /// Assets minus card debt, priced in `currency` at `date`.
    pub async fn net_worth(&self, tenant: TenantId, currency: Currency, date: NaiveDate) -> Result<Decimal> {
        let mut total = Decimal::ZERO;
        for account in self.crud.list(tenant).await? {
            let value = self
                .payments
                .currency()
                .convert(account.balance.value(), account.currency, currency, date)
                .await?;
            if account.is_credit_card() {
                total -= value;
            } else {
                total += value;
            }
        }
        Ok(total)
    }
}
