use crate::application::crud::CrudService;
use crate::application::dto::DebtData;
use crate::application::payment_service::{Payment, PaymentService, PaymentTarget};
use crate::domain::debt::{Debt, DebtStatus};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::Amount;
use crate::domain::ports::SharedStore;
use crate::domain::transaction::Transaction;
use crate::error::Result;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

/// Receivables and payables.
pub struct DebtService {
    crud: CrudService<DebtData>,
    payments: Arc<PaymentService>,
}

impl DebtService {
    pub fn new(store: SharedStore<Debt>, payments: Arc<PaymentService>) -> Self {
        Self {
            crud: CrudService::new(store),
            payments,
        }
    }

    pub async fn create(&self, tenant: TenantId, data: &DebtData) -> Result<Debt> {
        self.crud.create(tenant, data).await
    }

    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &DebtData) -> Result<Debt> {
        let _ledger = self.payments.lock().await;
        self.crud.update(tenant, id, data).await
    }

    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        let _ledger = self.payments.lock().await;
        self.crud.delete(tenant, id).await
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<Debt> {
        self.crud.find(tenant, id).await
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<Debt>> {
        self.crud.list(tenant).await
    }

    /// Settles part or all of a debt through `account_id`.
    ///
    /// `amount` is in the debt's currency. Receivables credit the account,
    /// payables debit it.
    pub async fn record_payment(
        &self,
        tenant: TenantId,
        id: EntityId,
        account_id: EntityId,
        amount: Amount,
        date: NaiveDate,
    ) -> Result<(Debt, Transaction)> {
        let ledger = self.payments.lock().await;
        let mut debt = self.crud.find(tenant, id).await?;
        debt.apply_payment(amount)?;

        let payment = Payment {
            account_id,
            amount,
            currency: debt.currency,
            date,
            description: Some(debt.description.clone()),
        };
        let target = PaymentTarget::Debt {
            id,
            direction: debt.direction,
        };
        let record = self.payments.pay_locked(&ledger, tenant, target, payment).await?;
        self.crud.save(&debt).await?;
        info!(debt = id, remaining = %debt.remaining, status = ?debt.status, "debt payment applied");
        Ok((debt, record))
    }

    /// Flags unpaid debts past their due date; returns the newly flagged ones.
    pub async fn mark_overdue(&self, tenant: TenantId, today: NaiveDate) -> Result<Vec<Debt>> {
        let _ledger = self.payments.lock().await;
        let mut flagged = Vec::new();
        for mut debt in self.crud.list(tenant).await? {
            if debt.status != DebtStatus::Overdue && debt.is_overdue_on(today) {
                debt.status = DebtStatus::Overdue;
                self.crud.save(&debt).await?;
                flagged.push(debt);
            }
        }
        if !flagged.is_empty() {
            info!(%tenant, count = flagged.len(), "debts marked overdue");
        }
        Ok(flagged)
    }

    /// Tenants that own at least one debt.
    pub async fn tenants(&self) -> Result<Vec<TenantId>> {
        let mut tenants: Vec<TenantId> = self
            .crud
            .store()
            .get_all()
            .await?
            .into_iter()
            .map(|debt| debt.tenant)
            .collect();
        tenants.sort();
        tenants.dedup();
        Ok(tenants)
    }

    /// Debts of `tenant` that still have something left to pay.
    pub async fn outstanding(&self, tenant: TenantId) -> Result<Vec<Debt>> {
        Ok(self
            .crud
            .list(tenant)
            .await?
            .into_iter()
            .filter(|debt| !debt.is_settled())
            .collect())
    }
}
