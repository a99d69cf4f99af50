use crate::application::crud::CrudService;
use crate::application::dto::LoanData;
use crate::application::payment_service::{Payment, PaymentService, PaymentTarget};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::loan::Loan;
use crate::domain::money::Amount;
use crate::domain::ports::SharedStore;
use crate::domain::transaction::{Reference, Transaction, TransactionType};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::info;

pub struct LoanService {
    crud: CrudService<LoanData>,
    payments: Arc<PaymentService>,
}

impl LoanService {
    pub fn new(store: SharedStore<Loan>, payments: Arc<PaymentService>) -> Self {
        Self {
            crud: CrudService::new(store),
            payments,
        }
    }

    /// Registers a loan. With `disburse`, the principal is credited to the
    /// loan's account.
    pub async fn create(&self, tenant: TenantId, data: &LoanData, disburse: bool) -> Result<Loan> {
        if disburse && data.account_id.is_none() {
            return Err(LedgerError::validation("Disbursing a loan needs an account"));
        }
        let loan = self.crud.create(tenant, data).await?;
        if let (true, Some(account_id)) = (disburse, loan.account_id) {
            let account = self.payments.account(tenant, account_id).await?;
            let amount = self
                .payments
                .currency()
                .convert(loan.amount, loan.currency, account.currency, loan.start_date)
                .await?;
            let mut record = Transaction::new(
                tenant,
                account_id,
                TransactionType::Income,
                amount,
                account.currency,
                loan.start_date,
            );
            record.category = Some("loan".into());
            record.description = Some(format!("{} loan disbursement", loan.bank_name));
            record.reference = Some(Reference::Loan(loan.id));
            self.payments.post(tenant, record).await?;
            info!(loan = loan.id, account = account_id, %amount, "loan disbursed");
        }
        Ok(loan)
    }

    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &LoanData) -> Result<Loan> {
        let _ledger = self.payments.lock().await;
        self.crud.update(tenant, id, data).await
    }

    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        let _ledger = self.payments.lock().await;
        self.crud.delete(tenant, id).await
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<Loan> {
        self.crud.find(tenant, id).await
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<Loan>> {
        self.crud.list(tenant).await
    }

    /// Pays the next installment, from `account_id` or else the loan's own
    /// account.
    pub async fn pay_installment(
        &self,
        tenant: TenantId,
        id: EntityId,
        account_id: Option<EntityId>,
        date: NaiveDate,
    ) -> Result<(Loan, Transaction)> {
        let ledger = self.payments.lock().await;
        let mut loan = self.crud.find(tenant, id).await?;
        let account_id = account_id
            .or(loan.account_id)
            .ok_or_else(|| LedgerError::validation("No account to pay the installment from"))?;
        let amount = Amount::new(loan.next_installment_amount())?;
        loan.record_installment()?;

        let payment = Payment {
            account_id,
            amount,
            currency: loan.currency,
            date,
            description: Some(format!(
                "{} installment {}/{}",
                loan.bank_name,
                loan.paid_installments(),
                loan.installments
            )),
        };
        let record = self
            .payments
            .pay_locked(&ledger, tenant, PaymentTarget::LoanInstallment { loan_id: id }, payment)
            .await?;
        self.crud.save(&loan).await?;
        info!(
            loan = id,
            remaining = loan.remaining_installments,
            next = ?loan.next_payment_date,
            "loan installment paid"
        );
        Ok((loan, record))
    }

    /// Active loans whose next installment falls within `days` of `today`,
    /// including overdue ones.
    pub async fn upcoming(&self, tenant: TenantId, today: NaiveDate, days: i64) -> Result<Vec<Loan>> {
        Ok(self
            .crud
            .list(tenant)
            .await?
            .into_iter()
            .filter(|loan| loan.is_due_within(today, days))
            .collect())
    }

    pub async fn tenants(&self) -> Result<Vec<TenantId>> {
        let mut tenants: Vec<TenantId> = self
            .crud
            .store()
            .get_all()
            .await?
            .into_iter()
            .map(|loan| loan.tenant)
            .collect();
        tenants.sort();
        tenants.dedup();
        Ok(tenants)
    }
}
