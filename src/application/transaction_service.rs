use crate::application::dto::TransactionData;
use crate::application::payment_service::PaymentService;
use crate::domain::account::Account;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::ports::SharedStore;
use crate::domain::transaction::{
    InstallmentPlan, SubscriptionPlan, Transaction, TransactionStatus, TransactionType,
};
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

/// How one transaction type books itself.
#[async_trait]
pub trait TransactionStrategy: Send + Sync {
    /// Stores a new entry and charges whatever is due at creation.
    async fn create(&self, tenant: TenantId, data: &TransactionData, account: &Account) -> Result<Transaction>;

    /// Charges the next part of a plan row, writing a child row.
    async fn charge(&self, plan: &mut Transaction) -> Result<Transaction> {
        Err(LedgerError::validation(format!(
            "{:?} transactions have no schedule",
            plan.transaction_type
        )))
    }
}

/// Income credits the account, expense debits it.
pub struct DirectStrategy {
    payments: Arc<PaymentService>,
}

#[async_trait]
impl TransactionStrategy for DirectStrategy {
    async fn create(&self, tenant: TenantId, data: &TransactionData, account: &Account) -> Result<Transaction> {
        self.payments.post(tenant, data.to_model(tenant, account.currency)).await
    }
}

/// Debits the source and credits the destination, converting between the
/// two account currencies at the transaction date.
pub struct TransferStrategy {
    payments: Arc<PaymentService>,
}

#[async_trait]
impl TransactionStrategy for TransferStrategy {
    async fn create(&self, tenant: TenantId, data: &TransactionData, account: &Account) -> Result<Transaction> {
        let destination_id = data
            .destination_account_id
            .ok_or_else(|| LedgerError::validation("Transfers need a destination account"))?;
        let destination = self.payments.account(tenant, destination_id).await?;
        let mut record = data.to_model(tenant, account.currency);
        if destination.currency != account.currency {
            let rate = self
                .payments
                .currency()
                .rate(account.currency, destination.currency, data.date)
                .await?;
            record.exchange_rate = Some(rate);
        }
        self.payments.post(tenant, record).await
    }
}

async fn charge_child(
    payments: &PaymentService,
    plan: &Transaction,
    amount: Decimal,
    date: NaiveDate,
    description: Option<String>,
) -> Result<Transaction> {
    let mut child = Transaction::new(
        plan.tenant,
        plan.account_id,
        plan.transaction_type,
        amount,
        plan.currency,
        date,
    );
    child.category = plan.category.clone();
    child.customer_id = plan.customer_id;
    child.description = description;
    child.parent_id = Some(plan.id);
    payments.post(plan.tenant, child).await
}

/// Charges the part due at creation. A plan whose first charge fails is
/// removed again so it is never retried.
async fn first_charge(
    strategy: &dyn TransactionStrategy,
    transactions: &SharedStore<Transaction>,
    mut plan: Transaction,
) -> Result<Transaction> {
    if let Err(e) = strategy.charge(&mut plan).await {
        warn!(plan = plan.id, error = %e, "first charge failed, discarding plan");
        transactions.remove(plan.id).await?;
        return Err(e);
    }
    Ok(plan)
}

/// Splits a purchase into equal monthly parts.
pub struct InstallmentStrategy {
    payments: Arc<PaymentService>,
    transactions: SharedStore<Transaction>,
}

#[async_trait]
impl TransactionStrategy for InstallmentStrategy {
    async fn create(&self, tenant: TenantId, data: &TransactionData, account: &Account) -> Result<Transaction> {
        let total = data
            .installments
            .filter(|n| *n >= 2)
            .ok_or_else(|| LedgerError::validation("Installment purchases need at least two installments"))?;
        let schedule = InstallmentPlan::new(total, data.date);
        let mut plan = data.to_model(tenant, account.currency);
        if schedule.part_amount(plan.amount, 0) <= Decimal::ZERO {
            return Err(LedgerError::validation(format!(
                "{} cannot be split into {total} installments",
                plan.amount
            )));
        }
        plan.installment = Some(schedule);
        plan.status = TransactionStatus::Pending;
        plan.next_payment_date = Some(data.date);
        let plan = self.payments.post(tenant, plan).await?;
        first_charge(self, &self.transactions, plan).await
    }

    async fn charge(&self, plan: &mut Transaction) -> Result<Transaction> {
        let mut schedule = plan
            .installment
            .ok_or_else(|| LedgerError::validation("Not an installment plan"))?;
        let due = schedule
            .next_due()
            .ok_or_else(|| LedgerError::validation("All installments are charged"))?;
        let index = schedule.charged();
        let part = schedule.part_amount(plan.amount, index);
        let label = plan.description.clone().unwrap_or_else(|| "Installment".into());
        let description = Some(format!("{label} ({}/{})", index + 1, schedule.total));
        let child = charge_child(&self.payments, plan, part, due, description).await?;

        schedule.remaining -= 1;
        plan.installment = Some(schedule);
        plan.next_payment_date = schedule.next_due();
        if schedule.remaining == 0 {
            plan.status = TransactionStatus::Completed;
        }
        self.transactions.update(plan.clone()).await?;
        Ok(child)
    }
}

/// A charge repeated every month or year until cancelled.
pub struct SubscriptionStrategy {
    payments: Arc<PaymentService>,
    transactions: SharedStore<Transaction>,
}

#[async_trait]
impl TransactionStrategy for SubscriptionStrategy {
    async fn create(&self, tenant: TenantId, data: &TransactionData, account: &Account) -> Result<Transaction> {
        let period = data
            .billing_period
            .ok_or_else(|| LedgerError::validation("Subscriptions need a billing period"))?;
        let mut plan = data.to_model(tenant, account.currency);
        plan.subscription = Some(SubscriptionPlan::new(period, data.date));
        plan.status = TransactionStatus::Pending;
        plan.next_payment_date = Some(data.date);
        let plan = self.payments.post(tenant, plan).await?;
        first_charge(self, &self.transactions, plan).await
    }

    async fn charge(&self, plan: &mut Transaction) -> Result<Transaction> {
        let mut schedule = plan
            .subscription
            .ok_or_else(|| LedgerError::validation("Not a subscription"))?;
        let due = schedule
            .next_due()
            .ok_or_else(|| LedgerError::validation("Subscription date out of range"))?;
        let child = charge_child(&self.payments, plan, plan.amount, due, plan.description.clone()).await?;

        schedule.charges += 1;
        plan.subscription = Some(schedule);
        plan.next_payment_date = schedule.next_due();
        self.transactions.update(plan.clone()).await?;
        Ok(child)
    }
}

/// Ledger entries entered by users, booked by the strategy of their type.
pub struct TransactionService {
    transactions: SharedStore<Transaction>,
    payments: Arc<PaymentService>,
    strategies: HashMap<TransactionType, Box<dyn TransactionStrategy>>,
}

impl TransactionService {
    pub fn new(transactions: SharedStore<Transaction>, payments: Arc<PaymentService>) -> Self {
        let mut strategies: HashMap<TransactionType, Box<dyn TransactionStrategy>> = HashMap::new();
        strategies.insert(
            TransactionType::Income,
            Box::new(DirectStrategy { payments: payments.clone() }),
        );
        strategies.insert(
            TransactionType::Expense,
            Box::new(DirectStrategy { payments: payments.clone() }),
        );
        strategies.insert(
            TransactionType::Transfer,
            Box::new(TransferStrategy { payments: payments.clone() }),
        );
        strategies.insert(
            TransactionType::Installment,
            Box::new(InstallmentStrategy {
                payments: payments.clone(),
                transactions: transactions.clone(),
            }),
        );
        strategies.insert(
            TransactionType::Subscription,
            Box::new(SubscriptionStrategy {
                payments: payments.clone(),
                transactions: transactions.clone(),
            }),
        );
        Self {
            transactions,
            payments,
            strategies,
        }
    }

    fn strategy(&self, kind: TransactionType) -> Result<&dyn TransactionStrategy> {
        self.strategies
            .get(&kind)
            .map(|s| s.as_ref())
            .ok_or_else(|| LedgerError::validation(format!("{kind:?} transactions cannot be entered directly")))
    }

    pub async fn create(&self, tenant: TenantId, data: &TransactionData) -> Result<Transaction> {
        data.validate()?;
        let account = self.payments.account(tenant, data.account_id).await?;
        account.ensure_active()?;
        let record = self.strategy(data.transaction_type)?.create(tenant, data, &account).await?;
        info!(
            tx = record.id,
            %tenant,
            kind = ?record.transaction_type,
            amount = %record.amount,
            currency = %record.currency,
            "transaction created"
        );
        Ok(record)
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<Transaction> {
        match self.transactions.get(id).await? {
            Some(tx) if tx.tenant == tenant => Ok(tx),
            _ => Err(LedgerError::not_found("transactions", id)),
        }
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<Transaction>> {
        let mut rows: Vec<Transaction> = self
            .transactions
            .get_all()
            .await?
            .into_iter()
            .filter(|tx| tx.tenant == tenant)
            .collect();
        rows.sort_by_key(|tx| (tx.date, tx.id));
        Ok(rows)
    }

    /// Charges already written for a plan.
    pub async fn children(&self, tenant: TenantId, plan_id: EntityId) -> Result<Vec<Transaction>> {
        Ok(self
            .list(tenant)
            .await?
            .into_iter()
            .filter(|tx| tx.parent_id == Some(plan_id))
            .collect())
    }

    /// Deleting a plan cancels its remaining charges and keeps the charges
    /// already made. Any other row is reverted and removed.
    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        let mut record = self.find(tenant, id).await?;
        if record.reference.is_some() || !record.transaction_type.is_user_entered() {
            return Err(LedgerError::validation(
                "Payment rows belong to the payment that wrote them",
            ));
        }
        if record.is_plan() {
            if record.status == TransactionStatus::Pending {
                record.status = TransactionStatus::Cancelled;
                record.next_payment_date = None;
                self.transactions.update(record).await?;
                info!(tx = id, "plan cancelled");
            }
            return Ok(());
        }
        self.payments.reverse(tenant, &record).await?;
        self.transactions.remove(id).await?;
        info!(tx = id, "transaction reverted");
        Ok(())
    }

    /// Charges every pending plan that is due on `today`, catching up on
    /// missed periods. A plan that fails is logged and skipped.
    pub async fn process_due(&self, today: NaiveDate) -> Result<Vec<Transaction>> {
        let mut due: Vec<Transaction> = self
            .transactions
            .get_all()
            .await?
            .into_iter()
            .filter(|tx| tx.is_plan() && tx.is_due(today))
            .collect();
        due.sort_by_key(|tx| tx.id);

        let mut charged = Vec::new();
        for mut plan in due {
            let strategy = self.strategy(plan.transaction_type)?;
            while plan.is_due(today) {
                match strategy.charge(&mut plan).await {
                    Ok(child) => charged.push(child),
                    Err(e) => {
                        warn!(plan = plan.id, error = %e, "could not charge plan");
                        break;
                    }
                }
            }
        }
        if !charged.is_empty() {
            info!(%today, count = charged.len(), "recurring charges written");
        }
        Ok(charged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::test_support::{TENANT, account, bank_account, card_account, ledger};
    use crate::domain::account::AccountType;
    use crate::domain::currency::Currency;
    use crate::domain::transaction::BillingPeriod;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn entry(account_id: EntityId, kind: TransactionType, amount: Decimal) -> TransactionData {
        TransactionData {
            account_id,
            destination_account_id: None,
            transaction_type: kind,
            category: Some("office".into()),
            amount,
            date: date(2026, 1, 31),
            description: Some("Laptop".into()),
            customer_id: None,
            installments: None,
            billing_period: None,
        }
    }

    #[tokio::test]
    async fn test_income_and_expense() {
        let ledger = ledger();
        let bank = bank_account(&ledger, dec!(100)).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        service.create(TENANT, &entry(bank.id, TransactionType::Income, dec!(50))).await.unwrap();
        let expense = service.create(TENANT, &entry(bank.id, TransactionType::Expense, dec!(30))).await.unwrap();

        assert_eq!(ledger.balance(bank.id).await, dec!(120));
        assert_eq!(expense.try_equivalent, dec!(30));
    }

    #[tokio::test]
    async fn test_cross_currency_transfer_stores_rate() {
        let ledger = ledger();
        let usd = account(&ledger, AccountType::BankAccount, Currency::USD, dec!(100)).await;
        let lira = bank_account(&ledger, dec!(0)).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        let mut data = entry(usd.id, TransactionType::Transfer, dec!(10));
        data.destination_account_id = Some(lira.id);
        let record = service.create(TENANT, &data).await.unwrap();

        assert_eq!(record.exchange_rate, Some(dec!(41.80)));
        assert_eq!(record.try_equivalent, dec!(418.00));
        assert_eq!(ledger.balance(usd.id).await, dec!(90));
        assert_eq!(ledger.balance(lira.id).await, dec!(418.00));
    }

    #[tokio::test]
    async fn test_installments_roll_over_until_completed() {
        let ledger = ledger();
        let card = card_account(&ledger, dec!(10000), 15, 25).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        let mut data = entry(card.id, TransactionType::Installment, dec!(100));
        data.installments = Some(3);
        let plan = service.create(TENANT, &data).await.unwrap();

        assert_eq!(ledger.balance(card.id).await, dec!(33.33));
        let plan = service.find(TENANT, plan.id).await.unwrap();
        assert_eq!(plan.status, TransactionStatus::Pending);
        assert_eq!(plan.next_payment_date, Some(date(2026, 2, 28)));

        assert!(service.process_due(date(2026, 2, 27)).await.unwrap().is_empty());
        // Two missed months are caught up at once.
        let charged = service.process_due(date(2026, 4, 1)).await.unwrap();
        assert_eq!(charged.len(), 2);
        assert_eq!(charged[1].amount, dec!(33.34));
        assert_eq!(charged[1].date, date(2026, 3, 31));

        let plan = service.find(TENANT, plan.id).await.unwrap();
        assert_eq!(plan.status, TransactionStatus::Completed);
        assert_eq!(plan.next_payment_date, None);
        assert_eq!(ledger.balance(card.id).await, dec!(100));
        assert_eq!(service.children(TENANT, plan.id).await.unwrap().len(), 3);
        assert!(service.process_due(date(2026, 12, 1)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_subscription_charges_until_cancelled() {
        let ledger = ledger();
        let bank = bank_account(&ledger, dec!(1000)).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        let mut data = entry(bank.id, TransactionType::Subscription, dec!(20));
        data.billing_period = Some(BillingPeriod::Monthly);
        let plan = service.create(TENANT, &data).await.unwrap();
        assert_eq!(ledger.balance(bank.id).await, dec!(980));

        service.process_due(date(2026, 2, 28)).await.unwrap();
        assert_eq!(ledger.balance(bank.id).await, dec!(960));

        service.delete(TENANT, plan.id).await.unwrap();
        assert!(service.process_due(date(2026, 6, 1)).await.unwrap().is_empty());
        assert_eq!(ledger.balance(bank.id).await, dec!(960));
        let plan = service.find(TENANT, plan.id).await.unwrap();
        assert_eq!(plan.status, TransactionStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_delete_reverts_balance() {
        let ledger = ledger();
        let bank = bank_account(&ledger, dec!(100)).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        let expense = service.create(TENANT, &entry(bank.id, TransactionType::Expense, dec!(40))).await.unwrap();
        service.delete(TENANT, expense.id).await.unwrap();

        assert_eq!(ledger.balance(bank.id).await, dec!(100));
        assert!(service.find(TENANT, expense.id).await.is_err());
    }

    #[tokio::test]
    async fn test_payment_types_cannot_be_entered() {
        let ledger = ledger();
        let bank = bank_account(&ledger, dec!(100)).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        let data = entry(bank.id, TransactionType::LoanPayment, dec!(10));
        assert!(service.create(TENANT, &data).await.is_err());
        assert_eq!(ledger.balance(bank.id).await, dec!(100));
    }

    #[tokio::test]
    async fn test_income_and_expense_reject_a_destination() {
        let ledger = ledger();
        let lira = bank_account(&ledger, dec!(0)).await;
        let euro = account(&ledger, AccountType::BankAccount, Currency::EUR, dec!(0)).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        for kind in [TransactionType::Income, TransactionType::Expense] {
            let mut data = entry(lira.id, kind, dec!(100));
            data.destination_account_id = Some(euro.id);
            let err = service.create(TENANT, &data).await.unwrap_err();
            assert!(matches!(err, LedgerError::ValidationError(_)));
        }
        assert_eq!(ledger.balance(lira.id).await, dec!(0));
        assert_eq!(ledger.balance(euro.id).await, dec!(0));
        assert!(ledger.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_installment_too_small_to_split_stores_nothing() {
        let ledger = ledger();
        let card = card_account(&ledger, dec!(10000), 15, 25).await;
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        let mut data = entry(card.id, TransactionType::Installment, dec!(0.01));
        data.installments = Some(3);
        assert!(service.create(TENANT, &data).await.is_err());

        assert!(ledger.transactions().await.is_empty());
        assert!(service.process_due(date(2026, 12, 1)).await.unwrap().is_empty());
        assert_eq!(ledger.balance(card.id).await, dec!(0));
    }

    #[tokio::test]
    async fn test_plan_is_discarded_when_first_charge_fails() {
        let ledger = ledger();
        let strategy = SubscriptionStrategy {
            payments: ledger.payments.clone(),
            transactions: ledger.transactions.clone(),
        };
        let mut data = entry(999, TransactionType::Subscription, dec!(20));
        data.billing_period = Some(BillingPeriod::Monthly);
        let mut plan = data.to_model(TENANT, Currency::TRY);
        plan.subscription = Some(SubscriptionPlan::new(BillingPeriod::Monthly, data.date));
        plan.status = TransactionStatus::Pending;
        plan.next_payment_date = Some(data.date);
        let plan = ledger.payments.post(TENANT, plan).await.unwrap();

        let err = first_charge(&strategy, &ledger.transactions, plan).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
        assert!(ledger.transactions().await.is_empty());
    }

    #[tokio::test]
    async fn test_inactive_account_is_rejected() {
        let ledger = ledger();
        let mut bank = bank_account(&ledger, dec!(100)).await;
        bank.is_active = false;
        ledger.accounts.update(bank.clone()).await.unwrap();
        let service = TransactionService::new(ledger.transactions.clone(), ledger.payments.clone());

        let data = entry(bank.id, TransactionType::Income, dec!(10));
        assert!(service.create(TENANT, &data).await.is_err());
    }
}
