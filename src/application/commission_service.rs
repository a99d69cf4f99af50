use crate::application::payment_service::{Payment, PaymentService, PaymentTarget};
use crate::domain::commission::{Commission, CommissionPayout, CommissionStatus, commission_amount};
use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::Amount;
use crate::domain::ports::SharedStore;
use crate::domain::user::User;
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{info, warn};

/// A closed sale that earns its seller a commission.
#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub user_id: EntityId,
    pub amount: Amount,
    pub currency: Currency,
    pub date: NaiveDate,
    pub customer_id: Option<EntityId>,
    pub transaction_id: Option<EntityId>,
    /// Percentage used instead of the user's own rate.
    pub rate: Option<Decimal>,
}

pub struct CommissionService {
    commissions: SharedStore<Commission>,
    payouts: SharedStore<CommissionPayout>,
    users: SharedStore<User>,
    payments: Arc<PaymentService>,
}

impl CommissionService {
    pub fn new(
        commissions: SharedStore<Commission>,
        payouts: SharedStore<CommissionPayout>,
        users: SharedStore<User>,
        payments: Arc<PaymentService>,
    ) -> Self {
        Self {
            commissions,
            payouts,
            users,
            payments,
        }
    }

    async fn user(&self, tenant: TenantId, id: EntityId) -> Result<User> {
        match self.users.get(id).await? {
            Some(user) if user.tenant == tenant => Ok(user),
            _ => Err(LedgerError::not_found("users", id)),
        }
    }

    /// Records the commission a sale earns, pending until paid out.
    pub async fn record_sale(&self, tenant: TenantId, sale: Sale) -> Result<Commission> {
        let user = self.user(tenant, sale.user_id).await?;
        let rate = sale.rate.unwrap_or(user.commission_rate);
        let amount = commission_amount(sale.amount.value(), rate)?;
        // Nothing is owed on a zero commission, so it never waits for a payout.
        let status = if amount.is_zero() {
            CommissionStatus::Paid
        } else {
            CommissionStatus::Pending
        };
        let commission = self
            .commissions
            .insert(Commission {
                id: 0,
                tenant,
                user_id: user.id,
                customer_id: sale.customer_id,
                transaction_id: sale.transaction_id,
                sale_amount: sale.amount.value(),
                rate,
                amount,
                currency: sale.currency,
                status,
                payout_id: None,
                date: sale.date,
            })
            .await?;
        info!(commission = commission.id, user = user.id, %rate, %amount, "commission recorded");
        Ok(commission)
    }

    pub async fn list(&self, tenant: TenantId, user_id: Option<EntityId>) -> Result<Vec<Commission>> {
        let mut rows: Vec<Commission> = self
            .commissions
            .get_all()
            .await?
            .into_iter()
            .filter(|c| c.tenant == tenant && user_id.is_none_or(|user| c.user_id == user))
            .collect();
        rows.sort_by_key(|c| c.id);
        Ok(rows)
    }

    pub async fn pending(&self, tenant: TenantId, user_id: EntityId) -> Result<Vec<Commission>> {
        Ok(self
            .list(tenant, Some(user_id))
            .await?
            .into_iter()
            .filter(|c| c.status == CommissionStatus::Pending && !c.amount.is_zero())
            .collect())
    }

    /// Pays every pending commission of a user from `account_id`.
    ///
    /// Commissions in other currencies are converted to the account's
    /// currency at `date`.
    pub async fn payout(
        &self,
        tenant: TenantId,
        user_id: EntityId,
        account_id: EntityId,
        date: NaiveDate,
    ) -> Result<CommissionPayout> {
        let ledger = self.payments.lock().await;
        let user = self.user(tenant, user_id).await?;
        let pending = self.pending(tenant, user.id).await?;
        if pending.is_empty() {
            return Err(LedgerError::validation(format!(
                "{} has no pending commissions",
                user.name
            )));
        }
        let account = self.payments.account(tenant, account_id).await?;
        let mut total = Decimal::ZERO;
        for commission in &pending {
            total += self
                .payments
                .currency()
                .convert(commission.amount, commission.currency, account.currency, date)
                .await?;
        }
        let amount = Amount::new(total)?;

        let mut payout = self
            .payouts
            .insert(CommissionPayout {
                id: 0,
                tenant,
                user_id: user.id,
                account_id: account.id,
                amount: total,
                currency: account.currency,
                date,
                transaction_id: None,
            })
            .await?;
        let payment = Payment {
            account_id: account.id,
            amount,
            currency: account.currency,
            date,
            description: Some(format!("Commission payout for {}", user.name)),
        };
        let record = match self
            .payments
            .pay_locked(&ledger, tenant, PaymentTarget::CommissionPayout { payout_id: payout.id }, payment)
            .await
        {
            Ok(record) => record,
            Err(e) => {
                warn!(payout = payout.id, error = %e, "payout payment failed, discarding payout");
                self.payouts.remove(payout.id).await?;
                return Err(e);
            }
        };
        payout.transaction_id = Some(record.id);
        self.payouts.update(payout.clone()).await?;

        for mut commission in pending {
            commission.status = CommissionStatus::Paid;
            commission.payout_id = Some(payout.id);
            self.commissions.update(commission).await?;
        }
        info!(payout = payout.id, user = user.id, amount = %payout.amount, "commissions paid out");
        Ok(payout)
    }
}
