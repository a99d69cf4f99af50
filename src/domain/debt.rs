use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::Amount;
use crate::error::LedgerError;
use crate::impl_entity;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum DebtDirection {
    /// Someone owes us.
    Receivable,
    /// We owe someone.
    Payable,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum DebtStatus {
    #[default]
    Pending,
    Partial,
    Paid,
    Overdue,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Debt {
    pub id: EntityId,
    pub tenant: TenantId,
    pub direction: DebtDirection,
    pub customer_id: Option<EntityId>,
    pub supplier_id: Option<EntityId>,
    pub description: String,
    pub amount: Decimal,
    pub remaining: Decimal,
    pub currency: Currency,
    pub due_date: Option<NaiveDate>,
    pub status: DebtStatus,
}

impl_entity!(Debt, "debts");

impl Debt {
    pub fn is_settled(&self) -> bool {
        self.status == DebtStatus::Paid
    }

    /// Past its due date and not settled.
    pub fn is_overdue_on(&self, today: NaiveDate) -> bool {
        !self.is_settled() && self.due_date.is_some_and(|due| due < today)
    }

    /// Applies a payment to the outstanding amount.
    pub fn apply_payment(&mut self, amount: Amount) -> Result<(), LedgerError> {
        if self.is_settled() {
            return Err(LedgerError::validation("Debt is already paid"));
        }
        if amount.value() > self.remaining {
            return Err(LedgerError::validation(format!(
                "Payment {} exceeds the remaining debt {}",
                amount, self.remaining
            )));
        }
        self.remaining -= amount.value();
        self.status = if self.remaining.is_zero() {
            DebtStatus::Paid
        } else {
            DebtStatus::Partial
        };
        Ok(())
    }
}
