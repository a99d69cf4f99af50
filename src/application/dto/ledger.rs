use super::{DataObject, Writable, normalize_optional, require};
use crate::domain::commission::{Commission, CommissionStatus};
use crate::domain::currency::Currency;
use crate::domain::debt::{Debt, DebtDirection, DebtStatus};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::loan::{Loan, LoanStatus};
use crate::domain::money::{Amount, round_money};
use crate::domain::transaction::{BillingPeriod, Transaction, TransactionType};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A ledger movement as entered by a user. The amount is in the source
/// account's currency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionData {
    pub account_id: EntityId,
    #[serde(default)]
    pub destination_account_id: Option<EntityId>,
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub category: Option<String>,
    pub amount: Decimal,
    pub date: NaiveDate,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    /// Number of monthly parts for installment purchases.
    #[serde(default)]
    pub installments: Option<u32>,
    /// Billing period for subscriptions.
    #[serde(default)]
    pub billing_period: Option<BillingPeriod>,
}

impl DataObject for TransactionData {
    type Model = Transaction;

    fn from_model(model: &Transaction) -> Self {
        Self {
            account_id: model.account_id,
            destination_account_id: model.destination_account_id,
            transaction_type: model.transaction_type,
            category: model.category.clone(),
            amount: model.amount,
            date: model.date,
            description: model.description.clone(),
            customer_id: model.customer_id,
            installments: model.installment.map(|plan| plan.total),
            billing_period: model.subscription.map(|plan| plan.period),
        }
    }
}

impl TransactionData {
    pub fn validate(&self) -> Result<()> {
        Amount::new(self.amount)?;
        if !self.transaction_type.is_user_entered() {
            return Err(LedgerError::validation(
                "Payment transactions are created by the payment services",
            ));
        }
        match self.transaction_type {
            TransactionType::Transfer => match self.destination_account_id {
                None => return Err(LedgerError::validation("Transfers need a destination account")),
                Some(dest) if dest == self.account_id => {
                    return Err(LedgerError::validation("Cannot transfer to the same account"));
                }
                Some(_) => {}
            },
            TransactionType::Installment => {
                if !matches!(self.installments, Some(n) if n >= 2) {
                    return Err(LedgerError::validation(
                        "Installment purchases need at least two installments",
                    ));
                }
            }
            TransactionType::Subscription => {
                if self.billing_period.is_none() {
                    return Err(LedgerError::validation("Subscriptions need a billing period"));
                }
            }
            _ => {}
        }
        if self.transaction_type != TransactionType::Transfer && self.destination_account_id.is_some() {
            return Err(LedgerError::validation(format!(
                "{:?} transactions cannot have a destination account",
                self.transaction_type
            )));
        }
        Ok(())
    }

    /// Builds the unsaved row; strategies fill in plans and conversions.
    pub fn to_model(&self, tenant: TenantId, currency: Currency) -> Transaction {
        let mut tx = Transaction::new(
            tenant,
            self.account_id,
            self.transaction_type,
            round_money(self.amount),
            currency,
            self.date,
        );
        if self.transaction_type == TransactionType::Transfer {
            tx.destination_account_id = self.destination_account_id;
        }
        tx.category = normalize_optional(&self.category);
        tx.description = normalize_optional(&self.description);
        tx.customer_id = self.customer_id;
        tx
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DebtData {
    pub direction: DebtDirection,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub supplier_id: Option<EntityId>,
    pub description: String,
    pub amount: Decimal,
    pub currency: Currency,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

impl DataObject for DebtData {
    type Model = Debt;

    fn from_model(model: &Debt) -> Self {
        Self {
            direction: model.direction,
            customer_id: model.customer_id,
            supplier_id: model.supplier_id,
            description: model.description.clone(),
            amount: model.amount,
            currency: model.currency,
            due_date: model.due_date,
        }
    }
}

impl Writable for DebtData {
    fn validate(&self) -> Result<()> {
        require("description", &self.description)?;
        Amount::new(self.amount)?;
        if self.customer_id.is_some() && self.supplier_id.is_some() {
            return Err(LedgerError::validation(
                "A debt belongs to either a customer or a supplier",
            ));
        }
        Ok(())
    }

    fn to_model(&self, tenant: TenantId) -> Result<Debt> {
        let amount = round_money(self.amount);
        Ok(Debt {
            id: 0,
            tenant,
            direction: self.direction,
            customer_id: self.customer_id,
            supplier_id: self.supplier_id,
            description: self.description.trim().to_string(),
            amount,
            remaining: amount,
            currency: self.currency,
            due_date: self.due_date,
            status: DebtStatus::Pending,
        })
    }

    fn apply_to(&self, model: &mut Debt) -> Result<()> {
        let paid = model.amount - model.remaining;
        let amount = round_money(self.amount);
        if amount < paid {
            return Err(LedgerError::validation(format!(
                "Amount cannot drop below the {paid} already paid"
            )));
        }
        if model.currency != self.currency && !paid.is_zero() {
            return Err(LedgerError::validation(
                "The currency of a partly paid debt cannot change",
            ));
        }
        model.direction = self.direction;
        model.customer_id = self.customer_id;
        model.supplier_id = self.supplier_id;
        model.description = self.description.trim().to_string();
        model.amount = amount;
        model.remaining = amount - paid;
        model.currency = self.currency;
        model.due_date = self.due_date;
        model.status = match (model.remaining.is_zero(), paid.is_zero()) {
            (true, _) => DebtStatus::Paid,
            (false, true) if model.status == DebtStatus::Overdue => DebtStatus::Overdue,
            (false, true) => DebtStatus::Pending,
            (false, false) => DebtStatus::Partial,
        };
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanData {
    pub bank_name: String,
    #[serde(default)]
    pub loan_type: Option<String>,
    #[serde(default)]
    pub account_id: Option<EntityId>,
    pub amount: Decimal,
    /// Omitted when it should be derived from `monthly_interest_rate`.
    #[serde(default)]
    pub monthly_payment: Option<Decimal>,
    /// Monthly interest rate as a fraction (0.035 = 3.5%).
    #[serde(default)]
    pub monthly_interest_rate: Option<Decimal>,
    pub installments: u32,
    pub currency: Currency,
    pub start_date: NaiveDate,
}

impl DataObject for LoanData {
    type Model = Loan;

    fn from_model(model: &Loan) -> Self {
        Self {
            bank_name: model.bank_name.clone(),
            loan_type: model.loan_type.clone(),
            account_id: model.account_id,
            amount: model.amount,
            monthly_payment: Some(model.monthly_payment),
            monthly_interest_rate: None,
            installments: model.installments,
            currency: model.currency,
            start_date: model.start_date,
        }
    }
}

impl LoanData {
    fn monthly_payment(&self) -> Result<Decimal> {
        match self.monthly_payment {
            Some(payment) if payment > Decimal::ZERO => Ok(payment),
            Some(_) => Err(LedgerError::validation("Monthly payment must be positive")),
            None => Loan::annuity_payment(
                self.amount,
                self.monthly_interest_rate.unwrap_or(Decimal::ZERO),
                self.installments,
            ),
        }
    }
}

impl Writable for LoanData {
    fn validate(&self) -> Result<()> {
        require("bank_name", &self.bank_name)?;
        Amount::new(self.amount)?;
        if self.installments == 0 {
            return Err(LedgerError::validation("Installment count must be positive"));
        }
        self.monthly_payment().map(|_| ())
    }

    fn to_model(&self, tenant: TenantId) -> Result<Loan> {
        Ok(Loan {
            id: 0,
            tenant,
            bank_name: self.bank_name.trim().to_string(),
            loan_type: normalize_optional(&self.loan_type),
            account_id: self.account_id,
            amount: round_money(self.amount),
            monthly_payment: self.monthly_payment()?,
            installments: self.installments,
            remaining_installments: self.installments,
            currency: self.currency,
            start_date: self.start_date,
            next_payment_date: Some(self.start_date),
            status: LoanStatus::Active,
        })
    }

    fn apply_to(&self, model: &mut Loan) -> Result<()> {
        model.bank_name = self.bank_name.trim().to_string();
        model.loan_type = normalize_optional(&self.loan_type);
        if model.paid_installments() > 0 {
            // The schedule is fixed once repayment has started.
            return Ok(());
        }
        model.account_id = self.account_id;
        model.amount = round_money(self.amount);
        model.monthly_payment = self.monthly_payment()?;
        model.installments = self.installments;
        model.remaining_installments = self.installments;
        model.currency = self.currency;
        model.start_date = self.start_date;
        model.next_payment_date = Some(self.start_date);
        Ok(())
    }
}

/// Read-only view of an earned commission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommissionData {
    pub user_id: EntityId,
    #[serde(default)]
    pub customer_id: Option<EntityId>,
    #[serde(default)]
    pub transaction_id: Option<EntityId>,
    pub sale_amount: Decimal,
    pub rate: Decimal,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: CommissionStatus,
    pub date: NaiveDate,
}

impl DataObject for CommissionData {
    type Model = Commission;

    fn from_model(model: &Commission) -> Self {
        Self {
            user_id: model.user_id,
            customer_id: model.customer_id,
            transaction_id: model.transaction_id,
            sale_amount: model.sale_amount,
            rate: model.rate,
            amount: model.amount,
            currency: model.currency,
            status: model.status,
            date: model.date,
        }
    }
}
