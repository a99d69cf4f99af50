use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::round_money;
use crate::impl_entity;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
    Installment,
    Subscription,
    DebtPayment,
    LoanPayment,
    CardPayment,
    CommissionPayout,
}

impl TransactionType {
    /// Types created through the ledger; the rest are written by payments.
    pub fn is_user_entered(&self) -> bool {
        matches!(
            self,
            TransactionType::Income
                | TransactionType::Expense
                | TransactionType::Transfer
                | TransactionType::Installment
                | TransactionType::Subscription
        )
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Pending,
    #[default]
    Completed,
    Cancelled,
}

/// A purchase split into equal monthly parts.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct InstallmentPlan {
    pub total: u32,
    pub remaining: u32,
    pub start_date: NaiveDate,
}

impl InstallmentPlan {
    pub fn new(total: u32, start_date: NaiveDate) -> Self {
        Self {
            total,
            remaining: total,
            start_date,
        }
    }

    /// Number of parts already charged.
    pub fn charged(&self) -> u32 {
        self.total - self.remaining
    }

    /// Amount of part `index` (0-based); the last part absorbs rounding.
    pub fn part_amount(&self, amount: Decimal, index: u32) -> Decimal {
        let regular = round_money(amount / Decimal::from(self.total));
        if index + 1 == self.total {
            amount - regular * Decimal::from(self.total - 1)
        } else {
            regular
        }
    }

    /// Date the next part falls due, or `None` when fully charged.
    pub fn next_due(&self) -> Option<NaiveDate> {
        if self.remaining == 0 {
            return None;
        }
        self.start_date.checked_add_months(Months::new(self.charged()))
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum BillingPeriod {
    Monthly,
    Yearly,
}

impl BillingPeriod {
    pub fn months(&self) -> u32 {
        match self {
            BillingPeriod::Monthly => 1,
            BillingPeriod::Yearly => 12,
        }
    }
}

/// A recurring charge that runs until cancelled.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct SubscriptionPlan {
    pub period: BillingPeriod,
    pub start_date: NaiveDate,
    pub charges: u32,
}

impl SubscriptionPlan {
    pub fn new(period: BillingPeriod, start_date: NaiveDate) -> Self {
        Self {
            period,
            start_date,
            charges: 0,
        }
    }

    /// Date the next charge falls due. Anchored on the start date so that
    /// month-end subscriptions do not drift.
    pub fn next_due(&self) -> Option<NaiveDate> {
        self.start_date
            .checked_add_months(Months::new(self.charges * self.period.months()))
    }
}

/// Effect of a row on the balance of its account.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Credit,
    Debit,
}

impl Direction {
    pub fn reversed(self) -> Self {
        match self {
            Direction::Credit => Direction::Debit,
            Direction::Debit => Direction::Credit,
        }
    }
}

/// One balance change implied by a ledger row, in the account's currency.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub struct Posting {
    pub account_id: EntityId,
    pub direction: Direction,
    pub amount: Decimal,
}

/// What a payment row settled.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
#[serde(rename_all = "snake_case", tag = "kind", content = "id")]
pub enum Reference {
    Debt(EntityId),
    Loan(EntityId),
    Card(EntityId),
    CommissionPayout(EntityId),
}

/// A ledger row: either a user-entered movement or the audit trail of a payment.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub id: EntityId,
    pub tenant: TenantId,
    pub account_id: EntityId,
    pub destination_account_id: Option<EntityId>,
    pub transaction_type: TransactionType,
    /// Effect on `account_id`; a destination account is always credited.
    pub direction: Direction,
    pub category: Option<String>,
    pub amount: Decimal,
    pub currency: Currency,
    /// Rate applied when the destination account uses another currency.
    pub exchange_rate: Option<Decimal>,
    /// Amount expressed in TRY at the transaction date.
    pub try_equivalent: Decimal,
    pub date: NaiveDate,
    pub description: Option<String>,
    pub status: TransactionStatus,
    pub customer_id: Option<EntityId>,
    pub installment: Option<InstallmentPlan>,
    pub subscription: Option<SubscriptionPlan>,
    pub next_payment_date: Option<NaiveDate>,
    pub parent_id: Option<EntityId>,
    pub reference: Option<Reference>,
}

impl_entity!(Transaction, "transactions");

impl Transaction {
    pub fn new(
        tenant: TenantId,
        account_id: EntityId,
        transaction_type: TransactionType,
        amount: Decimal,
        currency: Currency,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: 0,
            tenant,
            account_id,
            destination_account_id: None,
            transaction_type,
            direction: if transaction_type == TransactionType::Income {
                Direction::Credit
            } else {
                Direction::Debit
            },
            category: None,
            amount,
            currency,
            exchange_rate: None,
            try_equivalent: amount,
            date,
            description: None,
            status: TransactionStatus::Completed,
            customer_id: None,
            installment: None,
            subscription: None,
            next_payment_date: None,
            parent_id: None,
            reference: None,
        }
    }

    /// Plan rows describe a schedule; their charges are separate child rows.
    pub fn is_plan(&self) -> bool {
        self.installment.is_some() || self.subscription.is_some()
    }

    /// Amount credited to the destination account, in its currency.
    pub fn destination_amount(&self) -> Decimal {
        match self.exchange_rate {
            Some(rate) => round_money(self.amount * rate),
            None => self.amount,
        }
    }

    /// Balance changes this row stands for. Plan rows and rows that are not
    /// completed have none.
    pub fn postings(&self) -> Vec<Posting> {
        if self.is_plan() || self.status != TransactionStatus::Completed {
            return Vec::new();
        }
        let mut postings = vec![Posting {
            account_id: self.account_id,
            direction: self.direction,
            amount: self.amount,
        }];
        if let Some(destination) = self.destination_account_id {
            postings.push(Posting {
                account_id: destination,
                direction: Direction::Credit,
                amount: self.destination_amount(),
            });
        }
        postings
    }

    /// A pending installment or subscription whose next charge is due.
    pub fn is_due(&self, today: NaiveDate) -> bool {
        self.status == TransactionStatus::Pending
            && self.next_payment_date.is_some_and(|next| next <= today)
    }
}
