use crate::application::payment_service::{Payment, PaymentService, PaymentTarget};
use crate::domain::account::CardDetails;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::round_money;
use crate::domain::ports::SharedStore;
use crate::domain::transaction::{Direction, Transaction};
use crate::error::{LedgerError, Result};
use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::sync::Arc;
use tracing::info;

/// Credit limit up to which the lower minimum-payment ratio applies.
pub const DEFAULT_MIN_PAYMENT_THRESHOLD: Decimal = dec!(50000);
const LOW_LIMIT_RATIO: Decimal = dec!(0.20);
const HIGH_LIMIT_RATIO: Decimal = dec!(0.40);

/// `day` of the given month, clamped to the month's last day.
fn clamped(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let last = first.checked_add_months(Months::new(1))?.pred_opt()?;
    NaiveDate::from_ymd_opt(year, month, day.min(last.day()))
}

fn out_of_range() -> LedgerError {
    LedgerError::validation("Date out of range")
}

/// The last statement cut on or before `on`.
pub fn statement_date(on: NaiveDate, statement_day: u32) -> Result<NaiveDate> {
    let this_month = clamped(on.year(), on.month(), statement_day).ok_or_else(out_of_range)?;
    if on >= this_month {
        return Ok(this_month);
    }
    previous_statement_date(this_month, statement_day)
}

/// The statement cut one month before `statement`.
pub fn previous_statement_date(statement: NaiveDate, statement_day: u32) -> Result<NaiveDate> {
    let month_before = statement
        .with_day(1)
        .and_then(|first| first.checked_sub_months(Months::new(1)))
        .ok_or_else(out_of_range)?;
    clamped(month_before.year(), month_before.month(), statement_day).ok_or_else(out_of_range)
}

/// The first `due_day` strictly after the statement date.
pub fn due_date(statement: NaiveDate, due_day: u32) -> Result<NaiveDate> {
    let same_month = clamped(statement.year(), statement.month(), due_day).ok_or_else(out_of_range)?;
    if same_month > statement {
        return Ok(same_month);
    }
    let next = statement
        .with_day(1)
        .and_then(|first| first.checked_add_months(Months::new(1)))
        .ok_or_else(out_of_range)?;
    clamped(next.year(), next.month(), due_day).ok_or_else(out_of_range)
}

/// Smallest payment that keeps the card in good standing.
pub fn minimum_payment(balance: Decimal, credit_limit: Decimal, threshold: Decimal) -> Decimal {
    if balance <= Decimal::ZERO {
        return Decimal::ZERO;
    }
    let ratio = if credit_limit <= threshold {
        LOW_LIMIT_RATIO
    } else {
        HIGH_LIMIT_RATIO
    };
    round_money((balance * ratio).min(balance))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Statement {
    /// Previous cut; rows on this date belong to the previous statement.
    pub period_start: NaiveDate,
    pub statement_date: NaiveDate,
    pub due_date: NaiveDate,
    pub balance: Decimal,
    pub minimum_payment: Decimal,
}

impl Statement {
    /// Builds the statement in effect on `on` for a known period balance.
    pub fn compute(card: &CardDetails, on: NaiveDate, balance: Decimal, threshold: Decimal) -> Result<Self> {
        card.validate()?;
        let statement_date = statement_date(on, card.statement_day)?;
        Ok(Self {
            period_start: previous_statement_date(statement_date, card.statement_day)?,
            statement_date,
            due_date: due_date(statement_date, card.due_day)?,
            balance: round_money(balance),
            minimum_payment: minimum_payment(balance, card.credit_limit, threshold),
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date > self.period_start && date <= self.statement_date
    }
}

/// Statements and payments for credit card accounts.
pub struct CreditCardService {
    transactions: SharedStore<Transaction>,
    payments: Arc<PaymentService>,
    threshold: Decimal,
}

impl CreditCardService {
    pub fn new(transactions: SharedStore<Transaction>, payments: Arc<PaymentService>) -> Self {
        Self {
            transactions,
            payments,
            threshold: DEFAULT_MIN_PAYMENT_THRESHOLD,
        }
    }

    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.threshold = threshold;
        self
    }

    /// Statement of `card_id` in effect on `on`: spending inside the window
    /// minus payments and refunds inside it.
    pub async fn statement(&self, tenant: TenantId, card_id: EntityId, on: NaiveDate) -> Result<Statement> {
        let card = self.payments.account(tenant, card_id).await?;
        let details = card
            .card
            .filter(|_| card.is_credit_card())
            .ok_or_else(|| LedgerError::validation(format!("Account {} is not a credit card", card.name)))?;

        let empty = Statement::compute(&details, on, Decimal::ZERO, self.threshold)?;
        let balance: Decimal = self
            .transactions
            .get_all()
            .await?
            .iter()
            .filter(|tx| tx.tenant == tenant && empty.contains(tx.date))
            .flat_map(|tx| tx.postings())
            .filter(|posting| posting.account_id == card_id)
            .map(|posting| match posting.direction {
                Direction::Debit => posting.amount,
                Direction::Credit => -posting.amount,
            })
            .sum();

        let statement = Statement::compute(&details, on, balance, self.threshold)?;
        info!(
            card = card_id,
            statement_date = %statement.statement_date,
            balance = %statement.balance,
            minimum = %statement.minimum_payment,
            "statement computed"
        );
        Ok(statement)
    }

    /// Pays `payment.amount` from `payment.account_id` towards the card.
    pub async fn pay(&self, tenant: TenantId, card_id: EntityId, payment: Payment) -> Result<Transaction> {
        self.payments
            .pay(tenant, PaymentTarget::Card { card_account_id: card_id }, payment)
            .await
    }
}
