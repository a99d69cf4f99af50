use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::{Amount, Balance};
use crate::error::LedgerError;
use crate::impl_entity;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    BankAccount,
    CreditCard,
    CryptoWallet,
    VirtualPos,
    Cash,
}

/// Billing parameters of a credit card.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone, Copy)]
pub struct CardDetails {
    pub credit_limit: Decimal,
    /// Day of month the statement closes (1..=31, clamped to month length).
    pub statement_day: u32,
    /// Day of month the statement is due (1..=31, clamped to month length).
    pub due_day: u32,
}

impl CardDetails {
    pub fn validate(&self) -> Result<(), LedgerError> {
        if self.credit_limit < Decimal::ZERO {
            return Err(LedgerError::validation("Credit limit cannot be negative"));
        }
        if !(1..=31).contains(&self.statement_day) || !(1..=31).contains(&self.due_day) {
            return Err(LedgerError::validation(
                "Statement and due days must be between 1 and 31",
            ));
        }
        Ok(())
    }
}

/// A place money sits in: a bank account, a card, a wallet or a till.
///
/// For credit cards `balance` is the outstanding debt; for every other type it
/// is the money on hand.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Account {
    pub id: EntityId,
    pub tenant: TenantId,
    pub name: String,
    pub account_type: AccountType,
    pub currency: Currency,
    pub balance: Balance,
    pub card: Option<CardDetails>,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_entity!(Account, "accounts", soft_delete);

impl Account {
    pub fn new(tenant: TenantId, name: impl Into<String>, account_type: AccountType, currency: Currency) -> Self {
        Self {
            id: 0,
            tenant,
            name: name.into(),
            account_type,
            currency,
            balance: Balance::ZERO,
            card: None,
            is_active: true,
            deleted_at: None,
        }
    }

    pub fn is_credit_card(&self) -> bool {
        self.account_type == AccountType::CreditCard
    }

    /// Money coming in: a deposit, or a payment towards a card.
    pub fn credit(&mut self, amount: Amount) {
        if self.is_credit_card() {
            self.balance -= amount.into();
        } else {
            self.balance += amount.into();
        }
    }

    /// Money going out: a withdrawal, or spending on a card.
    pub fn debit(&mut self, amount: Amount) {
        if self.is_credit_card() {
            self.balance += amount.into();
        } else {
            self.balance -= amount.into();
        }
    }

    /// Unused credit on a card; `None` for other account types.
    pub fn available_limit(&self) -> Option<Decimal> {
        self.card
            .map(|card| card.credit_limit - self.balance.value())
    }

    pub fn ensure_active(&self) -> Result<(), LedgerError> {
        if self.is_active && self.deleted_at.is_none() {
            Ok(())
        } else {
            Err(LedgerError::validation(format!(
                "Account {} is not active",
                self.name
            )))
        }
    }
}
