use super::{DataObject, Writable, require};
use crate::domain::account::{Account, AccountType, CardDetails};
use crate::domain::currency::Currency;
use crate::domain::entity::TenantId;
use crate::domain::money::Balance;
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountData {
    pub name: String,
    pub account_type: AccountType,
    pub currency: Currency,
    /// Opening balance; later changes go through the ledger.
    #[serde(default)]
    pub balance: Decimal,
    #[serde(default)]
    pub card: Option<CardDetails>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl DataObject for AccountData {
    type Model = Account;

    fn from_model(model: &Account) -> Self {
        Self {
            name: model.name.clone(),
            account_type: model.account_type,
            currency: model.currency,
            balance: model.balance.value(),
            card: model.card,
            is_active: model.is_active,
        }
    }
}

impl Writable for AccountData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        match (self.account_type, &self.card) {
            (AccountType::CreditCard, Some(card)) => card.validate(),
            (AccountType::CreditCard, None) => Err(LedgerError::validation(
                "Credit card accounts need a limit, statement day and due day",
            )),
            (_, Some(_)) => Err(LedgerError::validation(
                "Only credit card accounts carry card details",
            )),
            (_, None) => Ok(()),
        }
    }

    fn to_model(&self, tenant: TenantId) -> Result<Account> {
        let mut account = Account::new(tenant, self.name.trim(), self.account_type, self.currency);
        account.balance = Balance::new(self.balance);
        account.card = self.card;
        account.is_active = self.is_active;
        Ok(account)
    }

    fn apply_to(&self, model: &mut Account) -> Result<()> {
        if model.currency != self.currency && !model.balance.value().is_zero() {
            return Err(LedgerError::validation(
                "The currency of an account with a balance cannot change",
            ));
        }
        model.name = self.name.trim().to_string();
        model.account_type = self.account_type;
        model.currency = self.currency;
        model.card = self.card;
        model.is_active = self.is_active;
        Ok(())
    }
}
