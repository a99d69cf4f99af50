use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::round_money;
use crate::error::LedgerError;
use crate::impl_entity;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum CommissionStatus {
    #[default]
    Pending,
    Paid,
}

/// Commission earned by a user on a sale.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Commission {
    pub id: EntityId,
    pub tenant: TenantId,
    pub user_id: EntityId,
    pub customer_id: Option<EntityId>,
    pub transaction_id: Option<EntityId>,
    pub sale_amount: Decimal,
    /// Percentage, 0..=100.
    pub rate: Decimal,
    pub amount: Decimal,
    pub currency: Currency,
    pub status: CommissionStatus,
    pub payout_id: Option<EntityId>,
    pub date: NaiveDate,
}

impl_entity!(Commission, "commissions");

/// Money paid out to a user to settle their pending commissions.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct CommissionPayout {
    pub id: EntityId,
    pub tenant: TenantId,
    pub user_id: EntityId,
    pub account_id: EntityId,
    pub amount: Decimal,
    pub currency: Currency,
    pub date: NaiveDate,
    pub transaction_id: Option<EntityId>,
}

impl_entity!(CommissionPayout, "commission_payouts");

pub fn validate_rate(rate: Decimal) -> Result<(), LedgerError> {
    if rate < Decimal::ZERO || rate > Decimal::ONE_HUNDRED {
        return Err(LedgerError::validation(
            "Commission rate must be between 0 and 100",
        ));
    }
    Ok(())
}

/// Commission on `sale_amount` at `rate` percent.
pub fn commission_amount(sale_amount: Decimal, rate: Decimal) -> Result<Decimal, LedgerError> {
    validate_rate(rate)?;
    Ok(round_money(sale_amount * rate / Decimal::ONE_HUNDRED))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_commission_amount() {
        assert_eq!(commission_amount(dec!(1250), dec!(7.5)).unwrap(), dec!(93.75));
        assert_eq!(commission_amount(dec!(99.99), dec!(3)).unwrap(), dec!(3.00));
        assert_eq!(commission_amount(dec!(500), dec!(0)).unwrap(), dec!(0));
    }

    #[test]
    fn test_commission_rate_bounds() {
        assert!(commission_amount(dec!(100), dec!(100.01)).is_err());
        assert!(commission_amount(dec!(100), dec!(-1)).is_err());
    }
}
