use crate::domain::currency::Currency;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::round_money;
use crate::error::LedgerError;
use crate::impl_entity;
use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    #[default]
    Active,
    Paid,
}

/// A bank loan repaid in monthly installments.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Loan {
    pub id: EntityId,
    pub tenant: TenantId,
    pub bank_name: String,
    pub loan_type: Option<String>,
    /// Account the principal was paid into, if any.
    pub account_id: Option<EntityId>,
    pub amount: Decimal,
    pub monthly_payment: Decimal,
    pub installments: u32,
    pub remaining_installments: u32,
    pub currency: Currency,
    pub start_date: NaiveDate,
    pub next_payment_date: Option<NaiveDate>,
    pub status: LoanStatus,
}

impl_entity!(Loan, "loans");

impl Loan {
    /// Monthly payment of an annuity loan, rounded to money scale.
    ///
    /// A zero rate splits the principal evenly.
    pub fn annuity_payment(principal: Decimal, monthly_rate: Decimal, installments: u32) -> Result<Decimal, LedgerError> {
        if installments == 0 {
            return Err(LedgerError::validation("Installment count must be positive"));
        }
        if monthly_rate < Decimal::ZERO {
            return Err(LedgerError::validation("Interest rate cannot be negative"));
        }
        let n = Decimal::from(installments);
        if monthly_rate.is_zero() {
            return Ok(round_money(principal / n));
        }
        let overflow = || LedgerError::validation("Loan terms are out of range");
        let factor = Decimal::ONE.checked_add(monthly_rate).ok_or_else(overflow)?;
        let mut growth = Decimal::ONE;
        for _ in 0..installments {
            growth = growth.checked_mul(factor).ok_or_else(overflow)?;
        }
        let payment = principal
            .checked_mul(monthly_rate)
            .and_then(|interest| interest.checked_mul(growth))
            .and_then(|scaled| scaled.checked_div(growth - Decimal::ONE))
            .ok_or_else(overflow)?;
        Ok(round_money(payment))
    }

    pub fn paid_installments(&self) -> u32 {
        self.installments - self.remaining_installments
    }

    /// Amount still to be repaid, assuming the last installment settles the rest.
    pub fn outstanding(&self) -> Decimal {
        if self.status == LoanStatus::Paid {
            return Decimal::ZERO;
        }
        self.monthly_payment * Decimal::from(self.remaining_installments)
    }

    /// Amount of the installment about to be paid.
    pub fn next_installment_amount(&self) -> Decimal {
        self.monthly_payment
    }

    /// Records one paid installment and moves the schedule forward.
    pub fn record_installment(&mut self) -> Result<(), LedgerError> {
        if self.status == LoanStatus::Paid || self.remaining_installments == 0 {
            return Err(LedgerError::validation("Loan is already paid off"));
        }
        self.remaining_installments -= 1;
        if self.remaining_installments == 0 {
            self.status = LoanStatus::Paid;
            self.next_payment_date = None;
        } else {
            self.next_payment_date = self
                .start_date
                .checked_add_months(Months::new(self.paid_installments()));
        }
        Ok(())
    }

    pub fn is_due_within(&self, today: NaiveDate, days: i64) -> bool {
        self.status == LoanStatus::Active
            && self
                .next_payment_date
                .is_some_and(|next| (next - today).num_days() <= days)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn loan() -> Loan {
        Loan {
            id: 1,
            tenant: TenantId(1),
            bank_name: "Ziraat".into(),
            loan_type: None,
            account_id: None,
            amount: dec!(3000),
            monthly_payment: dec!(1000),
            installments: 3,
            remaining_installments: 3,
            currency: Currency::TRY,
            start_date: NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
            next_payment_date: NaiveDate::from_ymd_opt(2026, 1, 31),
            status: LoanStatus::Active,
        }
    }

    #[test]
    fn test_annuity_payment_zero_rate() {
        assert_eq!(Loan::annuity_payment(dec!(1200), dec!(0), 12).unwrap(), dec!(100));
    }

    #[test]
    fn test_annuity_payment_with_interest() {
        // 10 000 at 1% a month over 12 months
        assert_eq!(
            Loan::annuity_payment(dec!(10000), dec!(0.01), 12).unwrap(),
            dec!(888.49)
        );
    }

    #[test]
    fn test_annuity_payment_rejects_terms_that_overflow() {
        let err = Loan::annuity_payment(dec!(10000), dec!(0.05), 1500).unwrap_err();
        assert!(matches!(err, LedgerError::ValidationError(_)));
    }

    #[test]
    fn test_annuity_payment_rejects_zero_installments() {
        assert!(Loan::annuity_payment(dec!(10), dec!(0.01), 0).is_err());
    }

    #[test]
    fn test_record_installment_schedule() {
        let mut loan = loan();
        loan.record_installment().unwrap();
        assert_eq!(loan.remaining_installments, 2);
        assert_eq!(loan.next_payment_date, NaiveDate::from_ymd_opt(2026, 2, 28));
        loan.record_installment().unwrap();
        assert_eq!(loan.next_payment_date, NaiveDate::from_ymd_opt(2026, 3, 31));
        loan.record_installment().unwrap();
        assert_eq!(loan.status, LoanStatus::Paid);
        assert_eq!(loan.next_payment_date, None);
        assert!(loan.record_installment().is_err());
    }

    #[test]
    fn test_due_within() {
        let loan = loan();
        let today = NaiveDate::from_ymd_opt(2026, 1, 28).unwrap();
        assert!(loan.is_due_within(today, 3));
        assert!(!loan.is_due_within(today, 2));
    }
}
