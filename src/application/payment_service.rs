use crate::application::currency_service::CurrencyService;
use crate::domain::account::Account;
use crate::domain::currency::Currency;
use crate::domain::debt::DebtDirection;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::money::Amount;
use crate::domain::ports::SharedStore;
use crate::domain::transaction::{Direction, Posting, Reference, Transaction, TransactionType};
use crate::error::{LedgerError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// The thing a payment settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentTarget {
    Debt { id: EntityId, direction: DebtDirection },
    LoanInstallment { loan_id: EntityId },
    /// Pays down the debt on a credit card account.
    Card { card_account_id: EntityId },
    CommissionPayout { payout_id: EntityId },
}

impl PaymentTarget {
    fn transaction_type(&self) -> TransactionType {
        match self {
            PaymentTarget::Debt { .. } => TransactionType::DebtPayment,
            PaymentTarget::LoanInstallment { .. } => TransactionType::LoanPayment,
            PaymentTarget::Card { .. } => TransactionType::CardPayment,
            PaymentTarget::CommissionPayout { .. } => TransactionType::CommissionPayout,
        }
    }

    /// Effect on the paying account.
    fn direction(&self) -> Direction {
        match self {
            PaymentTarget::Debt {
                direction: DebtDirection::Receivable,
                ..
            } => Direction::Credit,
            _ => Direction::Debit,
        }
    }

    fn reference(&self) -> Reference {
        match *self {
            PaymentTarget::Debt { id, .. } => Reference::Debt(id),
            PaymentTarget::LoanInstallment { loan_id } => Reference::Loan(loan_id),
            PaymentTarget::Card { card_account_id } => Reference::Card(card_account_id),
            PaymentTarget::CommissionPayout { payout_id } => Reference::CommissionPayout(payout_id),
        }
    }
}

/// A payment as requested: `amount` is in `currency`, which may differ from
/// the paying account's currency.
#[derive(Debug, Clone, PartialEq)]
pub struct Payment {
    pub account_id: EntityId,
    pub amount: Amount,
    pub currency: Currency,
    pub date: NaiveDate,
    pub description: Option<String>,
}

/// Held while a caller reads and writes ledger state as one step.
///
/// Services that check a row before paying it (a debt's remaining amount, a
/// loan's remaining installments) take the guard first and call the `*_locked`
/// variants, so no other payment can interleave.
pub struct LedgerGuard<'a> {
    _guard: MutexGuard<'a, ()>,
}

/// Applies balance changes and keeps the audit trail.
///
/// Every mutation of an account balance goes through [`PaymentService::post`]
/// or [`PaymentService::reverse`], which hold the ledger lock for the whole
/// read-modify-write.
pub struct PaymentService {
    accounts: SharedStore<Account>,
    transactions: SharedStore<Transaction>,
    currency: Arc<CurrencyService>,
    ledger: Mutex<()>,
}

impl PaymentService {
    pub fn new(
        accounts: SharedStore<Account>,
        transactions: SharedStore<Transaction>,
        currency: Arc<CurrencyService>,
    ) -> Self {
        Self {
            accounts,
            transactions,
            currency,
            ledger: Mutex::new(()),
        }
    }

    pub fn currency(&self) -> &Arc<CurrencyService> {
        &self.currency
    }

    /// Loads an account of `tenant`, treating soft-deleted accounts as missing.
    pub async fn account(&self, tenant: TenantId, id: EntityId) -> Result<Account> {
        match self.accounts.get(id).await? {
            Some(account) if account.tenant == tenant && account.deleted_at.is_none() => Ok(account),
            _ => Err(LedgerError::not_found("accounts", id)),
        }
    }

    /// Takes the ledger lock. Not reentrant: while the guard is held only the
    /// `*_locked` methods may be called.
    pub async fn lock(&self) -> LedgerGuard<'_> {
        LedgerGuard {
            _guard: self.ledger.lock().await,
        }
    }

    /// Applies the postings of `record` and stores it.
    pub async fn post(&self, tenant: TenantId, record: Transaction) -> Result<Transaction> {
        let ledger = self.lock().await;
        self.post_locked(&ledger, tenant, record).await
    }

    /// Stores the audit row first and removes it again if the balances
    /// cannot be applied, so a row exists exactly when its postings do.
    pub async fn post_locked(
        &self,
        _ledger: &LedgerGuard<'_>,
        tenant: TenantId,
        mut record: Transaction,
    ) -> Result<Transaction> {
        record.tenant = tenant;
        record.try_equivalent = self
            .currency
            .to_try(record.amount, record.currency, record.date)
            .await?;

        let record = self.transactions.insert(record).await?;
        if let Err(e) = self.apply(tenant, &record.postings(), true).await {
            if let Err(undo) = self.transactions.remove(record.id).await {
                warn!(tx = record.id, error = %undo, "could not discard audit row");
            }
            return Err(e);
        }
        debug!(
            tx = record.id,
            account = record.account_id,
            kind = ?record.transaction_type,
            amount = %record.amount,
            "posted"
        );
        Ok(record)
    }

    /// Undoes the balance effect of a stored row. The row itself is left alone.
    pub async fn reverse(&self, tenant: TenantId, record: &Transaction) -> Result<()> {
        let postings: Vec<Posting> = record
            .postings()
            .into_iter()
            .map(|posting| Posting {
                direction: posting.direction.reversed(),
                ..posting
            })
            .collect();
        let _ledger = self.lock().await;
        // Reverting must work on accounts closed since.
        self.apply(tenant, &postings, false).await?;
        debug!(tx = record.id, "reversed");
        Ok(())
    }

    /// Moves money for `target` and writes the audit row.
    pub async fn pay(&self, tenant: TenantId, target: PaymentTarget, payment: Payment) -> Result<Transaction> {
        let ledger = self.lock().await;
        self.pay_locked(&ledger, tenant, target, payment).await
    }

    pub async fn pay_locked(
        &self,
        ledger: &LedgerGuard<'_>,
        tenant: TenantId,
        target: PaymentTarget,
        payment: Payment,
    ) -> Result<Transaction> {
        let account = self.account(tenant, payment.account_id).await?;
        let amount = self
            .currency
            .convert(payment.amount.value(), payment.currency, account.currency, payment.date)
            .await?;
        Amount::new(amount)?;

        let mut record = Transaction::new(
            tenant,
            account.id,
            target.transaction_type(),
            amount,
            account.currency,
            payment.date,
        );
        record.direction = target.direction();
        record.reference = Some(target.reference());
        record.description = payment.description;

        if let PaymentTarget::Card { card_account_id } = target {
            if card_account_id == account.id {
                return Err(LedgerError::validation("A card cannot pay itself"));
            }
            let card = self.account(tenant, card_account_id).await?;
            if !card.is_credit_card() {
                return Err(LedgerError::validation(format!(
                    "Account {} is not a credit card",
                    card.name
                )));
            }
            record.destination_account_id = Some(card.id);
            if card.currency != account.currency {
                record.exchange_rate = Some(
                    self.currency
                        .rate(account.currency, card.currency, payment.date)
                        .await?,
                );
            }
        }

        let record = self.post_locked(ledger, tenant, record).await?;
        info!(
            tx = record.id,
            account = record.account_id,
            reference = ?record.reference,
            amount = %record.amount,
            currency = %record.currency,
            "payment recorded"
        );
        Ok(record)
    }

    /// Loads every touched account, applies the postings in memory and only
    /// then writes the accounts back. If a write fails, the accounts already
    /// written are restored, so a failing posting changes nothing.
    async fn apply(&self, tenant: TenantId, postings: &[Posting], require_active: bool) -> Result<()> {
        let mut originals: BTreeMap<EntityId, Account> = BTreeMap::new();
        let mut touched: BTreeMap<EntityId, Account> = BTreeMap::new();
        for posting in postings {
            if !touched.contains_key(&posting.account_id) {
                let account = self.account(tenant, posting.account_id).await?;
                if require_active {
                    account.ensure_active()?;
                }
                originals.insert(account.id, account.clone());
                touched.insert(account.id, account);
            }
            let amount = Amount::new(posting.amount)?;
            if let Some(account) = touched.get_mut(&posting.account_id) {
                match posting.direction {
                    Direction::Credit => account.credit(amount),
                    Direction::Debit => account.debit(amount),
                }
            }
        }

        let mut written = Vec::new();
        for account in touched.into_values() {
            let id = account.id;
            debug!(account = id, balance = %account.balance, "balance updated");
            if let Err(e) = self.accounts.update(account).await {
                for id in written {
                    if let Some(original) = originals.remove(&id) {
                        if let Err(undo) = self.accounts.update(original).await {
                            warn!(account = id, error = %undo, "could not restore balance");
                        }
                    }
                }
                return Err(e);
            }
            written.push(id);
        }
        Ok(())
    }

    /// Sum of the balances of `tenant`'s accounts in `currency`.
    pub async fn total_balance(&self, tenant: TenantId, currency: Currency) -> Result<Decimal> {
        Ok(self
            .accounts
            .get_all()
            .await?
            .into_iter()
            .filter(|a| a.tenant == tenant && a.deleted_at.is_none() && a.currency == currency)
            .map(|a| a.balance.value())
            .sum())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::account::{AccountType, CardDetails};
    use crate::application::test_support::FlakyStore;
    use crate::domain::money::Balance;
    use crate::infrastructure::in_memory::InMemoryStore;
    use std::sync::atomic::Ordering;
    use crate::infrastructure::static_rates::StaticRateFeed;
    use rust_decimal_macros::dec;

    const TENANT: TenantId = TenantId(1);

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 10).unwrap()
    }

    struct Fixture {
        accounts: SharedStore<Account>,
        transactions: SharedStore<Transaction>,
        service: PaymentService,
    }

    fn fixture() -> Fixture {
        let accounts: SharedStore<Account> = InMemoryStore::shared();
        let transactions: SharedStore<Transaction> = InMemoryStore::shared();
        let currency = Arc::new(CurrencyService::new(Arc::new(StaticRateFeed)).with_lookback_days(0));
        let service = PaymentService::new(accounts.clone(), transactions.clone(), currency);
        Fixture {
            accounts,
            transactions,
            service,
        }
    }

    async fn open(fx: &Fixture, account_type: AccountType, balance: Decimal) -> Account {
        let mut account = Account::new(TENANT, "acc", account_type, Currency::TRY);
        account.balance = Balance::new(balance);
        if account_type == AccountType::CreditCard {
            account.card = Some(CardDetails {
                credit_limit: dec!(10000),
                statement_day: 15,
                due_day: 25,
            });
        }
        fx.accounts.insert(account).await.unwrap()
    }

    fn payment(account_id: EntityId, amount: Decimal) -> Payment {
        Payment {
            account_id,
            amount: Amount::new(amount).unwrap(),
            currency: Currency::TRY,
            date: date(),
            description: None,
        }
    }

    async fn balance(fx: &Fixture, id: EntityId) -> Decimal {
        fx.accounts.get(id).await.unwrap().unwrap().balance.value()
    }

    #[tokio::test]
    async fn test_receivable_debt_credits_and_payable_debits() {
        let fx = fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(100)).await;

        let receivable = PaymentTarget::Debt { id: 1, direction: DebtDirection::Receivable };
        fx.service.pay(TENANT, receivable, payment(bank.id, dec!(40))).await.unwrap();
        assert_eq!(balance(&fx, bank.id).await, dec!(140));

        let payable = PaymentTarget::Debt { id: 2, direction: DebtDirection::Payable };
        let record = fx.service.pay(TENANT, payable, payment(bank.id, dec!(15))).await.unwrap();
        assert_eq!(balance(&fx, bank.id).await, dec!(125));
        assert_eq!(record.transaction_type, TransactionType::DebtPayment);
        assert_eq!(record.reference, Some(Reference::Debt(2)));
        assert_eq!(fx.transactions.get_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_card_payment_moves_money_and_reduces_card_debt() {
        let fx = fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(1000)).await;
        let card = open(&fx, AccountType::CreditCard, dec!(600)).await;

        let target = PaymentTarget::Card { card_account_id: card.id };
        fx.service.pay(TENANT, target, payment(bank.id, dec!(250))).await.unwrap();

        assert_eq!(balance(&fx, bank.id).await, dec!(750));
        assert_eq!(balance(&fx, card.id).await, dec!(350));
    }

    #[tokio::test]
    async fn test_card_payment_to_non_card_is_rejected() {
        let fx = fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(1000)).await;
        let cash = open(&fx, AccountType::Cash, dec!(0)).await;

        let target = PaymentTarget::Card { card_account_id: cash.id };
        assert!(fx.service.pay(TENANT, target, payment(bank.id, dec!(10))).await.is_err());
        assert_eq!(balance(&fx, bank.id).await, dec!(1000));
        assert!(fx.transactions.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_foreign_currency_payment_is_converted() {
        let fx = fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(0)).await;
        let mut usd = payment(bank.id, dec!(10));
        usd.currency = Currency::USD;

        let target = PaymentTarget::Debt { id: 1, direction: DebtDirection::Receivable };
        let record = fx.service.pay(TENANT, target, usd).await.unwrap();

        // Fallback USD buying rate is 41.80.
        assert_eq!(record.amount, dec!(418.00));
        assert_eq!(record.currency, Currency::TRY);
        assert_eq!(balance(&fx, bank.id).await, dec!(418.00));
    }

    #[tokio::test]
    async fn test_reverse_restores_balances() {
        let fx = fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(500)).await;
        let card = open(&fx, AccountType::CreditCard, dec!(300)).await;

        let target = PaymentTarget::Card { card_account_id: card.id };
        let record = fx.service.pay(TENANT, target, payment(bank.id, dec!(100))).await.unwrap();
        fx.service.reverse(TENANT, &record).await.unwrap();

        assert_eq!(balance(&fx, bank.id).await, dec!(500));
        assert_eq!(balance(&fx, card.id).await, dec!(300));
    }

    #[tokio::test]
    async fn test_other_tenant_account_is_not_found() {
        let fx = fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(500)).await;
        let target = PaymentTarget::LoanInstallment { loan_id: 1 };
        let err = fx
            .service
            .pay(TenantId(9), target, payment(bank.id, dec!(1)))
            .await
            .unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    fn flaky_fixture() -> (Arc<FlakyStore<Account>>, Arc<FlakyStore<Transaction>>, Fixture) {
        let flaky_accounts = Arc::new(FlakyStore::<Account>::default());
        let flaky_transactions = Arc::new(FlakyStore::<Transaction>::default());
        let accounts: SharedStore<Account> = flaky_accounts.clone();
        let transactions: SharedStore<Transaction> = flaky_transactions.clone();
        let currency = Arc::new(CurrencyService::new(Arc::new(StaticRateFeed)).with_lookback_days(0));
        let service = PaymentService::new(accounts.clone(), transactions.clone(), currency);
        let fx = Fixture {
            accounts,
            transactions,
            service,
        };
        (flaky_accounts, flaky_transactions, fx)
    }

    #[tokio::test]
    async fn test_failed_audit_insert_leaves_balances_alone() {
        let (_, transactions, fx) = flaky_fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(100)).await;
        transactions.fail_inserts.store(true, Ordering::SeqCst);

        let target = PaymentTarget::Debt { id: 1, direction: DebtDirection::Payable };
        assert!(fx.service.pay(TENANT, target, payment(bank.id, dec!(40))).await.is_err());

        assert_eq!(balance(&fx, bank.id).await, dec!(100));
        assert!(fx.transactions.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_account_write_rolls_back_the_payment() {
        let (accounts, _, fx) = flaky_fixture();
        let bank = open(&fx, AccountType::BankAccount, dec!(1000)).await;
        let card = open(&fx, AccountType::CreditCard, dec!(600)).await;
        accounts.fail_update_of.store(card.id, Ordering::SeqCst);

        let target = PaymentTarget::Card { card_account_id: card.id };
        assert!(fx.service.pay(TENANT, target, payment(bank.id, dec!(250))).await.is_err());

        assert_eq!(balance(&fx, bank.id).await, dec!(1000));
        assert_eq!(balance(&fx, card.id).await, dec!(600));
        assert!(fx.transactions.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_payments_do_not_lose_updates() {
        let fx = Arc::new(fixture());
        let bank_id = open(&fx, AccountType::BankAccount, dec!(0)).await.id;

        let mut handles = Vec::new();
        for _ in 0..20 {
            let fx = fx.clone();
            handles.push(tokio::spawn(async move {
                let target = PaymentTarget::Debt { id: 1, direction: DebtDirection::Receivable };
                fx.service.pay(TENANT, target, payment(bank_id, dec!(5))).await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(balance(&fx, bank_id).await, dec!(100));
    }
}
