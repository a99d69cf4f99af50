use chrono::NaiveDate;
use ledgerdesk::domain::account::{Account, AccountType};
use ledgerdesk::domain::currency::Currency;
use ledgerdesk::domain::entity::TenantId;
use ledgerdesk::domain::money::Balance;
use ledgerdesk::domain::ports::EntityStoreBox;
use ledgerdesk::domain::transaction::{Transaction, TransactionType};
use ledgerdesk::infrastructure::in_memory::InMemoryStore;
use rust_decimal_macros::dec;

#[tokio::test]
async fn test_stores_as_trait_objects() {
    let account_store: EntityStoreBox<Account> = Box::new(InMemoryStore::new());
    let transaction_store: EntityStoreBox<Transaction> = Box::new(InMemoryStore::new());

    let mut account = Account::new(TenantId(1), "Main", AccountType::BankAccount, Currency::TRY);
    account.balance = Balance::new(dec!(100.0));

    let tx = Transaction::new(
        TenantId(1),
        1,
        TransactionType::Income,
        dec!(100.0),
        Currency::TRY,
        NaiveDate::from_ymd_opt(2026, 1, 2).unwrap(),
    );

    // Verify Send + Sync by spawning tasks
    let as_handle = tokio::spawn(async move {
        let stored = account_store.insert(account).await.unwrap();
        account_store.get(stored.id).await.unwrap().unwrap()
    });

    let ts_handle = tokio::spawn(async move {
        let stored = transaction_store.insert(tx).await.unwrap();
        transaction_store.get(stored.id).await.unwrap().unwrap()
    });

    let retrieved_account = as_handle.await.unwrap();
    assert_eq!(retrieved_account.id, 1);
    assert_eq!(retrieved_account.balance.value(), dec!(100));

    let retrieved_tx = ts_handle.await.unwrap();
    assert_eq!(retrieved_tx.id, 1);
    assert_eq!(retrieved_tx.account_id, 1);
}
