use crate::application::account_service::AccountService;
use crate::application::commission_service::CommissionService;
use crate::application::credit_card::CreditCardService;
use crate::application::crud::CrudService;
use crate::application::currency_service::CurrencyService;
use crate::application::customer_service::{CustomerService, LeadService, SupplierService};
use crate::application::debt_service::DebtService;
use crate::application::loan_service::LoanService;
use crate::application::payment_service::PaymentService;
use crate::application::project_service::ProjectService;
use crate::application::scheduler::DailyJobs;
use crate::application::transaction_service::TransactionService;
use crate::application::user_service::{RoleService, SettingService, UserService};
use crate::config::AppConfig;
use crate::domain::account::Account;
use crate::domain::commission::{Commission, CommissionPayout};
use crate::domain::debt::Debt;
use crate::domain::entity::Entity;
use crate::domain::loan::Loan;
use crate::domain::party::{Customer, Lead, Supplier};
use crate::domain::ports::{Notifier, RateFeed, SharedStore};
use crate::domain::project::{Board, Project, Task, TaskList};
use crate::domain::transaction::Transaction;
use crate::domain::user::{Role, Setting, User};
use crate::infrastructure::in_memory::InMemoryStore;
use std::sync::Arc;

/// One store per entity kind.
#[derive(Clone)]
pub struct Stores {
    pub accounts: SharedStore<Account>,
    pub transactions: SharedStore<Transaction>,
    pub debts: SharedStore<Debt>,
    pub loans: SharedStore<Loan>,
    pub customers: SharedStore<Customer>,
    pub leads: SharedStore<Lead>,
    pub suppliers: SharedStore<Supplier>,
    pub commissions: SharedStore<Commission>,
    pub payouts: SharedStore<CommissionPayout>,
    pub projects: SharedStore<Project>,
    pub boards: SharedStore<Board>,
    pub task_lists: SharedStore<TaskList>,
    pub tasks: SharedStore<Task>,
    pub roles: SharedStore<Role>,
    pub users: SharedStore<User>,
    pub settings: SharedStore<Setting>,
}

/// Every entity kind, used to lay out persistent storage.
pub const ENTITY_KINDS: [&str; 16] = [
    Account::KIND,
    Transaction::KIND,
    Debt::KIND,
    Loan::KIND,
    Customer::KIND,
    Lead::KIND,
    Supplier::KIND,
    Commission::KIND,
    CommissionPayout::KIND,
    Project::KIND,
    Board::KIND,
    TaskList::KIND,
    Task::KIND,
    Role::KIND,
    User::KIND,
    Setting::KIND,
];

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            accounts: InMemoryStore::shared(),
            transactions: InMemoryStore::shared(),
            debts: InMemoryStore::shared(),
            loans: InMemoryStore::shared(),
            customers: InMemoryStore::shared(),
            leads: InMemoryStore::shared(),
            suppliers: InMemoryStore::shared(),
            commissions: InMemoryStore::shared(),
            payouts: InMemoryStore::shared(),
            projects: InMemoryStore::shared(),
            boards: InMemoryStore::shared(),
            task_lists: InMemoryStore::shared(),
            tasks: InMemoryStore::shared(),
            roles: InMemoryStore::shared(),
            users: InMemoryStore::shared(),
            settings: InMemoryStore::shared(),
        }
    }

    /// Opens (or creates) a RocksDB database holding every entity kind.
    #[cfg(feature = "storage-rocksdb")]
    pub fn rocksdb<P: AsRef<std::path::Path>>(path: P) -> crate::error::Result<Self> {
        let db = crate::infrastructure::rocksdb::RocksDatabase::open(path, &ENTITY_KINDS)?;
        Ok(Self {
            accounts: Arc::new(db.store::<Account>()),
            transactions: Arc::new(db.store::<Transaction>()),
            debts: Arc::new(db.store::<Debt>()),
            loans: Arc::new(db.store::<Loan>()),
            customers: Arc::new(db.store::<Customer>()),
            leads: Arc::new(db.store::<Lead>()),
            suppliers: Arc::new(db.store::<Supplier>()),
            commissions: Arc::new(db.store::<Commission>()),
            payouts: Arc::new(db.store::<CommissionPayout>()),
            projects: Arc::new(db.store::<Project>()),
            boards: Arc::new(db.store::<Board>()),
            task_lists: Arc::new(db.store::<TaskList>()),
            tasks: Arc::new(db.store::<Task>()),
            roles: Arc::new(db.store::<Role>()),
            users: Arc::new(db.store::<User>()),
            settings: Arc::new(db.store::<Setting>()),
        })
    }
}

/// All services wired over one set of stores.
pub struct Backoffice {
    pub currency: Arc<CurrencyService>,
    pub payments: Arc<PaymentService>,
    pub accounts: AccountService,
    pub transactions: Arc<TransactionService>,
    pub cards: CreditCardService,
    pub debts: Arc<DebtService>,
    pub loans: Arc<LoanService>,
    pub commissions: CommissionService,
    pub customers: CustomerService,
    pub leads: LeadService,
    pub suppliers: SupplierService,
    pub projects: ProjectService,
    pub roles: RoleService,
    pub users: UserService,
    pub settings: SettingService,
    pub daily: DailyJobs,
}

impl Backoffice {
    pub fn new(stores: Stores, feed: Arc<dyn RateFeed>, notifier: Arc<dyn Notifier>, config: &AppConfig) -> Self {
        let currency = Arc::new(CurrencyService::new(feed).with_lookback_days(config.rate_lookback_days));
        let payments = Arc::new(PaymentService::new(
            stores.accounts.clone(),
            stores.transactions.clone(),
            currency.clone(),
        ));
        let transactions = Arc::new(TransactionService::new(stores.transactions.clone(), payments.clone()));
        let debts = Arc::new(DebtService::new(stores.debts.clone(), payments.clone()));
        let loans = Arc::new(LoanService::new(stores.loans.clone(), payments.clone()));
        let customers = CustomerService::new(stores.customers.clone());
        let roles = CrudService::new(stores.roles.clone());

        Self {
            accounts: AccountService::new(CrudService::new(stores.accounts.clone()), payments.clone()),
            cards: CreditCardService::new(stores.transactions.clone(), payments.clone())
                .with_threshold(config.min_payment_threshold),
            commissions: CommissionService::new(
                stores.commissions.clone(),
                stores.payouts.clone(),
                stores.users.clone(),
                payments.clone(),
            ),
            leads: LeadService::new(CrudService::new(stores.leads.clone()), customers.clone()),
            customers,
            suppliers: SupplierService::new(stores.suppliers.clone()),
            projects: ProjectService::new(
                CrudService::new(stores.projects.clone()),
                CrudService::new(stores.boards.clone()),
                CrudService::new(stores.task_lists.clone()),
                CrudService::new(stores.tasks.clone()),
            ),
            roles: RoleService::new(roles.clone()),
            users: UserService::new(CrudService::new(stores.users.clone()), roles),
            settings: SettingService::new(CrudService::new(stores.settings.clone())),
            daily: DailyJobs::new(debts.clone(), loans.clone(), transactions.clone(), notifier),
            currency,
            payments,
            transactions,
            debts,
            loans,
        }
    }

    /// In-memory stores, handy for tests and one-shot runs.
    pub fn in_memory(feed: Arc<dyn RateFeed>, notifier: Arc<dyn Notifier>, config: &AppConfig) -> Self {
        Self::new(Stores::in_memory(), feed, notifier, config)
    }
}
