use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use ledgerdesk::application::backoffice::{Backoffice, Stores};
use ledgerdesk::application::credit_card::Statement;
use ledgerdesk::application::currency_service::CurrencyService;
use ledgerdesk::application::import::LedgerImporter;
use ledgerdesk::config::AppConfig;
use ledgerdesk::domain::account::CardDetails;
use ledgerdesk::domain::currency::Currency;
use ledgerdesk::domain::entity::TenantId;
use ledgerdesk::domain::ports::{Notifier, RateFeed};
use ledgerdesk::infrastructure::static_rates::StaticRateFeed;
use ledgerdesk::infrastructure::tcmb::TcmbRateFeed;
use ledgerdesk::infrastructure::telegram::{LogNotifier, TelegramNotifier};
use ledgerdesk::interfaces::csv::ledger_reader::LedgerReader;
use ledgerdesk::interfaces::csv::report_writer::ReportWriter;
use miette::{IntoDiagnostic, Result};
use rust_decimal::Decimal;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Tenant the command acts for
    #[arg(long, global = true, default_value_t = 1)]
    tenant: u64,

    /// Path to a persistent database. Needs the `storage-rocksdb` feature.
    #[arg(long, global = true)]
    db_path: Option<PathBuf>,

    /// Price with the built-in rate table instead of the central bank feed
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Apply a ledger CSV file and print the resulting balances
    Import {
        /// CSV with the columns type,tx,account,amount,currency,target
        input: PathBuf,
    },
    /// Print the rate table in effect on a date
    Rates {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Convert an amount between two currencies
    Convert {
        amount: Decimal,
        #[arg(value_parser = parse_currency)]
        from: Currency,
        #[arg(value_parser = parse_currency)]
        to: Currency,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Compute a credit card statement for a period balance
    Statement {
        #[arg(long)]
        limit: Decimal,
        #[arg(long)]
        statement_day: u32,
        #[arg(long)]
        due_day: u32,
        /// Net spending inside the statement window
        #[arg(long, default_value_t = Decimal::ZERO)]
        debits: Decimal,
        #[arg(long)]
        date: Option<NaiveDate>,
    },
    /// Run the daily housekeeping jobs
    Daily {
        #[arg(long)]
        date: Option<NaiveDate>,
    },
}

fn parse_currency(value: &str) -> std::result::Result<Currency, String> {
    value.parse().map_err(|e: ledgerdesk::error::LedgerError| e.to_string())
}

fn rate_feed(offline: bool, config: &AppConfig) -> Result<Arc<dyn RateFeed>> {
    if offline {
        return Ok(Arc::new(StaticRateFeed));
    }
    let feed = TcmbRateFeed::new(config.rate_feed_url.clone(), config.http_timeout).into_diagnostic()?;
    Ok(Arc::new(feed))
}

fn notifier(config: &AppConfig) -> Result<Arc<dyn Notifier>> {
    match &config.telegram {
        Some(telegram) => {
            let notifier = TelegramNotifier::new(&telegram.bot_token, &telegram.chat_id, config.http_timeout)
                .into_diagnostic()?;
            Ok(Arc::new(notifier))
        }
        None => Ok(Arc::new(LogNotifier)),
    }
}

fn stores(db_path: Option<&Path>) -> Result<Stores> {
    match db_path {
        #[cfg(feature = "storage-rocksdb")]
        Some(path) => Stores::rocksdb(path).into_diagnostic(),
        #[cfg(not(feature = "storage-rocksdb"))]
        Some(_) => {
            warn!(
                "Persistent storage requested via --db-path, but 'storage-rocksdb' feature is not enabled. Falling back to in-memory storage."
            );
            Ok(Stores::in_memory())
        }
        None => Ok(Stores::in_memory()),
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env().into_diagnostic()?;
    let db_path = cli.db_path.clone().or_else(|| config.db_path.clone());
    let tenant = TenantId(cli.tenant);

    match cli.command {
        Command::Import { input } => {
            let office = Backoffice::new(
                stores(db_path.as_deref())?,
                rate_feed(cli.offline, &config)?,
                notifier(&config)?,
                &config,
            );
            let file = File::open(input).into_diagnostic()?;
            let importer = LedgerImporter::new(&office, tenant, today()).await.into_diagnostic()?;
            importer
                .run(LedgerReader::new(file).entries())
                .await
                .into_diagnostic()?;

            let accounts = office.accounts.list(tenant).await.into_diagnostic()?;
            let mut writer = ReportWriter::new(io::stdout().lock());
            writer.write_balances(&accounts).into_diagnostic()?;
        }
        Command::Rates { date } => {
            let currency = CurrencyService::new(rate_feed(cli.offline, &config)?)
                .with_lookback_days(config.rate_lookback_days);
            let table = currency.rates_for(date.unwrap_or_else(today)).await;
            if table.is_fallback() {
                warn!("No bulletin found, showing the built-in rates");
            }
            let mut writer = ReportWriter::new(io::stdout().lock());
            writer.write_rates(&table).into_diagnostic()?;
        }
        Command::Convert { amount, from, to, date } => {
            let currency = CurrencyService::new(rate_feed(cli.offline, &config)?)
                .with_lookback_days(config.rate_lookback_days);
            let converted = currency
                .convert(amount, from, to, date.unwrap_or_else(today))
                .await
                .into_diagnostic()?;
            println!("{} {from} = {} {to}", amount.normalize(), converted.normalize());
        }
        Command::Statement {
            limit,
            statement_day,
            due_day,
            debits,
            date,
        } => {
            let card = CardDetails {
                credit_limit: limit,
                statement_day,
                due_day,
            };
            let statement = Statement::compute(
                &card,
                date.unwrap_or_else(today),
                debits,
                config.min_payment_threshold,
            )
            .into_diagnostic()?;
            let mut writer = ReportWriter::new(io::stdout().lock());
            writer.write_statement(&statement).into_diagnostic()?;
        }
        Command::Daily { date } => {
            let office = Backoffice::new(
                stores(db_path.as_deref())?,
                rate_feed(cli.offline, &config)?,
                notifier(&config)?,
                &config,
            );
            let report = office
                .daily
                .run(date.unwrap_or_else(today))
                .await
                .into_diagnostic()?;
            println!("{}", serde_json::to_string(&report).into_diagnostic()?);
        }
    }

    Ok(())
}
