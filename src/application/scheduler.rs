use crate::application::debt_service::DebtService;
use crate::application::loan_service::LoanService;
use crate::application::transaction_service::TransactionService;
use crate::domain::debt::{Debt, DebtDirection};
use crate::domain::loan::Loan;
use crate::domain::ports::Notifier;
use crate::error::Result;
use chrono::NaiveDate;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

/// Loans are announced this many days before an installment falls due.
pub const LOAN_REMINDER_DAYS: i64 = 3;

/// Escapes text for the HTML subset notification messages are written in.
fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn overdue_message(debt: &Debt) -> String {
    let side = match debt.direction {
        DebtDirection::Receivable => "Receivable",
        DebtDirection::Payable => "Payable",
    };
    let due = debt.due_date.map(|d| d.to_string()).unwrap_or_default();
    format!(
        "<b>Overdue</b>: {side} {} {} {} (due {due})",
        escape_html(&debt.description),
        debt.remaining,
        debt.currency
    )
}

fn loan_reminder(loan: &Loan) -> String {
    let due = loan.next_payment_date.map(|d| d.to_string()).unwrap_or_default();
    format!(
        "<b>Loan installment</b>: {} {} {} due {due} ({} left)",
        escape_html(&loan.bank_name),
        loan.monthly_payment,
        loan.currency,
        loan.remaining_installments
    )
}

/// What one run of the daily job did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DailyReport {
    pub overdue_debts: usize,
    pub recurring_charges: usize,
    pub loan_reminders: usize,
    pub failed_notifications: usize,
}

/// The once-a-day housekeeping, meant to be driven by an external scheduler.
pub struct DailyJobs {
    debts: Arc<DebtService>,
    loans: Arc<LoanService>,
    transactions: Arc<TransactionService>,
    notifier: Arc<dyn Notifier>,
}

impl DailyJobs {
    pub fn new(
        debts: Arc<DebtService>,
        loans: Arc<LoanService>,
        transactions: Arc<TransactionService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            debts,
            loans,
            transactions,
            notifier,
        }
    }

    async fn notify(&self, report: &mut DailyReport, message: String) {
        if let Err(e) = self.notifier.notify(&message).await {
            warn!(error = %e, "notification failed");
            report.failed_notifications += 1;
        }
    }

    pub async fn run(&self, today: NaiveDate) -> Result<DailyReport> {
        let mut report = DailyReport::default();

        for tenant in self.debts.tenants().await? {
            for debt in self.debts.mark_overdue(tenant, today).await? {
                report.overdue_debts += 1;
                let message = overdue_message(&debt);
                self.notify(&mut report, message).await;
            }
        }

        report.recurring_charges = self.transactions.process_due(today).await?.len();

        for tenant in self.loans.tenants().await? {
            for loan in self.loans.upcoming(tenant, today, LOAN_REMINDER_DAYS).await? {
                report.loan_reminders += 1;
                let message = loan_reminder(&loan);
                self.notify(&mut report, message).await;
            }
        }

        info!(
            %today,
            overdue = report.overdue_debts,
            charges = report.recurring_charges,
            reminders = report.loan_reminders,
            failed = report.failed_notifications,
            "daily jobs finished"
        );
        Ok(report)
    }
}
