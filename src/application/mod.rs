//! Application layer: the services that orchestrate the domain.
//!
//! Every balance change funnels through [`payment_service::PaymentService`],
//! which serialises mutations behind one ledger lock. The remaining services
//! validate input through their DTOs and delegate storage to the
//! [`EntityStore`](crate::domain::ports::EntityStore) ports.

pub mod account_service;
pub mod backoffice;
pub mod commission_service;
pub mod credit_card;
pub mod crud;
pub mod currency_service;
pub mod customer_service;
pub mod debt_service;
pub mod dto;
pub mod import;
pub mod loan_service;
pub mod payment_service;
pub mod project_service;
pub mod scheduler;
pub mod transaction_service;
pub mod user_service;

#[cfg(test)]
mod test_support;
