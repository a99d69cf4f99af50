//! Adapters for the domain ports: storage, the rate feed and notifications.

pub mod in_memory;
#[cfg(feature = "storage-rocksdb")]
pub mod rocksdb;
pub mod static_rates;
pub mod tcmb;
pub mod telegram;
