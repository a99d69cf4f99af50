//! Domain layer: entities, value objects and the ports the application
//! talks to. Nothing here performs I/O.

pub mod account;
pub mod commission;
pub mod currency;
pub mod debt;
pub mod entity;
pub mod loan;
pub mod money;
pub mod party;
pub mod ports;
pub mod project;
pub mod transaction;
pub mod user;
