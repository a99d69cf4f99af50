use super::currency::RateTable;
use super::entity::{Entity, EntityId};
use crate::error::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::sync::Arc;

/// Persistence for one kind of entity.
#[async_trait]
pub trait EntityStore<E: Entity>: Send + Sync {
    /// Stores a new row, assigning it the next free id.
    async fn insert(&self, entity: E) -> Result<E>;
    /// Overwrites an existing row.
    async fn update(&self, entity: E) -> Result<()>;
    async fn get(&self, id: EntityId) -> Result<Option<E>>;
    /// Removes a row, returning whether it existed.
    async fn remove(&self, id: EntityId) -> Result<bool>;
    async fn get_all(&self) -> Result<Vec<E>>;
}

pub type EntityStoreBox<E> = Box<dyn EntityStore<E>>;
pub type SharedStore<E> = Arc<dyn EntityStore<E>>;
pub type EntityStoreFactory<E> = Box<dyn Fn() -> EntityStoreBox<E> + Send + Sync>;

/// Source of central-bank rate bulletins.
#[async_trait]
pub trait RateFeed: Send + Sync {
    /// Fetches the bulletin published on `date`.
    ///
    /// Fails when the bulletin does not exist (holiday) or cannot be fetched.
    async fn fetch(&self, date: NaiveDate) -> Result<RateTable>;
}

/// Outbound channel for operator notifications.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, message: &str) -> Result<()>;
}
