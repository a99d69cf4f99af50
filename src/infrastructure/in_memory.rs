use crate::domain::entity::{Entity, EntityId};
use crate::domain::ports::{EntityStore, SharedStore};
use crate::error::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

struct Table<E> {
    rows: BTreeMap<EntityId, E>,
    last_id: EntityId,
}

/// A thread-safe in-memory store for one entity kind.
///
/// Rows are kept ordered by id, so `get_all` returns them in insertion order.
/// Cloning shares the underlying table.
#[derive(Clone)]
pub struct InMemoryStore<E> {
    table: Arc<RwLock<Table<E>>>,
}

impl<E> Default for InMemoryStore<E> {
    fn default() -> Self {
        Self {
            table: Arc::new(RwLock::new(Table {
                rows: BTreeMap::new(),
                last_id: 0,
            })),
        }
    }
}

impl<E> InMemoryStore<E> {
    /// Creates a new, empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<E: Entity> InMemoryStore<E> {
    /// A new, empty store behind the shared port type.
    pub fn shared() -> SharedStore<E> {
        Arc::new(Self::new())
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for InMemoryStore<E> {
    async fn insert(&self, mut entity: E) -> Result<E> {
        let mut table = self.table.write().await;
        table.last_id += 1;
        entity.set_id(table.last_id);
        table.rows.insert(entity.id(), entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<()> {
        let mut table = self.table.write().await;
        table.last_id = table.last_id.max(entity.id());
        table.rows.insert(entity.id(), entity);
        Ok(())
    }

    async fn get(&self, id: EntityId) -> Result<Option<E>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).cloned())
    }

    async fn remove(&self, id: EntityId) -> Result<bool> {
        let mut table = self.table.write().await;
        Ok(table.rows.remove(&id).is_some())
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        let table = self.table.read().await;
        Ok(table.rows.values().cloned().collect())
    }
}
