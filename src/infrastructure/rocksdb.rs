use crate::domain::entity::{Entity, EntityId};
use crate::domain::ports::EntityStore;
use crate::error::{LedgerError, Result};
use async_trait::async_trait;
use rocksdb::{ColumnFamilyDescriptor, DB, IteratorMode, Options};
use std::marker::PhantomData;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Column Family holding the last assigned id of every entity kind.
pub const CF_SEQUENCES: &str = "sequences";

fn internal(message: impl Into<String>) -> LedgerError {
    LedgerError::InternalError(Box::new(std::io::Error::other(message.into())))
}

/// A persistent database shared by every entity store.
///
/// Each entity kind lives in its own Column Family named after
/// [`Entity::KIND`]; keys are big-endian ids so iteration follows id order.
/// Cloning shares the underlying `Arc<DB>`.
#[derive(Clone)]
pub struct RocksDatabase {
    db: Arc<DB>,
    sequence_lock: Arc<Mutex<()>>,
}

impl RocksDatabase {
    /// Opens or creates a RocksDB instance at `path` with a Column Family per
    /// entry in `kinds`.
    pub fn open<P: AsRef<Path>>(path: P, kinds: &[&str]) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let descriptors = kinds
            .iter()
            .chain(std::iter::once(&CF_SEQUENCES))
            .map(|kind| ColumnFamilyDescriptor::new(*kind, Options::default()))
            .collect::<Vec<_>>();

        let db = DB::open_cf_descriptors(&opts, path, descriptors)?;

        Ok(Self {
            db: Arc::new(db),
            sequence_lock: Arc::new(Mutex::new(())),
        })
    }

    /// A typed store over this database.
    pub fn store<E: Entity>(&self) -> RocksDBStore<E> {
        RocksDBStore {
            database: self.clone(),
            _entity: PhantomData,
        }
    }

    fn next_id(&self, kind: &str) -> Result<EntityId> {
        let _guard = self
            .sequence_lock
            .lock()
            .map_err(|_| internal("Sequence lock poisoned"))?;
        let cf = self
            .db
            .cf_handle(CF_SEQUENCES)
            .ok_or_else(|| internal("Sequences column family not found"))?;

        let current = match self.db.get_cf(&cf, kind.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes
                    .as_slice()
                    .try_into()
                    .map_err(|_| internal(format!("Corrupt sequence for {kind}")))?;
                u64::from_be_bytes(raw)
            }
            None => 0,
        };
        let next = current + 1;
        self.db.put_cf(&cf, kind.as_bytes(), next.to_be_bytes())?;
        Ok(next)
    }
}

/// [`EntityStore`] adapter for one entity kind in a [`RocksDatabase`].
pub struct RocksDBStore<E> {
    database: RocksDatabase,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for RocksDBStore<E> {
    fn clone(&self) -> Self {
        Self {
            database: self.database.clone(),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> RocksDBStore<E> {
    fn put(&self, entity: &E) -> Result<()> {
        let db = &self.database.db;
        let cf = db
            .cf_handle(E::KIND)
            .ok_or_else(|| internal(format!("{} column family not found", E::KIND)))?;
        let value = serde_json::to_vec(entity)?;
        db.put_cf(&cf, entity.id().to_be_bytes(), value)?;
        Ok(())
    }
}

#[async_trait]
impl<E: Entity> EntityStore<E> for RocksDBStore<E> {
    async fn insert(&self, mut entity: E) -> Result<E> {
        entity.set_id(self.database.next_id(E::KIND)?);
        self.put(&entity)?;
        Ok(entity)
    }

    async fn update(&self, entity: E) -> Result<()> {
        self.put(&entity)
    }

    async fn get(&self, id: EntityId) -> Result<Option<E>> {
        let db = &self.database.db;
        let cf = db
            .cf_handle(E::KIND)
            .ok_or_else(|| internal(format!("{} column family not found", E::KIND)))?;

        match db.get_cf(&cf, id.to_be_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    async fn remove(&self, id: EntityId) -> Result<bool> {
        let db = &self.database.db;
        let cf = db
            .cf_handle(E::KIND)
            .ok_or_else(|| internal(format!("{} column family not found", E::KIND)))?;

        let key = id.to_be_bytes();
        let existed = db.get_pinned_cf(&cf, key)?.is_some();
        if existed {
            db.delete_cf(&cf, key)?;
        }
        Ok(existed)
    }

    async fn get_all(&self) -> Result<Vec<E>> {
        let db = &self.database.db;
        let cf = db
            .cf_handle(E::KIND)
            .ok_or_else(|| internal(format!("{} column family not found", E::KIND)))?;

        let mut rows = Vec::new();
        for item in db.iterator_cf(&cf, IteratorMode::Start) {
            let (_key, value) = item?;
            rows.push(serde_json::from_slice(&value)?);
        }
        Ok(rows)
    }
}
