use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Store-assigned row identifier. Zero means "not yet stored".
pub type EntityId = u64;

/// The organisation owning a row. Every service call is scoped to one tenant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TenantId(pub u64);

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persisted row.
///
/// Stores rely on `KIND` to name their table (or column family), and services
/// rely on `tenant` to hide rows of other organisations.
pub trait Entity: Clone + Send + Sync + Serialize + DeserializeOwned + 'static {
    const KIND: &'static str;

    fn id(&self) -> EntityId;
    fn set_id(&mut self, id: EntityId);
    fn tenant(&self) -> TenantId;

    /// Marks the row deleted instead of removing it.
    ///
    /// Returns `false` for entities that are hard-deleted.
    fn soft_delete(&mut self, _at: DateTime<Utc>) -> bool {
        false
    }

    fn is_deleted(&self) -> bool {
        false
    }
}

/// Implements [`Entity`] for a struct with `id`, `tenant` and, optionally,
/// `deleted_at` fields.
#[macro_export]
macro_rules! impl_entity {
    ($ty:ty, $kind:literal) => {
        impl $crate::domain::entity::Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> $crate::domain::entity::EntityId {
                self.id
            }

            fn set_id(&mut self, id: $crate::domain::entity::EntityId) {
                self.id = id;
            }

            fn tenant(&self) -> $crate::domain::entity::TenantId {
                self.tenant
            }
        }
    };
    ($ty:ty, $kind:literal, soft_delete) => {
        impl $crate::domain::entity::Entity for $ty {
            const KIND: &'static str = $kind;

            fn id(&self) -> $crate::domain::entity::EntityId {
                self.id
            }

            fn set_id(&mut self, id: $crate::domain::entity::EntityId) {
                self.id = id;
            }

            fn tenant(&self) -> $crate::domain::entity::TenantId {
                self.tenant
            }

            fn soft_delete(&mut self, at: chrono::DateTime<chrono::Utc>) -> bool {
                self.deleted_at = Some(at);
                true
            }

            fn is_deleted(&self) -> bool {
                self.deleted_at.is_some()
            }
        }
    };
}
