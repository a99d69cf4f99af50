//! Users, roles and per-tenant settings.

use crate::domain::entity::{EntityId, TenantId};
use crate::impl_entity;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Permission that grants every other permission.
pub const WILDCARD_PERMISSION: &str = "*";

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Role {
    pub id: EntityId,
    pub tenant: TenantId,
    pub name: String,
    pub permissions: BTreeSet<String>,
}

impl_entity!(Role, "roles");

impl Role {
    pub fn allows(&self, permission: &str) -> bool {
        self.permissions.contains(WILDCARD_PERMISSION) || self.permissions.contains(permission)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct User {
    pub id: EntityId,
    pub tenant: TenantId,
    pub name: String,
    pub email: String,
    pub role_ids: BTreeSet<EntityId>,
    /// Percentage of each sale paid as commission.
    pub commission_rate: Decimal,
    pub is_active: bool,
}

impl_entity!(User, "users");

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Setting {
    pub id: EntityId,
    pub tenant: TenantId,
    pub key: String,
    pub value: String,
}

impl_entity!(Setting, "settings");
