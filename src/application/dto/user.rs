use super::{DataObject, Writable, require};
use crate::domain::commission::validate_rate;
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::user::{Role, Setting, User};
use crate::error::{LedgerError, Result};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

fn default_active() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoleData {
    pub name: String,
    #[serde(default)]
    pub permissions: BTreeSet<String>,
}

impl DataObject for RoleData {
    type Model = Role;

    fn from_model(model: &Role) -> Self {
        Self {
            name: model.name.clone(),
            permissions: model.permissions.clone(),
        }
    }
}

impl Writable for RoleData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        if self.permissions.iter().any(|p| p.trim().is_empty()) {
            return Err(LedgerError::validation("Permissions cannot be blank"));
        }
        Ok(())
    }

    fn to_model(&self, tenant: TenantId) -> Result<Role> {
        Ok(Role {
            id: 0,
            tenant,
            name: self.name.trim().to_string(),
            permissions: self.permissions.clone(),
        })
    }

    fn apply_to(&self, model: &mut Role) -> Result<()> {
        model.name = self.name.trim().to_string();
        model.permissions = self.permissions.clone();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserData {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role_ids: BTreeSet<EntityId>,
    #[serde(default)]
    pub commission_rate: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl DataObject for UserData {
    type Model = User;

    fn from_model(model: &User) -> Self {
        Self {
            name: model.name.clone(),
            email: model.email.clone(),
            role_ids: model.role_ids.clone(),
            commission_rate: model.commission_rate,
            is_active: model.is_active,
        }
    }
}

impl Writable for UserData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        if !self.email.contains('@') {
            return Err(LedgerError::validation(format!(
                "Invalid e-mail address: {}",
                self.email
            )));
        }
        validate_rate(self.commission_rate)
    }

    fn to_model(&self, tenant: TenantId) -> Result<User> {
        Ok(User {
            id: 0,
            tenant,
            name: self.name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            role_ids: self.role_ids.clone(),
            commission_rate: self.commission_rate,
            is_active: self.is_active,
        })
    }

    fn apply_to(&self, model: &mut User) -> Result<()> {
        model.name = self.name.trim().to_string();
        model.email = self.email.trim().to_lowercase();
        model.role_ids = self.role_ids.clone();
        model.commission_rate = self.commission_rate;
        model.is_active = self.is_active;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettingData {
    pub key: String,
    pub value: String,
}

impl DataObject for SettingData {
    type Model = Setting;

    fn from_model(model: &Setting) -> Self {
        Self {
            key: model.key.clone(),
            value: model.value.clone(),
        }
    }
}

impl Writable for SettingData {
    fn validate(&self) -> Result<()> {
        require("key", &self.key)
    }

    fn to_model(&self, tenant: TenantId) -> Result<Setting> {
        Ok(Setting {
            id: 0,
            tenant,
            key: self.key.trim().to_string(),
            value: self.value.clone(),
        })
    }

    fn apply_to(&self, model: &mut Setting) -> Result<()> {
        model.key = self.key.trim().to_string();
        model.value = self.value.clone();
        Ok(())
    }
}
