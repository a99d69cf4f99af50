//! Data transfer objects.
//!
//! A DTO is an immutable snapshot of an entity's writable fields. Every DTO
//! converts from a stored model, from a loose field map, from a JSON request
//! body, and back into a field map.

pub mod account;
pub mod crm;
pub mod ledger;
pub mod project;
pub mod user;

use crate::domain::entity::{Entity, TenantId};
use crate::error::{LedgerError, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

pub use account::AccountData;
pub use crm::{CustomerData, LeadData, SupplierData};
pub use ledger::{CommissionData, DebtData, LoanData, TransactionData};
pub use project::{BoardData, ProjectData, TaskData, TaskListData};
pub use user::{RoleData, SettingData, UserData};

pub trait DataObject: Serialize + DeserializeOwned + Sized {
    type Model: Entity;

    fn from_model(model: &Self::Model) -> Self;

    fn from_array(fields: &Map<String, Value>) -> Result<Self> {
        Ok(serde_json::from_value(Value::Object(fields.clone()))?)
    }

    fn from_request(body: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(body)?)
    }

    fn to_array(&self) -> Result<Map<String, Value>> {
        match serde_json::to_value(self)? {
            Value::Object(fields) => Ok(fields),
            _ => Err(LedgerError::validation("DTO did not serialize to a field map")),
        }
    }
}

/// A DTO that can create and update its model on its own.
pub trait Writable: DataObject {
    fn validate(&self) -> Result<()> {
        Ok(())
    }

    /// Builds a new, unsaved row owned by `tenant`.
    fn to_model(&self, tenant: TenantId) -> Result<Self::Model>;

    /// Copies the writable fields onto an existing row.
    fn apply_to(&self, model: &mut Self::Model) -> Result<()>;
}

pub(crate) fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        Err(LedgerError::validation(format!("The {field} field is required")))
    } else {
        Ok(())
    }
}

pub(crate) fn normalize_optional(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}
