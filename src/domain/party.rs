//! Customers, leads and suppliers.

use crate::domain::entity::{EntityId, TenantId};
use crate::impl_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum CustomerType {
    #[default]
    Individual,
    Corporate,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Customer {
    pub id: EntityId,
    pub tenant: TenantId,
    pub name: String,
    pub customer_type: CustomerType,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_number: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_entity!(Customer, "customers", soft_delete);

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Default)]
#[serde(rename_all = "snake_case")]
pub enum LeadStatus {
    #[default]
    New,
    Contacted,
    Negotiating,
    Won,
    Lost,
    Converted,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Lead {
    pub id: EntityId,
    pub tenant: TenantId,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub status: LeadStatus,
    pub assigned_user_id: Option<EntityId>,
    pub notes: Option<String>,
    pub converted_customer_id: Option<EntityId>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_entity!(Lead, "leads", soft_delete);

impl Lead {
    /// Builds the customer a lead turns into.
    pub fn to_customer(&self) -> Customer {
        Customer {
            id: 0,
            tenant: self.tenant,
            name: self.company.clone().unwrap_or_else(|| self.name.clone()),
            customer_type: if self.company.is_some() {
                CustomerType::Corporate
            } else {
                CustomerType::Individual
            },
            email: self.email.clone(),
            phone: self.phone.clone(),
            tax_number: None,
            address: None,
            notes: self.notes.clone(),
            is_active: true,
            deleted_at: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Supplier {
    pub id: EntityId,
    pub tenant: TenantId,
    pub name: String,
    pub contact_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub tax_number: Option<String>,
    pub notes: Option<String>,
    pub is_active: bool,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl_entity!(Supplier, "suppliers", soft_delete);
