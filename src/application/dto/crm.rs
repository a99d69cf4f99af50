use super::{DataObject, Writable, normalize_optional, require};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::party::{Customer, CustomerType, Lead, LeadStatus, Supplier};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};

fn default_active() -> bool {
    true
}

fn validate_email(email: &Option<String>) -> Result<()> {
    match normalize_optional(email) {
        Some(email) if !email.contains('@') || email.starts_with('@') || email.ends_with('@') => {
            Err(LedgerError::validation(format!("Invalid e-mail address: {email}")))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerData {
    pub name: String,
    #[serde(default)]
    pub customer_type: CustomerType,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl DataObject for CustomerData {
    type Model = Customer;

    fn from_model(model: &Customer) -> Self {
        Self {
            name: model.name.clone(),
            customer_type: model.customer_type,
            email: model.email.clone(),
            phone: model.phone.clone(),
            tax_number: model.tax_number.clone(),
            address: model.address.clone(),
            notes: model.notes.clone(),
            is_active: model.is_active,
        }
    }
}

impl Writable for CustomerData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        validate_email(&self.email)
    }

    fn to_model(&self, tenant: TenantId) -> Result<Customer> {
        let mut customer = Customer {
            id: 0,
            tenant,
            name: String::new(),
            customer_type: CustomerType::default(),
            email: None,
            phone: None,
            tax_number: None,
            address: None,
            notes: None,
            is_active: true,
            deleted_at: None,
        };
        self.apply_to(&mut customer)?;
        Ok(customer)
    }

    fn apply_to(&self, model: &mut Customer) -> Result<()> {
        model.name = self.name.trim().to_string();
        model.customer_type = self.customer_type;
        model.email = normalize_optional(&self.email);
        model.phone = normalize_optional(&self.phone);
        model.tax_number = normalize_optional(&self.tax_number);
        model.address = normalize_optional(&self.address);
        model.notes = normalize_optional(&self.notes);
        model.is_active = self.is_active;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeadData {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub status: LeadStatus,
    #[serde(default)]
    pub assigned_user_id: Option<EntityId>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl DataObject for LeadData {
    type Model = Lead;

    fn from_model(model: &Lead) -> Self {
        Self {
            name: model.name.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            company: model.company.clone(),
            source: model.source.clone(),
            status: model.status,
            assigned_user_id: model.assigned_user_id,
            notes: model.notes.clone(),
        }
    }
}

impl Writable for LeadData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        validate_email(&self.email)?;
        if self.status == LeadStatus::Converted {
            return Err(LedgerError::validation(
                "Leads are marked converted by converting them",
            ));
        }
        Ok(())
    }

    fn to_model(&self, tenant: TenantId) -> Result<Lead> {
        let mut lead = Lead {
            id: 0,
            tenant,
            name: String::new(),
            email: None,
            phone: None,
            company: None,
            source: None,
            status: LeadStatus::New,
            assigned_user_id: None,
            notes: None,
            converted_customer_id: None,
            deleted_at: None,
        };
        self.apply_to(&mut lead)?;
        Ok(lead)
    }

    fn apply_to(&self, model: &mut Lead) -> Result<()> {
        if model.status == LeadStatus::Converted {
            return Err(LedgerError::validation("A converted lead cannot be edited"));
        }
        model.name = self.name.trim().to_string();
        model.email = normalize_optional(&self.email);
        model.phone = normalize_optional(&self.phone);
        model.company = normalize_optional(&self.company);
        model.source = normalize_optional(&self.source);
        model.status = self.status;
        model.assigned_user_id = self.assigned_user_id;
        model.notes = normalize_optional(&self.notes);
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierData {
    pub name: String,
    #[serde(default)]
    pub contact_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub tax_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

impl DataObject for SupplierData {
    type Model = Supplier;

    fn from_model(model: &Supplier) -> Self {
        Self {
            name: model.name.clone(),
            contact_name: model.contact_name.clone(),
            email: model.email.clone(),
            phone: model.phone.clone(),
            tax_number: model.tax_number.clone(),
            notes: model.notes.clone(),
            is_active: model.is_active,
        }
    }
}

impl Writable for SupplierData {
    fn validate(&self) -> Result<()> {
        require("name", &self.name)?;
        validate_email(&self.email)
    }

    fn to_model(&self, tenant: TenantId) -> Result<Supplier> {
        let mut supplier = Supplier {
            id: 0,
            tenant,
            name: String::new(),
            contact_name: None,
            email: None,
            phone: None,
            tax_number: None,
            notes: None,
            is_active: true,
            deleted_at: None,
        };
        self.apply_to(&mut supplier)?;
        Ok(supplier)
    }

    fn apply_to(&self, model: &mut Supplier) -> Result<()> {
        model.name = self.name.trim().to_string();
        model.contact_name = normalize_optional(&self.contact_name);
        model.email = normalize_optional(&self.email);
        model.phone = normalize_optional(&self.phone);
        model.tax_number = normalize_optional(&self.tax_number);
        model.notes = normalize_optional(&self.notes);
        model.is_active = self.is_active;
        Ok(())
    }
}
