use crate::application::crud::CrudService;
use crate::application::dto::{CustomerData, LeadData, SupplierData};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::party::{Customer, Lead, LeadStatus};
use crate::error::{LedgerError, Result};
use tracing::info;

pub type CustomerService = CrudService<CustomerData>;
pub type SupplierService = CrudService<SupplierData>;

/// Leads, and their conversion into customers.
pub struct LeadService {
    leads: CrudService<LeadData>,
    customers: CustomerService,
}

impl LeadService {
    pub fn new(leads: CrudService<LeadData>, customers: CustomerService) -> Self {
        Self { leads, customers }
    }

    pub async fn create(&self, tenant: TenantId, data: &LeadData) -> Result<Lead> {
        self.leads.create(tenant, data).await
    }

    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &LeadData) -> Result<Lead> {
        self.leads.update(tenant, id, data).await
    }

    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        self.leads.delete(tenant, id).await
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<Lead> {
        self.leads.find(tenant, id).await
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<Lead>> {
        self.leads.list(tenant).await
    }

    /// Creates a customer from the lead and marks the lead converted.
    pub async fn convert(&self, tenant: TenantId, id: EntityId) -> Result<(Lead, Customer)> {
        let mut lead = self.leads.find(tenant, id).await?;
        if lead.status == LeadStatus::Converted {
            return Err(LedgerError::validation(format!(
                "Lead {} was already converted",
                lead.name
            )));
        }
        let customer = self.customers.insert(lead.to_customer()).await?;
        lead.status = LeadStatus::Converted;
        lead.converted_customer_id = Some(customer.id);
        self.leads.save(&lead).await?;
        info!(lead = lead.id, customer = customer.id, %tenant, "lead converted");
        Ok((lead, customer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::party::CustomerType;
    use crate::infrastructure::in_memory::InMemoryStore;

    fn service() -> LeadService {
        LeadService::new(
            CrudService::new(InMemoryStore::shared()),
            CrudService::new(InMemoryStore::shared()),
        )
    }

    fn lead_data(company: Option<&str>) -> LeadData {
        LeadData {
            name: "Can Demir".into(),
            email: Some("can@demir.test".into()),
            phone: None,
            company: company.map(String::from),
            source: Some("referral".into()),
            status: LeadStatus::Negotiating,
            assigned_user_id: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_convert_creates_customer_once() {
        let service = service();
        let lead = service.create(TenantId(1), &lead_data(Some("Demir Ltd"))).await.unwrap();

        let (converted, customer) = service.convert(TenantId(1), lead.id).await.unwrap();
        assert_eq!(converted.status, LeadStatus::Converted);
        assert_eq!(converted.converted_customer_id, Some(customer.id));
        assert_eq!(customer.name, "Demir Ltd");
        assert_eq!(customer.customer_type, CustomerType::Corporate);
        assert_eq!(customer.email.as_deref(), Some("can@demir.test"));

        assert!(service.convert(TenantId(1), lead.id).await.is_err());
        assert!(service.update(TenantId(1), lead.id, &lead_data(None)).await.is_err());
    }

    #[tokio::test]
    async fn test_convert_is_tenant_scoped() {
        let service = service();
        let lead = service.create(TenantId(1), &lead_data(None)).await.unwrap();
        assert!(service.convert(TenantId(2), lead.id).await.is_err());
        assert_eq!(service.find(TenantId(1), lead.id).await.unwrap().status, LeadStatus::Negotiating);
    }
}
