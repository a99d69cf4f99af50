use crate::application::dto::Writable;
use crate::domain::entity::{Entity, EntityId, TenantId};
use crate::domain::ports::SharedStore;
use crate::error::{LedgerError, Result};
use chrono::Utc;
use std::marker::PhantomData;
use tracing::{debug, info};

/// Create, read, update and delete for one entity, scoped by tenant.
///
/// Rows belonging to another tenant, and soft-deleted rows, behave exactly as
/// if they did not exist.
pub struct CrudService<D: Writable> {
    store: SharedStore<D::Model>,
    _dto: PhantomData<fn() -> D>,
}

impl<D: Writable> Clone for CrudService<D> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            _dto: PhantomData,
        }
    }
}

impl<D: Writable> CrudService<D> {
    pub fn new(store: SharedStore<D::Model>) -> Self {
        Self {
            store,
            _dto: PhantomData,
        }
    }

    pub fn store(&self) -> &SharedStore<D::Model> {
        &self.store
    }

    pub async fn create(&self, tenant: TenantId, data: &D) -> Result<D::Model> {
        data.validate()?;
        let model = self.store.insert(data.to_model(tenant)?).await?;
        info!(kind = D::Model::KIND, id = model.id(), %tenant, "created");
        Ok(model)
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<D::Model> {
        match self.store.get(id).await? {
            Some(model) if model.tenant() == tenant && !model.is_deleted() => Ok(model),
            _ => Err(LedgerError::not_found(D::Model::KIND, id)),
        }
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<D::Model>> {
        let mut rows: Vec<D::Model> = self
            .store
            .get_all()
            .await?
            .into_iter()
            .filter(|model| model.tenant() == tenant && !model.is_deleted())
            .collect();
        rows.sort_by_key(|model| model.id());
        Ok(rows)
    }

    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &D) -> Result<D::Model> {
        data.validate()?;
        let mut model = self.find(tenant, id).await?;
        data.apply_to(&mut model)?;
        self.store.update(model.clone()).await?;
        info!(kind = D::Model::KIND, id, %tenant, "updated");
        Ok(model)
    }

    /// Soft-deletes entities that support it, removes the rest.
    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        let mut model = self.find(tenant, id).await?;
        if model.soft_delete(Utc::now()) {
            self.store.update(model).await?;
            info!(kind = D::Model::KIND, id, %tenant, "soft-deleted");
        } else {
            self.store.remove(id).await?;
            info!(kind = D::Model::KIND, id, %tenant, "deleted");
        }
        Ok(())
    }

    /// Persists a row the calling service has already changed.
    pub async fn save(&self, model: &D::Model) -> Result<()> {
        debug!(kind = D::Model::KIND, id = model.id(), "saving");
        self.store.update(model.clone()).await
    }

    /// Inserts a row built by the calling service rather than from a DTO.
    pub async fn insert(&self, model: D::Model) -> Result<D::Model> {
        let model = self.store.insert(model).await?;
        debug!(kind = D::Model::KIND, id = model.id(), "inserted");
        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::dto::CustomerData;
    use crate::domain::party::{Customer, CustomerType};
    use crate::infrastructure::in_memory::InMemoryStore;

    fn service() -> CrudService<CustomerData> {
        CrudService::new(InMemoryStore::<Customer>::shared())
    }

    fn data(name: &str) -> CustomerData {
        CustomerData {
            name: name.into(),
            customer_type: CustomerType::Individual,
            email: None,
            phone: None,
            tax_number: None,
            address: None,
            notes: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_rows_of_other_tenants_are_not_found() {
        let service = service();
        let customer = service.create(TenantId(1), &data("Ali")).await.unwrap();

        let err = service.find(TenantId(2), customer.id).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { kind: "customers", .. }));
        assert!(service.list(TenantId(2)).await.unwrap().is_empty());
        assert!(service.update(TenantId(2), customer.id, &data("Veli")).await.is_err());
        assert!(service.delete(TenantId(2), customer.id).await.is_err());
        assert_eq!(service.find(TenantId(1), customer.id).await.unwrap().name, "Ali");
    }

    #[tokio::test]
    async fn test_soft_deleted_rows_are_hidden_but_kept() {
        let service = service();
        let customer = service.create(TenantId(1), &data("Ali")).await.unwrap();
        service.create(TenantId(1), &data("Ayşe")).await.unwrap();

        service.delete(TenantId(1), customer.id).await.unwrap();

        assert!(service.find(TenantId(1), customer.id).await.is_err());
        assert_eq!(service.list(TenantId(1)).await.unwrap().len(), 1);
        let raw = service.store().get(customer.id).await.unwrap().unwrap();
        assert!(raw.deleted_at.is_some());
    }

    #[tokio::test]
    async fn test_invalid_data_is_rejected_before_storing() {
        let service = service();
        assert!(service.create(TenantId(1), &data("  ")).await.is_err());
        assert!(service.store().get_all().await.unwrap().is_empty());
    }
}
