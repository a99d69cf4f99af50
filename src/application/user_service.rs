use crate::application::crud::CrudService;
use crate::application::dto::{RoleData, SettingData, UserData};
use crate::domain::entity::{EntityId, TenantId};
use crate::domain::user::{Role, Setting, User};
use crate::error::{LedgerError, Result};
use tracing::info;

pub struct RoleService {
    roles: CrudService<RoleData>,
}

impl RoleService {
    pub fn new(roles: CrudService<RoleData>) -> Self {
        Self { roles }
    }

    async fn ensure_unique(&self, tenant: TenantId, name: &str, except: Option<EntityId>) -> Result<()> {
        let name = name.trim();
        let taken = self
            .roles
            .list(tenant)
            .await?
            .iter()
            .any(|role| Some(role.id) != except && role.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(LedgerError::validation(format!("Role {name} already exists")));
        }
        Ok(())
    }

    pub async fn create(&self, tenant: TenantId, data: &RoleData) -> Result<Role> {
        self.ensure_unique(tenant, &data.name, None).await?;
        self.roles.create(tenant, data).await
    }

    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &RoleData) -> Result<Role> {
        self.ensure_unique(tenant, &data.name, Some(id)).await?;
        self.roles.update(tenant, id, data).await
    }

    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        self.roles.delete(tenant, id).await
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<Role> {
        self.roles.find(tenant, id).await
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<Role>> {
        self.roles.list(tenant).await
    }
}

pub struct UserService {
    users: CrudService<UserData>,
    roles: CrudService<RoleData>,
}

impl UserService {
    pub fn new(users: CrudService<UserData>, roles: CrudService<RoleData>) -> Self {
        Self { users, roles }
    }

    async fn ensure_unique(&self, tenant: TenantId, email: &str, except: Option<EntityId>) -> Result<()> {
        let email = email.trim().to_lowercase();
        let taken = self
            .users
            .list(tenant)
            .await?
            .iter()
            .any(|user| Some(user.id) != except && user.email == email);
        if taken {
            return Err(LedgerError::validation(format!("E-mail {email} is already in use")));
        }
        Ok(())
    }

    async fn ensure_roles_exist(&self, tenant: TenantId, data: &UserData) -> Result<()> {
        for role_id in &data.role_ids {
            self.roles.find(tenant, *role_id).await?;
        }
        Ok(())
    }

    pub async fn create(&self, tenant: TenantId, data: &UserData) -> Result<User> {
        self.ensure_unique(tenant, &data.email, None).await?;
        self.ensure_roles_exist(tenant, data).await?;
        self.users.create(tenant, data).await
    }

    pub async fn update(&self, tenant: TenantId, id: EntityId, data: &UserData) -> Result<User> {
        self.ensure_unique(tenant, &data.email, Some(id)).await?;
        self.ensure_roles_exist(tenant, data).await?;
        self.users.update(tenant, id, data).await
    }

    pub async fn delete(&self, tenant: TenantId, id: EntityId) -> Result<()> {
        self.users.delete(tenant, id).await
    }

    pub async fn find(&self, tenant: TenantId, id: EntityId) -> Result<User> {
        self.users.find(tenant, id).await
    }

    pub async fn list(&self, tenant: TenantId) -> Result<Vec<User>> {
        self.users.list(tenant).await
    }

    pub async fn assign_role(&self, tenant: TenantId, user_id: EntityId, role_id: EntityId) -> Result<User> {
        let role = self.roles.find(tenant, role_id).await?;
        let mut user = self.users.find(tenant, user_id).await?;
        if user.role_ids.insert(role.id) {
            self.users.save(&user).await?;
            info!(user = user.id, role = %role.name, "role assigned");
        }
        Ok(user)
    }

    pub async fn revoke_role(&self, tenant: TenantId, user_id: EntityId, role_id: EntityId) -> Result<User> {
        let mut user = self.users.find(tenant, user_id).await?;
        if user.role_ids.remove(&role_id) {
            self.users.save(&user).await?;
        }
        Ok(user)
    }

    /// Whether any role of an active user grants `permission`. Roles deleted
    /// since they were assigned grant nothing.
    pub async fn has_permission(&self, tenant: TenantId, user_id: EntityId, permission: &str) -> Result<bool> {
        let user = self.users.find(tenant, user_id).await?;
        if !user.is_active {
            return Ok(false);
        }
        for role_id in &user.role_ids {
            match self.roles.find(tenant, *role_id).await {
                Ok(role) if role.allows(permission) => return Ok(true),
                Ok(_) | Err(LedgerError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(false)
    }
}

/// Per-tenant key/value settings.
pub struct SettingService {
    settings: CrudService<SettingData>,
}

impl SettingService {
    pub fn new(settings: CrudService<SettingData>) -> Self {
        Self { settings }
    }

    async fn row(&self, tenant: TenantId, key: &str) -> Result<Option<Setting>> {
        Ok(self
            .settings
            .list(tenant)
            .await?
            .into_iter()
            .find(|setting| setting.key == key.trim()))
    }

    pub async fn get(&self, tenant: TenantId, key: &str) -> Result<Option<String>> {
        Ok(self.row(tenant, key).await?.map(|setting| setting.value))
    }

    pub async fn get_or(&self, tenant: TenantId, key: &str, default: &str) -> Result<String> {
        Ok(self.get(tenant, key).await?.unwrap_or_else(|| default.to_string()))
    }

    /// Creates or overwrites a setting.
    pub async fn set(&self, tenant: TenantId, key: &str, value: &str) -> Result<Setting> {
        let data = SettingData {
            key: key.to_string(),
            value: value.to_string(),
        };
        match self.row(tenant, key).await? {
            Some(existing) => self.settings.update(tenant, existing.id, &data).await,
            None => self.settings.create(tenant, &data).await,
        }
    }

    pub async fn delete(&self, tenant: TenantId, key: &str) -> Result<bool> {
        match self.row(tenant, key).await? {
            Some(existing) => {
                self.settings.delete(tenant, existing.id).await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub async fn all(&self, tenant: TenantId) -> Result<Vec<Setting>> {
        self.settings.list(tenant).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::in_memory::InMemoryStore;
    use rust_decimal_macros::dec;
    use std::collections::BTreeSet;

    const TENANT: TenantId = TenantId(1);

    fn services() -> (RoleService, UserService) {
        let roles: CrudService<RoleData> = CrudService::new(InMemoryStore::shared());
        let users = CrudService::new(InMemoryStore::shared());
        (RoleService::new(roles.clone()), UserService::new(users, roles))
    }

    fn role(name: &str, permissions: &[&str]) -> RoleData {
        RoleData {
            name: name.into(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    fn user(email: &str) -> UserData {
        UserData {
            name: "Elif".into(),
            email: email.into(),
            role_ids: BTreeSet::new(),
            commission_rate: dec!(2.5),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_role_names_are_unique_per_tenant() {
        let (roles, _) = services();
        roles.create(TENANT, &role("Sales", &[])).await.unwrap();
        assert!(roles.create(TENANT, &role("sales", &[])).await.is_err());
        assert!(roles.create(TenantId(2), &role("Sales", &[])).await.is_ok());
    }

    #[tokio::test]
    async fn test_emails_are_unique_and_normalised() {
        let (_, users) = services();
        let elif = users.create(TENANT, &user("Elif@Example.com ")).await.unwrap();
        assert_eq!(elif.email, "elif@example.com");
        assert!(users.create(TENANT, &user("elif@example.com")).await.is_err());
        assert!(users.update(TENANT, elif.id, &user("elif@example.com")).await.is_ok());
    }

    #[tokio::test]
    async fn test_permissions_follow_assigned_roles() {
        let (roles, users) = services();
        let sales = roles.create(TENANT, &role("Sales", &["leads.edit"])).await.unwrap();
        let admin = roles.create(TENANT, &role("Admin", &["*"])).await.unwrap();
        let elif = users.create(TENANT, &user("elif@example.com")).await.unwrap();

        assert!(!users.has_permission(TENANT, elif.id, "leads.edit").await.unwrap());
        users.assign_role(TENANT, elif.id, sales.id).await.unwrap();
        assert!(users.has_permission(TENANT, elif.id, "leads.edit").await.unwrap());
        assert!(!users.has_permission(TENANT, elif.id, "accounts.delete").await.unwrap());

        users.assign_role(TENANT, elif.id, admin.id).await.unwrap();
        assert!(users.has_permission(TENANT, elif.id, "accounts.delete").await.unwrap());

        roles.delete(TENANT, admin.id).await.unwrap();
        assert!(!users.has_permission(TENANT, elif.id, "accounts.delete").await.unwrap());
    }

    #[tokio::test]
    async fn test_settings_set_get_or() {
        let settings = SettingService::new(CrudService::new(InMemoryStore::shared()));
        assert_eq!(settings.get_or(TENANT, "locale", "tr").await.unwrap(), "tr");

        settings.set(TENANT, "locale", "en").await.unwrap();
        settings.set(TENANT, "locale", "de").await.unwrap();
        assert_eq!(settings.get(TENANT, "locale").await.unwrap().as_deref(), Some("de"));
        assert_eq!(settings.all(TENANT).await.unwrap().len(), 1);
        assert_eq!(settings.get(TenantId(2), "locale").await.unwrap(), None);

        assert!(settings.delete(TENANT, "locale").await.unwrap());
        assert_eq!(settings.get(TENANT, "locale").await.unwrap(), None);
    }
}
