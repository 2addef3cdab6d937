//! Admin user profiles scoped to the authenticated principal

use crate::error::{EventError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::{self, doc};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use utoipa::ToSchema;

pub const PERMISSION_CREATE_EVENT: &str = "create_event";
pub const PERMISSION_EDIT_EVENT: &str = "edit_event";
pub const PERMISSION_DELETE_EVENT: &str = "delete_event";
pub const PERMISSION_VIEW_ANALYTICS: &str = "view_analytics";

fn default_permissions() -> Vec<String> {
    [
        PERMISSION_CREATE_EVENT,
        PERMISSION_EDIT_EVENT,
        PERMISSION_DELETE_EVENT,
        PERMISSION_VIEW_ANALYTICS,
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

/// Admin profile; `id` is the principal id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct AdminUser {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: String,
    pub permissions: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub last_login: DateTime<Utc>,
    pub is_active: bool,
    pub profile_image_url: String,
    pub department: String,
    pub phone_number: String,
}

impl Default for AdminUser {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            email: String::new(),
            name: String::new(),
            role: "admin".to_string(),
            permissions: default_permissions(),
            created_at: now,
            last_login: now,
            is_active: true,
            profile_image_url: String::new(),
            department: String::new(),
            phone_number: String::new(),
        }
    }
}

impl AdminUser {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission)
    }
}

/// Authenticated identity supplied by the auth provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: String,
    pub email: Option<String>,
}

impl Principal {
    pub fn new(id: impl Into<String>, email: Option<String>) -> Self {
        Self {
            id: id.into(),
            email,
        }
    }
}

/// Source of the current principal
pub trait PrincipalProvider: Send + Sync {
    fn current_principal(&self) -> Option<Principal>;
}

impl PrincipalProvider for Option<Principal> {
    fn current_principal(&self) -> Option<Principal> {
        self.clone()
    }
}

/// Admin profile persistence keyed by principal id
#[async_trait]
pub trait AdminProfileStore: Send + Sync {
    async fn get(&self, id: &str) -> Result<Option<AdminUser>>;

    /// Insert or overwrite the profile at `admin.id`
    async fn put(&self, admin: AdminUser) -> Result<()>;
}

#[derive(Clone, Default)]
pub struct InMemoryAdminStore {
    profiles: Arc<RwLock<HashMap<String, AdminUser>>>,
}

impl InMemoryAdminStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AdminProfileStore for InMemoryAdminStore {
    async fn get(&self, id: &str) -> Result<Option<AdminUser>> {
        Ok(self.profiles.read().await.get(id).cloned())
    }

    async fn put(&self, admin: AdminUser) -> Result<()> {
        self.profiles.write().await.insert(admin.id.clone(), admin);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AdminDocument {
    #[serde(rename = "_id")]
    id: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    role: String,
    #[serde(default)]
    permissions: Vec<String>,
    created_at: bson::DateTime,
    last_login: bson::DateTime,
    #[serde(default)]
    is_active: bool,
    #[serde(default)]
    profile_image_url: String,
    #[serde(default)]
    department: String,
    #[serde(default)]
    phone_number: String,
}

impl From<AdminUser> for AdminDocument {
    fn from(admin: AdminUser) -> Self {
        Self {
            id: admin.id,
            email: admin.email,
            name: admin.name,
            role: admin.role,
            permissions: admin.permissions,
            created_at: bson::DateTime::from_millis(admin.created_at.timestamp_millis()),
            last_login: bson::DateTime::from_millis(admin.last_login.timestamp_millis()),
            is_active: admin.is_active,
            profile_image_url: admin.profile_image_url,
            department: admin.department,
            phone_number: admin.phone_number,
        }
    }
}

impl From<AdminDocument> for AdminUser {
    fn from(document: AdminDocument) -> Self {
        Self {
            id: document.id,
            email: document.email,
            name: document.name,
            role: document.role,
            permissions: document.permissions,
            created_at: DateTime::from_timestamp_millis(document.created_at.timestamp_millis())
                .unwrap_or_default(),
            last_login: DateTime::from_timestamp_millis(document.last_login.timestamp_millis())
                .unwrap_or_default(),
            is_active: document.is_active,
            profile_image_url: document.profile_image_url,
            department: document.department,
            phone_number: document.phone_number,
        }
    }
}

/// MongoDB-backed admin profiles, one document per principal
#[derive(Clone)]
pub struct MongoAdminStore {
    collection: Collection<AdminDocument>,
}

impl MongoAdminStore {
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        Self {
            collection: client.database(database).collection(collection),
        }
    }
}

#[async_trait]
impl AdminProfileStore for MongoAdminStore {
    #[instrument(skip(self))]
    async fn get(&self, id: &str) -> Result<Option<AdminUser>> {
        let document = self.collection.find_one(doc! { "_id": id }).await?;
        Ok(document.map(AdminUser::from))
    }

    #[instrument(skip(self, admin), fields(admin_id = %admin.id))]
    async fn put(&self, admin: AdminUser) -> Result<()> {
        let document = AdminDocument::from(admin);
        self.collection
            .replace_one(doc! { "_id": document.id.as_str() }, &document)
            .upsert(true)
            .await?;
        Ok(())
    }
}

/// Profile operations for the current principal
pub struct AdminService<S: AdminProfileStore, P: PrincipalProvider> {
    store: Arc<S>,
    principal: P,
}

impl<S: AdminProfileStore, P: PrincipalProvider> AdminService<S, P> {
    pub fn new(store: Arc<S>, principal: P) -> Self {
        Self { store, principal }
    }

    fn require_principal(&self) -> Result<Principal> {
        self.principal
            .current_principal()
            .ok_or(EventError::Unauthenticated)
    }

    /// Profile of the current principal; `None` when signed out or no profile exists
    #[instrument(skip(self))]
    pub async fn current_admin(&self) -> Result<Option<AdminUser>> {
        match self.principal.current_principal() {
            Some(principal) => self.store.get(&principal.id).await,
            None => Ok(None),
        }
    }

    /// Store a profile with id and email taken from the principal
    #[instrument(skip(self, admin))]
    pub async fn create_admin_profile(&self, admin: AdminUser) -> Result<AdminUser> {
        let principal = self.require_principal()?;
        let admin = AdminUser {
            id: principal.id,
            email: principal.email.unwrap_or_default(),
            ..admin
        };
        self.store.put(admin.clone()).await?;
        info!(admin_id = %admin.id, "Admin profile created");
        Ok(admin)
    }

    /// Overwrite the current principal's profile
    #[instrument(skip(self, admin))]
    pub async fn update_admin_profile(&self, admin: AdminUser) -> Result<AdminUser> {
        let principal = self.require_principal()?;
        let admin = AdminUser {
            id: principal.id,
            ..admin
        };
        self.store.put(admin.clone()).await?;
        info!(admin_id = %admin.id, "Admin profile updated");
        Ok(admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signed_in() -> Option<Principal> {
        Some(Principal::new("uid-1", Some("ada@example.com".to_string())))
    }

    #[test]
    fn test_default_permissions() {
        let admin = AdminUser::default();
        assert_eq!(admin.role, "admin");
        assert!(admin.is_active);
        assert!(admin.has_permission(PERMISSION_VIEW_ANALYTICS));
        assert!(!admin.has_permission("manage_admins"));
    }

    #[test]
    fn test_admin_json_defaults() {
        let admin: AdminUser = serde_json::from_str(r#"{"name":"Ada"}"#).unwrap();
        assert_eq!(admin.name, "Ada");
        assert_eq!(admin.permissions.len(), 4);
    }

    #[tokio::test]
    async fn test_create_stamps_principal_identity() {
        let store = Arc::new(InMemoryAdminStore::new());
        let service = AdminService::new(Arc::clone(&store), signed_in());

        let input = AdminUser {
            id: "forged".to_string(),
            email: "forged@example.com".to_string(),
            name: "Ada".to_string(),
            ..AdminUser::default()
        };
        let created = service.create_admin_profile(input).await.unwrap();
        assert_eq!(created.id, "uid-1");
        assert_eq!(created.email, "ada@example.com");

        let current = service.current_admin().await.unwrap().unwrap();
        assert_eq!(current.name, "Ada");
    }

    #[tokio::test]
    async fn test_signed_out() {
        let store = Arc::new(InMemoryAdminStore::new());
        let service = AdminService::new(store, None::<Principal>);

        assert!(service.current_admin().await.unwrap().is_none());
        assert!(matches!(
            service.update_admin_profile(AdminUser::default()).await,
            Err(EventError::Unauthenticated)
        ));
        assert!(matches!(
            service.create_admin_profile(AdminUser::default()).await,
            Err(EventError::Unauthenticated)
        ));
    }

    #[tokio::test]
    async fn test_update_keeps_principal_id() {
        let store = Arc::new(InMemoryAdminStore::new());
        let service = AdminService::new(Arc::clone(&store), signed_in());

        let update = AdminUser {
            id: "someone-else".to_string(),
            department: "Events".to_string(),
            ..AdminUser::default()
        };
        service.update_admin_profile(update).await.unwrap();

        assert!(store.get("someone-else").await.unwrap().is_none());
        assert_eq!(store.get("uid-1").await.unwrap().unwrap().department, "Events");
    }

    #[test]
    fn test_document_conversion() {
        let admin = AdminUser {
            id: "uid-1".to_string(),
            name: "Ada".to_string(),
            ..AdminUser::default()
        };
        let document = AdminDocument::from(admin.clone());
        let bson_doc = bson::to_document(&document).unwrap();
        assert_eq!(bson_doc.get_str("_id").unwrap(), "uid-1");
        assert!(bson_doc.get_datetime("lastLogin").is_ok());

        let restored = AdminUser::from(document);
        assert_eq!(restored.name, "Ada");
        assert_eq!(
            restored.created_at.timestamp_millis(),
            admin.created_at.timestamp_millis()
        );
    }
}
