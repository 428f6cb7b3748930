//! Principal records and the store that resolves them.
//!
//! The store is the authoritative source for roles: tokens may carry a stale
//! role claim, so authorization always consults the stored record first.

use async_trait::async_trait;
use sqlx::{PgPool, Row};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;
use uuid::Uuid;

use crate::auth::Role;

/// Subset of the user aggregate relevant to access control.
#[derive(Debug, Clone)]
pub struct Principal {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    /// Opaque digest; see [`crate::auth::password`].
    pub password_hash: String,
    /// `None` on records created before the role column existed.
    pub role: Option<Role>,
}

impl Principal {
    /// Effective role for authorization: stored role, else the token's
    /// embedded role, else `User`. The token fallback keeps pre-role-column
    /// records working and is intentionally not simplified away.
    pub fn effective_role(&self, token_role: Option<Role>) -> Role {
        self.role.or(token_role).unwrap_or(Role::User)
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Resolves principals for the request guards and auth handlers.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError>;
}

/// Postgres-backed store used by the running server.
pub struct PgPrincipalStore {
    pool: PgPool,
}

impl PgPrincipalStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    fn principal_from_row(row: sqlx::postgres::PgRow) -> Principal {
        let role: Option<String> = row.get("role");
        Principal {
            id: row.get("id"),
            email: row.get("email"),
            display_name: row.get("display_name"),
            password_hash: row.get("password_hash"),
            role: role.as_deref().map(Role::from_claim),
        }
    }
}

#[async_trait]
impl PrincipalStore for PgPrincipalStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        let query = r#"
            SELECT id, email, display_name, password_hash, role
            FROM users
            WHERE id = $1
        "#;

        let row = sqlx::query(query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Self::principal_from_row))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        let query = r#"
            SELECT id, email, display_name, password_hash, role
            FROM users
            WHERE lower(email) = lower($1)
        "#;

        let row = sqlx::query(query)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Self::principal_from_row))
    }
}

/// In-memory store for tests and local development. Supports in-place role
/// changes so role promotion takes effect without reissuing tokens.
#[derive(Default)]
pub struct MemoryPrincipalStore {
    principals: RwLock<HashMap<Uuid, Principal>>,
}

impl MemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, principal: Principal) {
        self.principals
            .write()
            .expect("principal store lock poisoned")
            .insert(principal.id, principal);
    }

    pub fn set_role(&self, id: Uuid, role: Option<Role>) {
        if let Some(p) = self
            .principals
            .write()
            .expect("principal store lock poisoned")
            .get_mut(&id)
        {
            p.role = role;
        }
    }
}

#[async_trait]
impl PrincipalStore for MemoryPrincipalStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .principals
            .read()
            .expect("principal store lock poisoned")
            .get(&id)
            .cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Principal>, StoreError> {
        Ok(self
            .principals
            .read()
            .expect("principal store lock poisoned")
            .values()
            .find(|p| p.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Option<Role>) -> Principal {
        Principal {
            id: Uuid::new_v4(),
            email: "bob@example.com".to_string(),
            display_name: "Bob".to_string(),
            password_hash: String::new(),
            role,
        }
    }

    #[test]
    fn effective_role_prefers_stored_then_token_then_user() {
        let stored_admin = principal(Some(Role::Admin));
        assert_eq!(stored_admin.effective_role(Some(Role::User)), Role::Admin);

        let no_stored = principal(None);
        assert_eq!(no_stored.effective_role(Some(Role::Admin)), Role::Admin);
        assert_eq!(no_stored.effective_role(None), Role::User);
    }

    #[tokio::test]
    async fn memory_store_resolves_and_promotes() {
        let store = MemoryPrincipalStore::new();
        let p = principal(None);
        let id = p.id;
        store.insert(p);

        let found = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(found.role, None);

        store.set_role(id, Some(Role::Admin));
        let promoted = store.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(promoted.role, Some(Role::Admin));

        let by_email = store.find_by_email("BOB@example.com").await.unwrap();
        assert!(by_email.is_some());
    }
}
