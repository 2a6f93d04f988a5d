use std::sync::Arc;

use async_session::async_trait;
use axum_login::{AuthUser, AuthnBackend, UserId};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
use serde::Deserialize;
use tracing::debug;

use crate::auth::password;
use crate::entities::{prelude::User, user};

impl AuthUser for user::Model {
    type Id = i32;

    fn id(&self) -> Self::Id {
        self.id
    }

    // Changing the password invalidates existing sessions.
    fn session_auth_hash(&self) -> &[u8] {
        self.password_hash.as_bytes()
    }
}

#[derive(Clone, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
    pub next: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"[redacted]")
            .field("next", &self.next)
            .finish()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error(transparent)]
    Seaorm(sea_orm::DbErr),
}

#[derive(Debug, Clone)]
pub struct Backend {
    db: Arc<DatabaseConnection>,
}

impl Backend {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AuthnBackend for Backend {
    type User = user::Model;
    type Credentials = Credentials;
    type Error = BackendError;

    async fn authenticate(
        &self,
        creds: Self::Credentials,
    ) -> Result<Option<Self::User>, Self::Error> {
        let email = creds.email.trim().to_lowercase();
        let user = User::find()
            .filter(user::Column::Email.eq(email.clone()))
            .one(&*self.db)
            .await
            .map_err(Self::Error::Seaorm)?;

        let Some(user) = user else {
            debug!("Login attempt for unknown email {}", email);
            return Ok(None);
        };

        if password::verify(creds.password, user.password_hash.clone()).await {
            Ok(Some(user))
        } else {
            debug!("Wrong password for user {}", user.id);
            Ok(None)
        }
    }

    async fn get_user(&self, user_id: &UserId<Self>) -> Result<Option<Self::User>, Self::Error> {
        User::find_by_id(*user_id)
            .one(&*self.db)
            .await
            .map_err(Self::Error::Seaorm)
    }
}

pub type AuthSession = axum_login::AuthSession<Backend>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Role;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn stored_user(password_hash: String) -> user::Model {
        let now = chrono::Utc::now().naive_utc();
        user::Model {
            id: 7,
            email: "rep.ba@example.org".to_string(),
            password_hash,
            name: "Representação BA".to_string(),
            role: Role::Representante,
            state: Some("BA".to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn authenticates_with_matching_password() {
        let hashed = password::hash("correta".to_string()).await.unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_user(hashed)]])
            .into_connection();
        let backend = Backend::new(Arc::new(db));

        let user = backend
            .authenticate(Credentials {
                email: " Rep.BA@example.org ".to_string(),
                password: "correta".to_string(),
                next: None,
            })
            .await
            .unwrap();
        assert_eq!(user.map(|u| u.id), Some(7));
    }

    #[tokio::test]
    async fn rejects_wrong_password_and_unknown_email() {
        let hashed = password::hash("correta".to_string()).await.unwrap();
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![stored_user(hashed)]])
            .append_query_results([Vec::<user::Model>::new()])
            .into_connection();
        let backend = Backend::new(Arc::new(db));

        let wrong = backend
            .authenticate(Credentials {
                email: "rep.ba@example.org".to_string(),
                password: "errada".to_string(),
                next: None,
            })
            .await
            .unwrap();
        assert!(wrong.is_none());

        let unknown = backend
            .authenticate(Credentials {
                email: "ninguem@example.org".to_string(),
                password: "correta".to_string(),
                next: None,
            })
            .await
            .unwrap();
        assert!(unknown.is_none());
    }
}
