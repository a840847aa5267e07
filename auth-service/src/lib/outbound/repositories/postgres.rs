use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;

use crate::domain::authentication::errors::StoreError;
use crate::domain::authentication::models::EmailAddress;
use crate::domain::authentication::models::Principal;
use crate::domain::authentication::models::PrincipalId;
use crate::domain::authentication::ports::CredentialStore;
use crate::domain::authentication::ports::RefreshTokenStore;

/// Credential store backed by a `principals` table.
///
/// Expects columns `id`, `email`, `display_name`, `password_hash`,
/// `created_at` and a nullable `deleted_at` marking soft deletion.
pub struct PostgresCredentialStore {
    pool: PgPool,
}

impl PostgresCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct PrincipalRow {
    id: String,
    email: String,
    display_name: Option<String>,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<PrincipalRow> for Principal {
    type Error = StoreError;

    fn try_from(row: PrincipalRow) -> Result<Self, Self::Error> {
        let id = PrincipalId::new(row.id).map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let email = EmailAddress::new(row.email)
            .map_err(|e| StoreError::Corrupt(format!("principal {}: {}", id, e)))?;

        Ok(Principal {
            id,
            email,
            display_name: row.display_name,
            password_hash: row.password_hash,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl CredentialStore for PostgresCredentialStore {
    async fn lookup(&self, identifier: &str) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, display_name, password_hash, created_at
            FROM principals
            WHERE (id = $1 OR lower(email) = lower($1))
              AND deleted_at IS NULL
            ORDER BY (id = $1) DESC, id
            LIMIT 1
            "#,
        )
        .bind(identifier)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        row.map(Principal::try_from).transpose()
    }

    async fn lookup_by_subject(
        &self,
        subject: &PrincipalId,
    ) -> Result<Option<Principal>, StoreError> {
        let row = sqlx::query_as::<_, PrincipalRow>(
            r#"
            SELECT id, email, display_name, password_hash, created_at
            FROM principals
            WHERE id = $1
              AND deleted_at IS NULL
            "#,
        )
        .bind(subject.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        row.map(Principal::try_from).transpose()
    }
}

/// Refresh-token sessions in a `refresh_tokens` table.
///
/// Expects columns `session_id` (primary key), `principal_id` and
/// `expires_at`.
pub struct PostgresRefreshTokenStore {
    pool: PgPool,
}

impl PostgresRefreshTokenStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RefreshTokenStore for PostgresRefreshTokenStore {
    async fn record(
        &self,
        session_id: &str,
        subject: &PrincipalId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (session_id, principal_id, expires_at)
            VALUES ($1, $2, $3)
            "#,
        )
        .bind(session_id)
        .bind(subject.as_str())
        .bind(expires_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(())
    }

    async fn consume(&self, session_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE session_id = $1
            "#,
        )
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(result.rows_affected() == 1)
    }

    async fn revoke_all(&self, subject: &PrincipalId) -> Result<u64, StoreError> {
        let result = sqlx::query(
            r#"
            DELETE FROM refresh_tokens
            WHERE principal_id = $1
            "#,
        )
        .bind(subject.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        Ok(result.rows_affected())
    }
}
