use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::authentication::errors::StoreError;
use crate::domain::authentication::models::Principal;
use crate::domain::authentication::models::PrincipalId;
use crate::domain::authentication::ports::CredentialStore;
use crate::domain::authentication::ports::RefreshTokenStore;

struct StoredPrincipal {
    principal: Principal,
    deleted_at: Option<DateTime<Utc>>,
}

/// Credential store held in process memory.
///
/// Identifiers match either the principal ID or, case-insensitively, its
/// email. Soft-deleted principals stay in the map but are never returned.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    principals: RwLock<HashMap<PrincipalId, StoredPrincipal>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a principal.
    pub async fn insert(&self, principal: Principal) {
        self.principals.write().await.insert(
            principal.id.clone(),
            StoredPrincipal {
                principal,
                deleted_at: None,
            },
        );
    }

    /// Replace the stored hash after a password change.
    ///
    /// # Returns
    /// False if no live principal has this ID
    pub async fn replace_password_hash(&self, id: &PrincipalId, password_hash: String) -> bool {
        match self.principals.write().await.get_mut(id) {
            Some(stored) if stored.deleted_at.is_none() => {
                stored.principal.password_hash = password_hash;
                true
            }
            _ => false,
        }
    }

    /// Mark a principal deleted without removing it.
    ///
    /// # Returns
    /// False if no live principal has this ID
    pub async fn soft_delete(&self, id: &PrincipalId) -> bool {
        match self.principals.write().await.get_mut(id) {
            Some(stored) if stored.deleted_at.is_none() => {
                stored.deleted_at = Some(Utc::now());
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn lookup(&self, identifier: &str) -> Result<Option<Principal>, StoreError> {
        let principals = self.principals.read().await;
        let live = |stored: &&StoredPrincipal| stored.deleted_at.is_none();

        // An exact ID match wins over another principal's email
        let by_id = PrincipalId::new(identifier)
            .ok()
            .and_then(|id| principals.get(&id))
            .filter(live);
        if let Some(stored) = by_id {
            return Ok(Some(stored.principal.clone()));
        }

        Ok(principals
            .values()
            .filter(live)
            .map(|stored| &stored.principal)
            .filter(|principal| principal.email.as_str().eq_ignore_ascii_case(identifier))
            .min_by(|a, b| a.id.as_str().cmp(b.id.as_str()))
            .cloned())
    }

    async fn lookup_by_subject(
        &self,
        subject: &PrincipalId,
    ) -> Result<Option<Principal>, StoreError> {
        let principals = self.principals.read().await;

        Ok(principals
            .get(subject)
            .filter(|stored| stored.deleted_at.is_none())
            .map(|stored| stored.principal.clone()))
    }
}

struct Session {
    subject: PrincipalId,
    expires_at: DateTime<Utc>,
}

/// Refresh-token sessions held in process memory.
///
/// Expired sessions are dropped whenever a new one is recorded.
#[derive(Default)]
pub struct InMemoryRefreshTokenStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemoryRefreshTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of outstanding sessions for a principal.
    pub async fn outstanding(&self, subject: &PrincipalId) -> usize {
        self.sessions
            .read()
            .await
            .values()
            .filter(|session| &session.subject == subject)
            .count()
    }
}

#[async_trait]
impl RefreshTokenStore for InMemoryRefreshTokenStore {
    async fn record(
        &self,
        session_id: &str,
        subject: &PrincipalId,
        expires_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let now = Utc::now();
        let mut sessions = self.sessions.write().await;

        sessions.retain(|_, session| session.expires_at >= now);
        sessions.insert(
            session_id.to_string(),
            Session {
                subject: subject.clone(),
                expires_at,
            },
        );
        Ok(())
    }

    async fn consume(&self, session_id: &str) -> Result<bool, StoreError> {
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }

    async fn revoke_all(&self, subject: &PrincipalId) -> Result<u64, StoreError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();

        sessions.retain(|_, session| &session.subject != subject);
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::authentication::models::EmailAddress;

    fn principal(id: &str, email: &str) -> Principal {
        Principal {
            id: PrincipalId::new(id).unwrap(),
            email: EmailAddress::new(email.to_string()).unwrap(),
            display_name: None,
            password_hash: "$argon2id$placeholder".to_string(),
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_lookup_by_id_and_email() {
        let store = InMemoryCredentialStore::new();
        store.insert(principal("u1", "a@x.com")).await;

        let by_id = store.lookup("u1").await.unwrap();
        assert_eq!(by_id.unwrap().id.as_str(), "u1");

        let by_email = store.lookup("A@X.com").await.unwrap();
        assert_eq!(by_email.unwrap().id.as_str(), "u1");

        assert!(store.lookup("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_id_match_wins_over_email_match() {
        for _ in 0..50 {
            let store = InMemoryCredentialStore::new();
            store.insert(principal("x@y.com", "owner@y.com")).await;
            store.insert(principal("b", "x@y.com")).await;

            let found = store.lookup("x@y.com").await.unwrap().unwrap();
            assert_eq!(found.id.as_str(), "x@y.com");
        }
    }

    #[tokio::test]
    async fn test_email_match_used_when_id_owner_deleted() {
        let store = InMemoryCredentialStore::new();
        store.insert(principal("x@y.com", "owner@y.com")).await;
        store.insert(principal("b", "x@y.com")).await;
        store.soft_delete(&PrincipalId::new("x@y.com").unwrap()).await;

        let found = store.lookup("x@y.com").await.unwrap().unwrap();
        assert_eq!(found.id.as_str(), "b");
    }

    #[tokio::test]
    async fn test_soft_deleted_principal_hidden() {
        let store = InMemoryCredentialStore::new();
        let id = PrincipalId::new("u1").unwrap();
        store.insert(principal("u1", "a@x.com")).await;

        assert!(store.soft_delete(&id).await);
        assert!(!store.soft_delete(&id).await);

        assert!(store.lookup("u1").await.unwrap().is_none());
        assert!(store.lookup_by_subject(&id).await.unwrap().is_none());
        assert!(!store.replace_password_hash(&id, "new".to_string()).await);
    }

    #[tokio::test]
    async fn test_replace_password_hash() {
        let store = InMemoryCredentialStore::new();
        let id = PrincipalId::new("u1").unwrap();
        store.insert(principal("u1", "a@x.com")).await;

        assert!(store.replace_password_hash(&id, "$argon2id$new".to_string()).await);

        let updated = store.lookup_by_subject(&id).await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "$argon2id$new");
    }

    #[tokio::test]
    async fn test_session_consumed_once() {
        let store = InMemoryRefreshTokenStore::new();
        let subject = PrincipalId::new("u1").unwrap();
        let expires_at = Utc::now() + chrono::Duration::days(7);

        store.record("s1", &subject, expires_at).await.unwrap();

        assert!(store.consume("s1").await.unwrap());
        assert!(!store.consume("s1").await.unwrap());
        assert!(!store.consume("never-issued").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_all_only_touches_one_principal() {
        let store = InMemoryRefreshTokenStore::new();
        let alice = PrincipalId::new("u1").unwrap();
        let bob = PrincipalId::new("u2").unwrap();
        let expires_at = Utc::now() + chrono::Duration::days(7);

        store.record("a1", &alice, expires_at).await.unwrap();
        store.record("a2", &alice, expires_at).await.unwrap();
        store.record("b1", &bob, expires_at).await.unwrap();

        assert_eq!(store.revoke_all(&alice).await.unwrap(), 2);
        assert_eq!(store.outstanding(&alice).await, 0);
        assert!(!store.consume("a1").await.unwrap());
        assert!(store.consume("b1").await.unwrap());
    }

    #[tokio::test]
    async fn test_expired_sessions_dropped_on_record() {
        let store = InMemoryRefreshTokenStore::new();
        let subject = PrincipalId::new("u1").unwrap();

        store
            .record("old", &subject, Utc::now() - chrono::Duration::seconds(1))
            .await
            .unwrap();
        store
            .record("new", &subject, Utc::now() + chrono::Duration::days(7))
            .await
            .unwrap();

        assert_eq!(store.outstanding(&subject).await, 1);
        assert!(!store.consume("old").await.unwrap());
    }
}
