use std::collections::HashMap;
use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::db::models::UserCredential;
use crate::error::AppError;

/// Persistence seam for user credentials.
///
/// Emails reach the store already normalized. Uniqueness is the store's job:
/// a second insert of the same email must fail with
/// [`AppError::DuplicateEmail`], however concurrent the callers are.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<UserCredential, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, AppError>;
}

#[derive(Default)]
struct MemoryInner {
    next_id: i64,
    users: HashMap<String, UserCredential>,
}

/// Process-local store for tests and database-less local runs.
#[derive(Default)]
pub struct MemoryCredentialStore {
    inner: RwLock<MemoryInner>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.users.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<UserCredential, AppError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(email) {
            return Err(AppError::DuplicateEmail);
        }

        inner.next_id += 1;
        let user = UserCredential {
            id: inner.next_id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
        };
        inner.users.insert(email.to_string(), user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, AppError> {
        Ok(self.inner.read().await.users.get(email).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_insert_and_find() {
        let store = MemoryCredentialStore::new();
        let user = store.insert_user("a@x.com", "hash").await.unwrap();
        assert_eq!(user.id, 1);

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ids_are_unique() {
        let store = MemoryCredentialStore::new();
        let a = store.insert_user("a@x.com", "h").await.unwrap();
        let b = store.insert_user("b@x.com", "h").await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_signup_single_winner() {
        let store = Arc::new(MemoryCredentialStore::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert_user("same@x.com", "h").await
            }));
        }

        let mut ok = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(AppError::DuplicateEmail) => duplicates += 1,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        assert_eq!(ok, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.len().await, 1);
    }
}
