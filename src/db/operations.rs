use std::sync::Arc;
use std::time::Duration;
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Postgres, Transaction};

use tracing::warn;

use crate::db::models::UserCredential;
use crate::db::store::CredentialStore;
use crate::error::{AppError, DatabaseError};

#[derive(Clone)]
pub struct DbOperations {
    pub(crate) pool: Arc<PgPool>,
}

impl DbOperations {
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::ConnectionError(e.to_string()))?;

        Ok(Self { pool: Arc::new(pool) })
    }

    pub async fn run_migrations(&self) -> Result<(), AppError> {
        sqlx::migrate!("./migrations").run(self.pool.as_ref()).await?;
        Ok(())
    }

    pub async fn begin_transaction(&self) -> Result<Transaction<'_, Postgres>, AppError> {
        Ok(self.pool.as_ref().begin().await?)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl CredentialStore for DbOperations {
    async fn insert_user(&self, email: &str, password_hash: &str) -> Result<UserCredential, AppError> {
        let mut transaction = self.begin_transaction().await?;

        let result = sqlx::query_as::<_, UserCredential>(
            r#"
            INSERT INTO users (email, password_hash)
            VALUES ($1, $2)
            RETURNING id, email, password_hash
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&mut *transaction)
        .await;

        match result {
            Ok(user) => {
                transaction.commit().await?;
                Ok(user)
            }
            Err(e) => {
                if let Err(rollback) = transaction.rollback().await {
                    warn!("Rollback after failed user insert also failed: {}", rollback);
                }
                match DatabaseError::from(e) {
                    DatabaseError::Duplicate => Err(AppError::DuplicateEmail),
                    other => Err(other.into()),
                }
            }
        }
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<UserCredential>, AppError> {
        let user = sqlx::query_as::<_, UserCredential>(
            "SELECT id, email, password_hash FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(user)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::{setup_test_db, unique_email};
    use super::*;

    #[tokio::test]
    #[ignore = "requires a Postgres instance at DATABASE_URL"]
    async fn test_insert_and_find_user() {
        let db = setup_test_db().await;
        let email = unique_email();

        let user = db.insert_user(&email, "hash").await.unwrap();
        let found = db.find_by_email(&email).await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert_eq!(found.password_hash, "hash");

        db.close().await;
    }

    #[tokio::test]
    #[ignore = "requires a Postgres instance at DATABASE_URL"]
    async fn test_duplicate_email_maps_to_conflict() {
        let db = setup_test_db().await;
        let email = unique_email();

        db.insert_user(&email, "hash").await.unwrap();
        let second = db.insert_user(&email, "other").await;
        assert!(matches!(second, Err(AppError::DuplicateEmail)));

        db.close().await;
    }
}
