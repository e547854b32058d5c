use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use actix_web::web;
use tracing::{info, warn};

use crate::auth::password::PasswordHasher;
use crate::auth::token::TokenCodec;
use crate::db::store::CredentialStore;
use crate::error::{AppError, AuthError};

/// Trims and lowercases an email, then checks it has the shape
/// `local@domain.tld`.
pub fn normalize_email(email: &str) -> Result<String, AppError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() {
        return Err(AppError::ValidationError("email is required".to_string()));
    }

    let invalid = || AppError::ValidationError("email is not a valid address".to_string());
    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.contains('@') || email.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 || labels.iter().any(|label| label.is_empty()) {
        return Err(invalid());
    }

    Ok(email)
}

/// Signup and signin orchestration over a credential store, the password
/// hasher and the token codec.
pub struct AuthService {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
    tokens: Arc<TokenCodec>,
    /// Verified against when the email is unknown so both signin failures
    /// cost one bcrypt run. What it hashes is irrelevant: an unknown email
    /// fails whatever the outcome.
    placeholder_hash: String,
    password_checks: AtomicUsize,
}

impl AuthService {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: PasswordHasher,
        tokens: Arc<TokenCodec>,
    ) -> Result<Self, AppError> {
        let placeholder_hash = hasher.hash("x")?;
        Ok(Self {
            store,
            hasher,
            tokens,
            placeholder_hash,
            password_checks: AtomicUsize::new(0),
        })
    }

    pub fn tokens(&self) -> Arc<TokenCodec> {
        self.tokens.clone()
    }

    /// Registers a new user and returns a token for them.
    pub async fn signup(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = normalize_email(email)?;
        if password.is_empty() {
            return Err(AppError::ValidationError("password is required".to_string()));
        }

        let hasher = self.hasher;
        let password = password.to_owned();
        let password_hash = web::block(move || hasher.hash(&password)).await??;

        let user = self.store.insert_user(&email, &password_hash).await?;
        info!(user_id = user.id, "Registered user {}", user.email);

        self.tokens.issue(user.id)
    }

    /// Checks credentials and returns a fresh token. Every failure, including
    /// input that could never have been registered, is `InvalidCredentials`.
    pub async fn signin(&self, email: &str, password: &str) -> Result<String, AppError> {
        let email = email.trim().to_lowercase();
        let user = if password.is_empty() || normalize_email(&email).is_err() {
            None
        } else {
            self.store.find_by_email(&email).await?
        };

        let stored_hash = user
            .as_ref()
            .map_or_else(|| self.placeholder_hash.clone(), |u| u.password_hash.clone());
        let matches = self.check_password(password, stored_hash).await?;

        match user {
            Some(user) if matches => {
                info!(user_id = user.id, "Signed in {}", email);
                self.tokens.issue(user.id)
            }
            Some(user) => {
                warn!(user_id = user.id, "Signin rejected for {}: password mismatch", email);
                Err(AuthError::InvalidCredentials.into())
            }
            None => {
                warn!("Signin rejected for {}: no such user", email);
                Err(AuthError::InvalidCredentials.into())
            }
        }
    }

    async fn check_password(&self, password: &str, hash: String) -> Result<bool, AppError> {
        self.password_checks.fetch_add(1, Ordering::Relaxed);
        let hasher = self.hasher;
        let password = password.to_owned();
        Ok(web::block(move || hasher.verify(&password, &hash)).await?)
    }

    /// Number of password verifications run since startup.
    pub fn password_checks(&self) -> usize {
        self.password_checks.load(Ordering::Relaxed)
    }
}
