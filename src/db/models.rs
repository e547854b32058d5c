use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A registered user as stored by the credential store.
///
/// Only the bcrypt hash is ever held; `Debug` redacts it and the type is not
/// `Serialize`, so it cannot end up in a response body by accident.
#[derive(Clone, FromRow)]
pub struct UserCredential {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
}

impl std::fmt::Debug for UserCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserCredential")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password_hash", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct TreeType {
    pub id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub name: String,
}

/// A tree row joined with the name of its type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tree {
    pub id: i64,
    pub name: String,
    pub hardness_factor: i32,
    pub hardwood: bool,
    pub type_id: i64,
    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub type_name: String,
    pub owner_id: i64,
}

/// Client-supplied tree fields. Ownership is never taken from here.
#[derive(Debug, Clone, Deserialize)]
pub struct TreeInput {
    pub name: String,
    pub hardness_factor: i32,
    pub hardwood: bool,
    pub type_id: i64,
}

impl TreeInput {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be empty".to_string());
        }
        if !(1..=10).contains(&self.hardness_factor) {
            return Err(format!(
                "hardness_factor must be within 1..=10, got {}",
                self.hardness_factor
            ));
        }
        Ok(())
    }
}
