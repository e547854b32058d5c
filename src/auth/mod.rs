//! Authentication for the arbor server
//!
//! Password hashing, stateless token issuance and verification, the
//! signup/signin endpoints and the gate that protects `/api`.

pub mod handlers;
pub mod middleware;
pub mod password;
pub mod service;
pub mod token;

pub use middleware::{AuthGate, AuthenticatedUser};
pub use password::PasswordHasher;
pub use service::AuthService;
pub use token::{Claims, TokenCodec};
