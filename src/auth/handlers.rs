use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};
use crate::AppState;
use crate::error::AppError;
use tracing::info;

/// Body accepted by both `/auth/signup` and `/auth/signin`. Missing fields
/// deserialize as empty and are rejected by validation.
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub token: String,
}

pub async fn signup(
    req: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received signup request for email: {}", req.email);
    let token = state.auth_service.signup(&req.email, &req.password).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}

pub async fn signin(
    req: web::Json<CredentialsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("Received signin request for email: {}", req.email);
    let token = state.auth_service.signin(&req.email, &req.password).await?;
    Ok(HttpResponse::Ok().json(AuthResponse { token }))
}

/// Mounts the unauthenticated `/auth` routes.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/auth")
            .route("/signup", web::post().to(signup))
            .route("/signin", web::post().to(signin)),
    );
}
