//! Routes mounted under `/api`. Everything here runs behind the
//! [`AuthGate`](crate::auth::AuthGate) and reads the caller from
//! [`AuthenticatedUser`], never from the request body.

pub mod trees;

use actix_web::{web, HttpResponse};
use serde_json::json;

use crate::auth::AuthenticatedUser;

pub async fn whoami(user: AuthenticatedUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "message": format!("in this protected route, we get the user's id like so: {}", user.user_id),
        "user_id": user.user_id
    }))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/test", web::get().to(whoami))
        .configure(trees::configure);
}
