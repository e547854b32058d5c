use actix_web::{web, HttpResponse};
use serde_json::json;
use tracing::info;

use crate::auth::AuthenticatedUser;
use crate::db::TreeInput;
use crate::error::{AppError, DatabaseError};
use crate::AppState;

pub async fn list_types(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let types = state.db()?.list_types().await?;
    Ok(HttpResponse::Ok().json(types))
}

pub async fn list_trees(state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
    let trees = state.db()?.list_trees().await?;
    Ok(HttpResponse::Ok().json(trees))
}

pub async fn get_tree(
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let tree = state
        .db()?
        .get_tree(path.into_inner())
        .await?
        .ok_or(DatabaseError::NotFound)?;
    Ok(HttpResponse::Ok().json(tree))
}

pub async fn create_tree(
    user: AuthenticatedUser,
    body: web::Json<TreeInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(AppError::ValidationError)?;
    let tree = state.db()?.create_tree(user.user_id, &body).await?;
    info!(user_id = user.user_id, tree_id = tree.id, "Created tree {}", tree.name);
    Ok(HttpResponse::Ok().json(tree))
}

pub async fn update_tree(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    body: web::Json<TreeInput>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    body.validate().map_err(AppError::ValidationError)?;
    let tree = state
        .db()?
        .update_tree(path.into_inner(), user.user_id, &body)
        .await?
        .ok_or(DatabaseError::NotFound)?;
    Ok(HttpResponse::Ok().json(tree))
}

pub async fn delete_tree(
    user: AuthenticatedUser,
    path: web::Path<i64>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let id = path.into_inner();
    if !state.db()?.delete_tree(id, user.user_id).await? {
        return Err(DatabaseError::NotFound.into());
    }
    info!(user_id = user.user_id, tree_id = id, "Deleted tree");
    Ok(HttpResponse::Ok().json(json!({ "deleted": id })))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/types", web::get().to(list_types))
        .service(
            web::resource("/trees")
                .route(web::get().to(list_trees))
                .route(web::post().to(create_tree)),
        )
        .service(
            web::resource("/trees/{id}")
                .route(web::get().to(get_tree))
                .route(web::put().to(update_tree))
                .route(web::delete().to(delete_tree)),
        );
}
