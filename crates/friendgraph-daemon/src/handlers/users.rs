use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use friendgraph_types::{CreateUserParams, DeleteUserParams, UpdateAgeParams, User, UserId};
use tracing::info;

use super::{decode, in_root_span, ApiError, HandlerContext};

pub async fn handle_create_user(
    State(ctx): State<HandlerContext>,
    body: Bytes,
) -> Result<(StatusCode, Json<UserId>), ApiError> {
    let params: CreateUserParams = decode(&body)?;
    let name = params
        .name
        .ok_or_else(|| ApiError::BadRequest("missing field `name`".to_string()))?;

    let id = in_root_span("create_user", || {
        ctx.store
            .create_user_with_friends(&name, &params.age, &params.friends)
    })?;

    info!("Created user {} ({})", id, name);
    Ok((StatusCode::CREATED, Json(id)))
}

pub async fn handle_delete_user(
    State(ctx): State<HandlerContext>,
    body: Bytes,
) -> Result<Json<String>, ApiError> {
    let params: DeleteUserParams = decode(&body)?;
    let name = in_root_span("delete_user", || ctx.store.delete_user(&params.target_id))?;

    info!("Deleted user {} ({})", params.target_id, name);
    Ok(Json(format!("{} has been deleted", name)))
}

pub async fn handle_update_age(
    State(ctx): State<HandlerContext>,
    Path(user_id): Path<UserId>,
    body: Bytes,
) -> Result<Json<String>, ApiError> {
    let params: UpdateAgeParams = decode(&body)?;
    in_root_span("update_age", || ctx.store.update_age(&user_id, &params.new_age))?;

    info!("Updated age of user {}", user_id);
    Ok(Json("User's age has been successfully updated".to_string()))
}

pub async fn handle_get_user(
    State(ctx): State<HandlerContext>,
    Path(user_id): Path<UserId>,
) -> Result<Json<User>, ApiError> {
    let user = in_root_span("get_user", || ctx.store.get_user(&user_id))?;
    Ok(Json(user))
}
