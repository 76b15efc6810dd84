use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use friendgraph_types::{MakeFriendsParams, UserId};
use tracing::info;

use super::{decode, in_root_span, ApiError, HandlerContext};

pub async fn handle_make_friends(
    State(ctx): State<HandlerContext>,
    body: Bytes,
) -> Result<Json<String>, ApiError> {
    let params: MakeFriendsParams = decode(&body)?;
    let (source_name, target_name) = in_root_span("make_friends", || {
        ctx.store
            .add_friendship(&params.source_id, &params.target_id)
    })?;

    info!("Linked users {} and {}", params.source_id, params.target_id);
    Ok(Json(format!(
        "{} and {} are now friends",
        source_name, target_name
    )))
}

pub async fn handle_list_friends(
    State(ctx): State<HandlerContext>,
    Path(user_id): Path<UserId>,
) -> Result<Json<Vec<UserId>>, ApiError> {
    let friends = in_root_span("list_friends", || ctx.store.list_friends(&user_id))?;
    Ok(Json(friends))
}
