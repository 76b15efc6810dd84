use axum::extract::State;
use axum::Json;
use friendgraph_types::StatsResult;

use super::HandlerContext;

pub async fn handle_stats(State(ctx): State<HandlerContext>) -> Json<StatsResult> {
    let stats = ctx.store.stats();
    Json(StatsResult {
        pid: std::process::id(),
        users: stats.users,
        friendships: stats.friendships,
        next_id: stats.next_id,
    })
}
