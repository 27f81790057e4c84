use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::handlers::matches;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/matches/create", post(matches::create_match))
        .route("/matches/:id/players", post(matches::add_players))
        .route("/matches/:id/status", patch(matches::update_status))
        .route("/matches/:id/player-points", patch(matches::update_player_points))
        .route("/usermatches", get(matches::user_matches))
        .route_layer(axum::middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/matches", get(matches::list_matches))
        .route("/matches/:id", get(matches::get_match))
        .route("/matches/:id/players", get(matches::get_match_players))
        .merge(protected)
}
