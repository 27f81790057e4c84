use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::teams;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/teams/create", post(teams::create_team))
        .route("/teams/my-teams", get(teams::my_teams))
        .route("/teams/:id", get(teams::get_team).put(teams::update_team))
        .route_layer(axum::middleware::from_fn_with_state(state, auth_middleware))
}
