use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers::contests;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/contests/create", post(contests::create_contest))
        .route("/contests/:id/join", post(contests::join_contest))
        .route_layer(axum::middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        .route("/contests", get(contests::list_contests))
        .route("/contests/:id", get(contests::get_contest))
        .merge(protected)
}
