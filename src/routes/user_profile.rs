use axum::{routing::put, Router};

use crate::handlers::user_profile;
use crate::middleware::auth::auth_middleware;
use crate::state::AppState;

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/update-profile", put(user_profile::update_profile))
        .route_layer(axum::middleware::from_fn_with_state(state, auth_middleware))
}
