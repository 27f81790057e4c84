use axum::{routing::post, Router};

use crate::handlers::early_access;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/", post(early_access::register_early_access))
}
