use crate::handlers;
use crate::state::AppState;
use axum::{
    routing::{get, post, put},
    Router,
};
use tower_http::trace::TraceLayer;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/data", get(handlers::get_data).post(handlers::save_data))
        .route("/api/transactions", post(handlers::create_transaction))
        .route(
            "/api/transactions/:id",
            put(handlers::update_transaction).delete(handlers::delete_transaction),
        )
        .route("/api/analytics", get(handlers::get_analytics))
        .route("/api/integrity", get(handlers::get_integrity))
        .route("/api/recurring/process", post(handlers::process_recurring))
        .route("/api/months/:month/close", post(handlers::close_month))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
