use axum::{
    http::Method,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

use crate::api::handlers;
use crate::store::traits::Store;

pub fn create_router<S: Store + 'static>() -> Router<Arc<S>> {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // FormData reader
        .route("/form-data", get(handlers::list_form_data::<S>))
        // Query lifecycle
        .route("/queries", post(handlers::create_query::<S>))
        .route(
            "/queries/:id",
            get(handlers::get_query::<S>)
                .put(handlers::update_query::<S>)
                .delete(handlers::delete_query::<S>),
        )
        .layer(cors_layer())
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}
