use std::sync::Arc;

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, post},
};
use pawmart_store::Store;
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::Config,
    handlers::{
        AppState, delete_listing, get_categories, get_listing, get_listings, get_orders, get_root,
        openapi_json, patch_listing, post_contact, post_listing, post_order,
    },
    middleware::{GateState, rate_limit_middleware},
};

pub fn create_router(config: &Config, gate: GateState, store: Arc<Store>) -> Router {
    let state = AppState { store };

    let cors = if config.cors_origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
            .allow_headers(Any)
            .allow_origin(Any)
    } else {
        let origins: Result<Vec<_>, _> = config
            .cors_origins
            .iter()
            .map(|origin| origin.parse())
            .collect();

        match origins {
            Ok(origins) => CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                .allow_headers(Any)
                .allow_origin(origins),
            Err(_) => {
                eprintln!("Warning: Invalid CORS origins, falling back to allow all");
                CorsLayer::new()
                    .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
                    .allow_headers(Any)
                    .allow_origin(Any)
            }
        }
    };

    Router::new()
        .route("/", get(get_root))
        .route("/categories", get(get_categories))
        .route("/listings", get(get_listings))
        .route(
            "/listings/{id}",
            get(get_listing).patch(patch_listing).delete(delete_listing),
        )
        .route("/listing", post(post_listing))
        .route("/order", post(post_order))
        .route("/orders", get(get_orders))
        .route(
            "/contact",
            post(post_contact).route_layer(middleware::from_fn_with_state(
                gate,
                rate_limit_middleware,
            )),
        )
        .route("/openapi.json", get(openapi_json))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
