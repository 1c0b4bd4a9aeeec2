/*!
 * Storefront API library.
 *
 * An e-commerce backend exposing a product catalog, anonymous shopping
 * carts, cart-to-order checkout, customer profiles, and generic tagging
 * over a REST API.
 */

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod migrator;
pub mod openapi;
pub mod services;

use axum::{extract::State, response::Json, routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;
use utoipa::ToSchema;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub event_sender: events::EventSender,
    pub auth_service: auth::AuthService,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(
        db: Arc<DatabaseConnection>,
        config: config::AppConfig,
        event_sender: events::EventSender,
    ) -> Self {
        let auth_service = auth::AuthService::new(&config.jwt_secret);
        let services =
            handlers::AppServices::new(db.clone(), Arc::new(event_sender.clone()));
        Self {
            db,
            config,
            event_sender,
            auth_service,
            services,
        }
    }
}

// Common response wrapper for status endpoints
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
        }
    }
}

/// Builds the /api/v1 router
pub fn api_v1_routes(state: &AppState) -> Router<AppState> {
    let auth = state.auth_service.clone();

    Router::new()
        .route("/status", get(api_status))
        .route("/health", get(health_check))
        .nest("/products", handlers::products::products_routes(auth.clone()))
        .nest(
            "/promotions",
            handlers::products::promotions_routes(auth.clone()),
        )
        .nest(
            "/collections",
            handlers::collections::collections_routes(auth.clone()),
        )
        .nest("/carts", handlers::carts::carts_routes())
        .nest(
            "/customers",
            handlers::customers::customers_routes(auth.clone()),
        )
        .nest("/orders", handlers::orders::orders_routes(auth.clone()))
        .nest("/tags", handlers::tags::tags_routes(auth.clone()))
        .nest("/tagged-items", handlers::tags::tagged_items_routes(auth))
}

/// Builds the full application router
pub fn app(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_v1_routes(&state))
        .route("/health", get(health_check))
        .merge(openapi::swagger_ui())
        .with_state(state)
}

async fn api_status() -> Json<ApiResponse<Value>> {
    let status_data = json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339(),
    });
    Json(ApiResponse::success(status_data))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let db_status = match state.db.ping().await {
        Ok(_) => "healthy",
        Err(_) => "unhealthy",
    };

    Json(json!({
        "status": db_status,
        "components": {
            "database": db_status,
        },
        "timestamp": Utc::now().to_rfc3339(),
    }))
}
