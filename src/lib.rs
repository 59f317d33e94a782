pub mod config;
pub mod controllers;
pub mod error;
pub mod models;
pub mod services;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use services::registry::SeatRegistry;

pub const WELCOME: &str =
    "Welcome to the Concurrent Ticket Booking System API. Use the /seats endpoint.";

// Shared state для всего приложения
pub struct AppState {
    pub registry: SeatRegistry,
    pub config: config::Config,
}

impl AppState {
    pub fn new(config: config::Config) -> Arc<Self> {
        let registry = SeatRegistry::from_config(&config.registry);
        Self::with_registry(config, registry)
    }

    /// Состояние с готовым реестром (например, с ручными часами в тестах).
    pub fn with_registry(config: config::Config, registry: SeatRegistry) -> Arc<Self> {
        tracing::info!(
            "Seat registry ready: {} seats, lock timeout {} ms",
            registry.len(),
            registry.lock_duration().num_milliseconds()
        );
        Arc::new(Self { registry, config })
    }
}

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(|| async { WELCOME }))
        .route("/health", get(|| async { "OK" }))
        .merge(controllers::routes())
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
