pub mod auth;
pub mod cache;
pub mod config;
pub mod db;
pub mod logging;
pub mod middleware;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;
pub mod workers;

use std::sync::Arc;

use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::config::Config;
use crate::db::{DatabaseProxy, DbInitError};
use crate::state::AppState;

/// Full HTTP stack for an already assembled state.
pub fn build_app(state: AppState) -> axum::Router {
    routes::router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Connects the database from `config` and returns the app without Redis or workers.
pub async fn create_app(config: Config) -> Result<axum::Router, DbInitError> {
    let db_proxy = DatabaseProxy::connect(&config.database).await?;
    let state = AppState::new(Arc::new(config), Arc::new(db_proxy), None);
    Ok(build_app(state))
}
