use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};

use crate::state::AppState;

pub async fn root() -> Json<Value> {
    Json(json!({ "message": "Barber Shop Backend API is running!" }))
}

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    timestamp: String,
    database: DatabaseHealth,
    environment: String,
}

#[derive(Serialize)]
pub struct DatabaseHealth {
    state: &'static str,
}

// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let db_state = if state.bookings.store_ready().await {
        "connected"
    } else {
        "disconnected"
    };

    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339(),
        database: DatabaseHealth { state: db_state },
        environment: state.config.environment.clone(),
    })
}
