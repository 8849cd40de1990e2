// handlers/public/root.rs - Service info and health

use axum::extract::State;
use axum::http::StatusCode;
use serde_json::{json, Value};

use crate::api::AppState;
use crate::middleware::{ApiResponse, ApiResult};

/// GET / - name, version and endpoint map
pub async fn root() -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "name": "Staybook API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "session": "/session, /users",
            "spots": "/spots[/:id], /spots/current",
            "spot_images": "/spots/:id/images (owner)",
            "spot_reviews": "/spots/:id/reviews",
            "spot_bookings": "/spots/:id/bookings (signed in)",
            "reviews": "/reviews/current, /reviews/:id[/images] (author)",
            "health": "/health",
        }
    })))
}

/// GET /health - 503 when the store does not answer
pub async fn health(State(state): State<AppState>) -> ApiResponse<Value> {
    let now = chrono::Utc::now();

    match state.store.health_check().await {
        Ok(()) => ApiResponse::success(json!({
            "status": "ok",
            "database": "ok",
            "timestamp": now,
        })),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            ApiResponse::with_status(
                json!({
                    "status": "degraded",
                    "database": "unavailable",
                    "timestamp": now,
                }),
                StatusCode::SERVICE_UNAVAILABLE,
            )
        }
    }
}
