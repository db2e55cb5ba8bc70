use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};

use crate::config::DeleteMode;
use crate::errors::AppError;
use crate::models::{BookingPatch, CreateBookingRequest};
use crate::state::AppState;

const DEGRADED_NOTE: &str = "Development mode - database not connected";

fn parse_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| AppError::Validation(e.body_text()))
}

// GET /api/bookings
pub async fn list_bookings(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let bookings = state.bookings.list().await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "data": bookings,
    })))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBookingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let request = parse_body(payload)?;
    let created = state.bookings.create(request).await?;

    let body = if created.durable {
        json!({
            "success": true,
            "message": "Booking created successfully",
            "data": created.data,
        })
    } else {
        json!({
            "success": true,
            "message": "Booking created successfully (development mode)",
            "data": created.data,
            "note": DEGRADED_NOTE,
        })
    };
    Ok((StatusCode::CREATED, Json(body)))
}

// GET /api/bookings/availability/:date
pub async fn availability(
    State(state): State<Arc<AppState>>,
    Path(date): Path<String>,
) -> Result<Json<Value>, AppError> {
    let slots = state.bookings.availability(&date).await?;

    let mut body = json!({
        "success": true,
        "date": date,
        "count": slots.data.len(),
        "bookedSlots": slots.data,
    });
    if !slots.durable {
        body["note"] = json!(DEGRADED_NOTE);
    }
    Ok(Json(body))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let booking = state.bookings.get(&id).await?;
    Ok(Json(json!({ "success": true, "data": booking })))
}

// PUT /api/bookings/:id
pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<BookingPatch>, JsonRejection>,
) -> Result<Json<Value>, AppError> {
    let patch = parse_body(payload)?;
    let booking = state.bookings.update(&id, patch).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Booking updated successfully",
        "data": booking,
    })))
}

// DELETE /api/bookings/:id
pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    match state.config.delete_mode {
        DeleteMode::Cancel => {
            let booking = state.bookings.cancel(&id).await?;
            Ok(Json(json!({
                "success": true,
                "message": "Booking cancelled successfully",
                "data": booking,
            })))
        }
        DeleteMode::Hard => {
            state.bookings.delete(&id).await?;
            Ok(Json(json!({
                "success": true,
                "message": "Booking deleted successfully",
            })))
        }
    }
}
