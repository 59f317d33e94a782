use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use validator::Validate;

use crate::error::{ConfirmError, LockError};
use crate::models::SeatId;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(list_seats))
        .route("/seats/{id}/lock", post(lock_seat))
        .route("/seats/{id}/confirm", post(confirm_seat))
}

/* ---------- helpers ---------- */

#[derive(Debug, Deserialize, Validate)]
struct ClaimRequest {
    #[serde(rename = "userId")]
    #[validate(required)]
    user_id: Option<Value>,
}

impl ClaimRequest {
    // Строка или число; пустая строка и 0 - всё равно что нет userId
    fn claimant(self) -> Option<String> {
        match self.user_id? {
            Value::String(s) if !s.is_empty() => Some(s),
            Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
            _ => None,
        }
    }
}

// Пустое/битое тело запроса - то же самое, что отсутствующий userId
fn claimant_from(body: Result<Json<ClaimRequest>, JsonRejection>) -> Option<String> {
    let Json(req) = body
        .map_err(|e| tracing::debug!("claim body rejected: {}", e))
        .ok()?;

    if let Err(e) = req.validate() {
        tracing::debug!("claim body failed validation: {}", e);
        return None;
    }
    req.claimant()
}

// Как parseInt: берём ведущие цифры ("5abc" -> 5). Без цифр id не совпадает
// ни с одним местом; 0 в реестре не бывает.
fn seat_id_from(raw: &str) -> SeatId {
    let raw = raw.trim_start();
    let raw = raw.strip_prefix('+').unwrap_or(raw);
    let end = raw
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(raw.len());
    raw[..end].parse().unwrap_or(0)
}

/* ---------- SEATS ---------- */

// GET /seats
async fn list_seats(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, Json(state.registry.list_all()))
}

// POST /seats/{id}/lock
async fn lock_seat(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<impl IntoResponse, LockError> {
    let claimant = claimant_from(body).ok_or(LockError::InvalidClaimant)?;
    let seat_id = seat_id_from(&raw_id);

    let seat = state.registry.lock(seat_id, &claimant)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!("Seat {} locked successfully by user {}.", seat_id, claimant),
            "seat": seat,
        })),
    ))
}

// POST /seats/{id}/confirm
async fn confirm_seat(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
    body: Result<Json<ClaimRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ConfirmError> {
    let claimant = claimant_from(body).ok_or(ConfirmError::InvalidClaimant)?;
    let seat_id = seat_id_from(&raw_id);

    let seat = state.registry.confirm(seat_id, &claimant)?;

    Ok((
        StatusCode::OK,
        Json(json!({
            "message": format!(
                "Booking for seat {} confirmed successfully for user {}.",
                seat_id, claimant
            ),
            "seat": seat,
        })),
    ))
}
