//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use tracing::{error, warn};

use super::AppState;
use super::types::{ErrorResponse, StateResponse, TelemetryQuery, TelemetryRecord};
use crate::dispatch::TickInput;
use crate::error::EmsError;
use crate::history::HistorySnapshot;

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, error: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.into(),
        }),
    )
}

/// Returns config, battery, ledger, run summary, and the latest tick.
///
/// `GET /state` → 200 + `StateResponse` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Json<StateResponse> {
    let site = state.site.lock().await;
    let ledger = site.ledger_snapshot();

    Json(StateResponse {
        config: state.config.clone(),
        dispatch: *site.dispatch_config(),
        battery: *site.battery(),
        co2_reduced_display: ledger.co2_total_display(),
        ledger,
        kpi: site.kpi().clone(),
        latest_tick: site.latest().map(TelemetryRecord::from),
    })
}

/// Returns the four trend series, oldest sample first.
///
/// `GET /history` → 200 + `HistorySnapshot` JSON
pub async fn get_history(State(state): State<Arc<AppState>>) -> Json<HistorySnapshot> {
    let site = state.site.lock().await;
    Json(site.history().snapshot())
}

/// Returns tick records, optionally filtered by tick range.
///
/// `GET /telemetry` → 200 + `Vec<TelemetryRecord>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("`from` ({from}) must be <= `to` ({to})"),
        ));
    }

    let site = state.site.lock().await;
    let records: Vec<TelemetryRecord> = site
        .records()
        .iter()
        .filter(|r| r.tick >= from && r.tick <= to)
        .map(TelemetryRecord::from)
        .collect();

    Ok(Json(records))
}

/// Runs one live tick with the posted readings.
///
/// `POST /tick` + `TickInput` JSON → 200 + `TelemetryRecord`
/// → 409 if another request holds the site
/// → 422 if a reading is negative or not finite
///
/// The tick runs on the blocking pool since saving the ledger touches the
/// filesystem.
pub async fn post_tick(
    State(state): State<Arc<AppState>>,
    Json(input): Json<TickInput>,
) -> Result<Json<TelemetryRecord>, ApiError> {
    let Ok(mut site) = Arc::clone(&state.site).try_lock_owned() else {
        warn!("tick skipped: site busy");
        return Err(api_error(StatusCode::CONFLICT, "a tick is already in progress"));
    };

    let outcome = tokio::task::spawn_blocking(move || site.tick(input))
        .await
        .map_err(|e| {
            error!("tick task failed: {e}");
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "tick task failed")
        })?;

    match outcome {
        Ok(record) => Ok(Json(TelemetryRecord::from(&record))),
        Err(EmsError::InvalidInput(msg)) => Err(api_error(StatusCode::UNPROCESSABLE_ENTITY, msg)),
        Err(e) => {
            error!("tick failed: {e}");
            Err(api_error(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}
