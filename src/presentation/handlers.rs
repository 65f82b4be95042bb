// HTTP request handlers
use crate::application::refresh_controller::{RefreshOutcome, Selection};
use crate::application::session::SessionSnapshot;
use crate::domain::errors::RefreshError;
use crate::infrastructure::http_response::{accepts_brotli, json_response};
use crate::presentation::app_state::AppState;
use crate::presentation::interaction::InteractionCommand;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const DEFAULT_PREDICTION_HOURS: u32 = 24;

#[derive(Deserialize)]
pub struct TooltipQuery {
    pub x: f64,
}

#[derive(Deserialize)]
pub struct PredictionQuery {
    pub hours: Option<u32>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub outcome: &'static str,
    pub points: Option<usize>,
    pub session: SessionSnapshot,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn outcome_fields(outcome: RefreshOutcome) -> (&'static str, Option<usize>) {
    match outcome {
        RefreshOutcome::Installed { points } => ("installed", Some(points)),
        RefreshOutcome::Empty => ("empty", None),
        RefreshOutcome::Stale => ("stale", None),
    }
}

fn error_response(status: StatusCode, error: &RefreshError) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.user_message(),
        }),
    )
        .into_response()
}

async fn respond<T: Serialize>(data: &T, headers: &HeaderMap) -> Response {
    match json_response(data, accepts_brotli(headers)).await {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}

/// Health check endpoint
pub async fn health_check() -> &'static str {
    "ok"
}

/// Load a (system, date range) selection into the session
pub async fn refresh(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(selection): Json<Selection>,
) -> Response {
    match state.controller.refresh(selection).await {
        Ok(outcome) => {
            let (outcome, points) = outcome_fields(outcome);
            let session = state.controller.with_session(|s| s.snapshot());
            respond(&RefreshResponse { outcome, points, session }, &headers).await
        }
        Err(e) => error_response(StatusCode::BAD_GATEWAY, &e),
    }
}

/// Current scene and session status
pub async fn get_scene(headers: HeaderMap, State(state): State<Arc<AppState>>) -> Response {
    let snapshot = state.controller.with_session(|s| s.snapshot());
    respond(&snapshot, &headers).await
}

pub async fn interaction(
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
    Json(command): Json<InteractionCommand>,
) -> Response {
    tracing::debug!("Interaction: {:?}", command);
    let snapshot = state.controller.with_session(|s| {
        command.apply(s);
        s.snapshot()
    });
    respond(&snapshot, &headers).await
}

/// Nearest point under a screen x, or `null`
pub async fn tooltip(
    headers: HeaderMap,
    Query(query): Query<TooltipQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hit = state.controller.with_session(|s| s.tooltip(query.x));
    respond(&hit, &headers).await
}

pub async fn predictions(
    Path(system_id): Path<String>,
    Query(query): Query<PredictionQuery>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let hours = query.hours.unwrap_or(DEFAULT_PREDICTION_HOURS);

    match state.controller.load_predictions(&system_id, hours).await {
        Ok(RefreshOutcome::Stale) => StatusCode::CONFLICT.into_response(),
        Ok(_) => {
            let forecast = state.controller.with_session(|s| s.forecast().cloned());
            respond(&forecast, &headers).await
        }
        Err(e) => {
            tracing::error!("{}", e);
            error_response(StatusCode::BAD_GATEWAY, &e)
        }
    }
}
