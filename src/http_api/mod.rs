use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::NaiveDate;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::persistence::write_records_csv;
use crate::{
    CalendarConfig, CalendarError, CalendarRecord, CalendarSummary, SchoolCalendar, SchoolYear,
    ValidationReport,
};

#[derive(Clone)]
pub struct AppState {
    calendar: Arc<RwLock<SchoolCalendar>>,
}

impl AppState {
    pub fn new(calendar: SchoolCalendar) -> Self {
        Self {
            calendar: Arc::new(RwLock::new(calendar)),
        }
    }

    pub fn with_shared(calendar: Arc<RwLock<SchoolCalendar>>) -> Self {
        Self { calendar }
    }

    fn calendar(&self) -> Arc<RwLock<SchoolCalendar>> {
        self.calendar.clone()
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Invalid(String),
    Unprocessable(String),
    Internal(String),
}

impl ApiError {
    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }
}

impl From<polars::prelude::PolarsError> for ApiError {
    fn from(value: polars::prelude::PolarsError) -> Self {
        ApiError::Internal(value.to_string())
    }
}

impl From<CalendarError> for ApiError {
    fn from(value: CalendarError) -> Self {
        match value {
            CalendarError::Validation(report) => {
                let details = report
                    .errors()
                    .map(ToString::to_string)
                    .collect::<Vec<_>>()
                    .join("; ");
                ApiError::Unprocessable(details)
            }
            CalendarError::Configuration(message) => ApiError::Invalid(message),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Unprocessable(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validation_failed",
                message,
            ),
            ApiError::Internal(message) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

#[derive(Debug, Deserialize)]
struct RangeQuery {
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct RegeneratePayload {
    seed: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SchoolYearDetail {
    pub school_year: SchoolYear,
    pub instructional_days: u32,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RegenerateResponse {
    pub seed: u64,
    pub summary: CalendarSummary,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/config", get(get_config))
        .route("/calendar", get(list_records))
        .route("/calendar.csv", get(export_csv))
        .route("/calendar/:date", get(get_record))
        .route("/school-years", get(list_school_years))
        .route("/school-years/:id", get(get_school_year))
        .route("/summary", get(get_summary))
        .route("/validation", get(get_validation))
        .route("/regenerate", post(regenerate))
        .with_state(state)
}

pub async fn serve(addr: SocketAddr, calendar: SchoolCalendar) -> std::io::Result<()> {
    let state = AppState::new(calendar);
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn get_config(State(state): State<AppState>) -> Json<CalendarConfig> {
    let calendar = state.calendar();
    let config = calendar.read().config().clone();
    Json(config)
}

async fn list_records(
    State(state): State<AppState>,
    Query(query): Query<RangeQuery>,
) -> Result<Json<Vec<CalendarRecord>>, ApiError> {
    let calendar = state.calendar();
    let guard = calendar.read();
    let start = query.start.unwrap_or(guard.registry().range_start());
    let end = query.end.unwrap_or(guard.registry().range_end());
    let records = guard.range(start, end)?.to_vec();
    Ok(Json(records))
}

async fn export_csv(State(state): State<AppState>) -> Result<Response, ApiError> {
    let calendar = state.calendar();
    let mut body = Vec::new();
    write_records_csv(calendar.read().records(), &mut body)
        .map_err(|err| ApiError::Internal(err.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/csv")], body).into_response())
}

async fn get_record(
    State(state): State<AppState>,
    Path(date): Path<String>,
) -> Result<Json<CalendarRecord>, ApiError> {
    let date = NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ApiError::invalid(format!("'{date}' is not a YYYY-MM-DD date")))?;
    let calendar = state.calendar();
    let record = calendar
        .read()
        .record(date)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("{date} is outside the calendar range")))?;
    Ok(Json(record))
}

async fn list_school_years(State(state): State<AppState>) -> Json<Vec<SchoolYear>> {
    let calendar = state.calendar();
    let years = calendar.read().registry().years().to_vec();
    Json(years)
}

async fn get_school_year(
    State(state): State<AppState>,
    Path(id): Path<u32>,
) -> Result<Json<SchoolYearDetail>, ApiError> {
    let calendar = state.calendar();
    let guard = calendar.read();
    let school_year = guard
        .school_year(id)
        .cloned()
        .ok_or_else(|| ApiError::not_found(format!("school year {id} not found")))?;
    Ok(Json(SchoolYearDetail {
        instructional_days: guard.instructional_days(id),
        school_year,
    }))
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<CalendarSummary>, ApiError> {
    let calendar = state.calendar();
    let summary = calendar.read().summary()?;
    Ok(Json(summary))
}

async fn get_validation(State(state): State<AppState>) -> Json<ValidationReport> {
    let calendar = state.calendar();
    let report = calendar.read().report().clone();
    Json(report)
}

async fn regenerate(
    State(state): State<AppState>,
    Json(payload): Json<RegeneratePayload>,
) -> Result<Json<RegenerateResponse>, ApiError> {
    let calendar = state.calendar();
    let regenerated = {
        let guard = calendar.read();
        guard.regenerate(payload.seed)?
    };
    let summary = regenerated.summary()?;
    *calendar.write() = regenerated;
    info!(seed = payload.seed, "calendar regenerated over http");
    Ok(Json(RegenerateResponse {
        seed: payload.seed,
        summary,
    }))
}
