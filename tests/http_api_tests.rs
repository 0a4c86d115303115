#![cfg(feature = "http_api")]

use axum::{
    body::{self, Body},
    http::{Request, StatusCode},
};
use school_calendar::http_api::{self, RegenerateResponse, SchoolYearDetail};
use school_calendar::{CalendarConfig, CalendarRecord, DayType, SchoolCalendar, SchoolYear};
use serde_json::json;
use tower::util::ServiceExt;

fn new_router() -> axum::Router {
    let calendar = SchoolCalendar::generate(CalendarConfig::default()).unwrap();
    let state = http_api::AppState::new(calendar);
    http_api::router(state)
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn read_body(response: axum::response::Response) -> Vec<u8> {
    body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

#[tokio::test]
async fn health_reports_ok() {
    let response = new_router().oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let value: serde_json::Value = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(value, json!({ "status": "ok" }));
}

#[tokio::test]
async fn record_by_date() {
    let app = new_router();

    let response = app.clone().oneshot(get("/calendar/2025-05-26")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let record: CalendarRecord = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(record.day_type, DayType::Holiday);
    assert_eq!(record.holiday_name.as_deref(), Some("Memorial Day"));

    let response = app.clone().oneshot(get("/calendar/2030-01-01")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app.oneshot(get("/calendar/yesterday")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn records_by_range() {
    let response = new_router()
        .oneshot(get("/calendar?start=2024-03-25&end=2024-03-31"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let records: Vec<CalendarRecord> = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(records.len(), 7);
    assert!(records[..5].iter().all(|r| r.day_type == DayType::Break));
    assert!(records[5..].iter().all(|r| r.day_type == DayType::Weekend));
}

#[tokio::test]
async fn school_years_and_detail() {
    let app = new_router();

    let response = app.clone().oneshot(get("/school-years")).await.unwrap();
    let years: Vec<SchoolYear> = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(years.len(), 10);

    let response = app.clone().oneshot(get("/school-years/9")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let detail: SchoolYearDetail = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(detail.school_year.label(), "2024-2025");
    assert!(detail.instructional_days >= 175);

    let response = app.oneshot(get("/school-years/42")).await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn csv_export_has_a_row_per_date() {
    let response = new_router().oneshot(get("/calendar.csv")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let text = String::from_utf8(read_body(response).await).unwrap();
    assert_eq!(text.lines().count(), 3622);
}

#[tokio::test]
async fn regenerate_replaces_the_calendar() {
    let app = new_router();

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/regenerate")
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&json!({ "seed": 17 })).unwrap()))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let regenerated: RegenerateResponse =
        serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(regenerated.seed, 17);
    assert_eq!(regenerated.summary.total_records, 3621);

    let response = app.oneshot(get("/config")).await.unwrap();
    let config: CalendarConfig = serde_json::from_slice(&read_body(response).await).unwrap();
    assert_eq!(config.seed, 17);
}
