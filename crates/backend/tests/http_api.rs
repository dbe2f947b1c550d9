use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use backend::api::state::AppState;
use backend::domain::a001_appointment::memory::InMemoryAppointmentRepository;
use backend::domain::a002_commerce_order::memory::InMemoryOrderRepository;
use backend::routes::configure_routes;
use backend::shared::config::AnalyticsConfig;
use chrono::{FixedOffset, TimeZone, Utc};
use contracts::domain::a001_appointment::aggregate::Appointment;
use contracts::domain::a002_commerce_order::aggregate::CommerceOrder;
use contracts::enums::appointment_category::AppointmentCategory;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

fn appointment(
    id: &str,
    email: &str,
    day: u32,
    city: &str,
    category: AppointmentCategory,
    cancelled: bool,
) -> Appointment {
    let local = FixedOffset::east_opt(3600)
        .unwrap()
        .with_ymd_and_hms(2025, 3, day, 11, 0, 0)
        .unwrap();
    Appointment::from_local_time(id, email, local, city, category, cancelled)
}

fn order(id: &str, email: Option<&str>, day: u32, tags: &[&str], total: f64) -> CommerceOrder {
    CommerceOrder {
        id: id.to_string(),
        customer_email: email.map(str::to_string),
        created_at: Utc.with_ymd_and_hms(2025, 3, day, 17, 30, 0).unwrap(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        total_price: total,
    }
}

fn app() -> Router {
    use AppointmentCategory::{Fitting, Measurement};
    let appointments = InMemoryAppointmentRepository::new(vec![
        appointment("ap-1", "ana@example.com", 3, "Madrid", Measurement, false),
        appointment("ap-2", "ben@example.com", 5, "Sevilla", Fitting, false),
        appointment("ap-3", "eva@example.com", 5, "Madrid", Measurement, true),
    ]);
    let orders = InMemoryOrderRepository::new(vec![
        order("o-1", Some("ANA@example.com"), 10, &["Madrid"], 120.0),
        order("o-2", Some("ben@example.com"), 12, &["Sevilla", "recurrent"], 80.0),
        order("o-3", Some("carl@example.com"), 14, &["new customer"], 50.0),
        order("o-4", Some("dora@example.com"), 15, &[], 30.0),
    ]);

    let state = AppState::new(
        Arc::new(appointments),
        Arc::new(orders),
        &AnalyticsConfig::default(),
    );
    configure_routes(state)
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<Value>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).ok())
}

#[tokio::test]
async fn health_check() {
    let response = app()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn appointment_stats_for_month() {
    let (status, body) = get(
        app(),
        "/api/d400/appointment_stats?year=2025&month=3&include_patterns=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = body.unwrap();
    assert_eq!(body["metrics"]["total"], 3);
    assert_eq!(body["metrics"]["measurement_count"], 2);
    assert_eq!(body["metrics"]["fitting_count"], 1);
    assert_eq!(body["metrics"]["cancelled_count"], 1);
    assert!(body["patterns"].is_object());

    let (_, madrid) = get(
        app(),
        "/api/d400/appointment_stats?year=2025&month=3\
         &store_city=Madrid&appointment_type=measurement",
    )
    .await;
    let madrid = madrid.unwrap();
    assert_eq!(madrid["metrics"]["total"], 2);
    assert!(madrid["patterns"].is_null());
}

#[tokio::test]
async fn invalid_stats_queries_are_rejected() {
    for uri in [
        "/api/d400/appointment_stats?year=2025&month=13",
        "/api/d400/appointment_stats",
        "/api/d400/appointment_stats?start_date=2025-03-31&end_date=2025-03-01",
        "/api/d400/appointment_stats?year=2025&appointment_type=consultation",
    ] {
        let (status, _) = get(app(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{}", uri);
    }
}

#[tokio::test]
async fn available_years() {
    let (status, body) = get(app(), "/api/d400/years").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.unwrap(), serde_json::json!([2025]));
}

#[tokio::test]
async fn year_comparison() {
    let (status, body) = get(app(), "/api/d401/month_comparison?month=3&years=2024,2025").await;
    assert_eq!(status, StatusCode::OK);
    let body = body.unwrap();
    assert_eq!(body["years"][0]["year"], 2025);
    assert_eq!(body["years"][0]["metrics"]["total"], 3);
    assert_eq!(body["years"][1]["metrics"]["total"], 0);
    assert_eq!(body["deltas"][0]["total_change"], 3);

    let (status, _) = get(app(), "/api/d401/month_comparison?month=0&years=2025").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = get(app(), "/api/d401/annual_comparison?years=").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_order_reconciliation() {
    let (status, body) = get(
        app(),
        "/api/u501/store_orders?start_date=2025-03-01&end_date=2025-03-31&include_matches=true",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = body.unwrap();
    let summary = &body["summary"];
    assert_eq!(summary["store_order_count"], 3);
    assert_eq!(summary["matched_count"], 2);
    assert_eq!(summary["inferred_count"], 1);
    assert_eq!(summary["measurement_count"], 2);
    assert_eq!(summary["fitting_count"], 1);
    assert_eq!(summary["online_order_count"], 1);
    assert_eq!(body["matches"].as_array().unwrap().len(), 3);

    let (status, _) = get(
        app(),
        "/api/u501/store_orders?start_date=2025-04-01&end_date=2025-03-01",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // last representable date: the padded window overflows
    let (status, _) = get(
        app(),
        "/api/u501/store_orders?start_date=%2B262142-12-31&end_date=%2B262142-12-31",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn order_history_by_month() {
    let (status, body) = get(
        app(),
        "/api/u501/history?start_date=2025-02-01&end_date=2025-03-31",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let body = body.unwrap();
    let months = body["months"].as_array().unwrap();
    assert_eq!(months.len(), 2);
    assert_eq!(months[0]["summary"]["store_order_count"], 0);
    assert_eq!(months[1]["summary"]["store_order_count"], 3);
    assert_eq!(body["summary"]["fitting_revenue"], 80.0);
}
