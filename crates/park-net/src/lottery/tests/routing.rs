use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Response;
use serde_json::Value;
use tower::ServiceExt;

use super::common::*;
use crate::lottery::domain::VehicleCategory;
use crate::lottery::router::{self, lottery_router, ResultQuery};

async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

fn post_execute(period_token: &str, cars: u32, motos: u32) -> axum::http::Request<axum::body::Body> {
    let payload = serde_json::json!({
        "period": period_token,
        "num_car_spots": cars,
        "num_moto_spots": motos,
    });
    axum::http::Request::post("/api/v1/lottery/execute")
        .header(axum::http::header::CONTENT_TYPE, "application/json")
        .body(axum::body::Body::from(payload.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn execute_route_creates_a_result() {
    let h = harness();
    let ana = resident("res-ana", "Ana Restrepo");
    h.enroll(&ana, &[VehicleCategory::Car], "2025-07");
    let router = lottery_router(Arc::new(h.service));

    let response = router
        .oneshot(post_execute("2025-07", 2, 1))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CREATED);
    let payload = read_json_body(response).await;
    assert_eq!(payload["period"], "2025-07");
    assert_eq!(payload["total_car_spots_offered"], 2);
    assert_eq!(payload["winners"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn execute_route_rejects_a_second_run_with_conflict() {
    let h = harness();
    h.service
        .execute_lottery(period("2025-07"), 1, 1)
        .expect("first run succeeds");
    let router = lottery_router(Arc::new(h.service));

    let response = router
        .oneshot(post_execute("2025-07", 1, 1))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::CONFLICT);
    let payload = read_json_body(response).await;
    assert!(payload["error"]
        .as_str()
        .unwrap_or_default()
        .contains("already been executed"));
}

#[tokio::test]
async fn execute_route_rejects_malformed_periods() {
    let h = harness();
    let router = lottery_router(Arc::new(h.service));

    let response = router
        .oneshot(post_execute("2025-7", 1, 1))
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn result_route_returns_not_found_for_absent_periods() {
    let h = harness();
    let router = lottery_router(Arc::new(h.service));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/lottery/2030-01")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn result_route_applies_the_category_filter() {
    let h = harness();
    let ana = resident("res-ana", "Ana Restrepo");
    let bruno = resident("res-bruno", "Bruno Silva");
    h.enroll(&ana, &[VehicleCategory::Car, VehicleCategory::Motorcycle], "2025-07");
    h.enroll(&bruno, &[VehicleCategory::Car], "2025-07");
    h.service
        .execute_lottery(period("2025-07"), 2, 1)
        .expect("lottery executes");
    let router = lottery_router(Arc::new(h.service));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/lottery/2025-07?vehicle_category=motorcycle")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let winners = payload["winners"].as_array().expect("winners array");
    assert_eq!(winners.len(), 1);
    assert_eq!(winners[0]["vehicle_category"], "motorcycle");
}

#[tokio::test]
async fn result_handler_rejects_malformed_path_periods() {
    let h = harness();
    let response = router::result_handler(
        State(Arc::new(h.service)),
        Path("2025-7".to_string()),
        Query(ResultQuery::default()),
    )
    .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn delete_route_removes_then_misses() {
    let h = harness();
    h.service
        .execute_lottery(period("2025-07"), 1, 0)
        .expect("lottery executes");
    let service = Arc::new(h.service);

    let response = router::delete_handler(State(service.clone()), Path("2025-07".to_string())).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router::delete_handler(State(service), Path("2025-07".to_string())).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assignments_route_returns_an_empty_list_without_a_lottery() {
    let h = harness();
    let router = lottery_router(Arc::new(h.service));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/lottery/2025-07/assignments/res-ana")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    assert_eq!(payload, serde_json::json!([]));
}

#[tokio::test]
async fn assignments_route_lists_a_winning_resident() {
    let h = harness();
    let ana = resident("res-ana", "Ana Restrepo");
    h.enroll(&ana, &[VehicleCategory::Car], "2025-07");
    h.service
        .execute_lottery(period("2025-07"), 1, 0)
        .expect("lottery executes");
    let router = lottery_router(Arc::new(h.service));

    let response = router
        .oneshot(
            axum::http::Request::get("/api/v1/lottery/2025-07/assignments/res-ana")
                .body(axum::body::Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("route executes");

    assert_eq!(response.status(), StatusCode::OK);
    let payload = read_json_body(response).await;
    let entries = payload.as_array().expect("assignment array");
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["spot"], "C-01");
    assert_eq!(entries[0]["vehicle_category"], "car");
}
