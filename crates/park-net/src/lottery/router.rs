use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{Period, PeriodError, ResidentId, VehicleCategory};
use super::repository::{LotteryRepository, Notifier, RequestSource, ResidentDirectory};
use super::service::{LotteryService, LotteryServiceError};

/// Router builder exposing the lottery HTTP endpoints.
pub fn lottery_router<S, D, L, N>(service: Arc<LotteryService<S, D, L, N>>) -> Router
where
    S: RequestSource + 'static,
    D: ResidentDirectory + 'static,
    L: LotteryRepository + 'static,
    N: Notifier + 'static,
{
    Router::new()
        .route(
            "/api/v1/lottery/execute",
            post(execute_handler::<S, D, L, N>),
        )
        .route(
            "/api/v1/lottery/:period",
            get(result_handler::<S, D, L, N>).delete(delete_handler::<S, D, L, N>),
        )
        .route(
            "/api/v1/lottery/:period/assignments/:resident_id",
            get(assignments_handler::<S, D, L, N>),
        )
        .with_state(service)
}

#[derive(Debug, Deserialize)]
pub(crate) struct ExecuteLotteryRequest {
    pub(crate) period: Period,
    pub(crate) num_car_spots: u32,
    pub(crate) num_moto_spots: u32,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ResultQuery {
    pub(crate) vehicle_category: Option<VehicleCategory>,
}

pub(crate) async fn execute_handler<S, D, L, N>(
    State(service): State<Arc<LotteryService<S, D, L, N>>>,
    axum::Json(payload): axum::Json<ExecuteLotteryRequest>,
) -> Response
where
    S: RequestSource + 'static,
    D: ResidentDirectory + 'static,
    L: LotteryRepository + 'static,
    N: Notifier + 'static,
{
    match service.execute_lottery(payload.period, payload.num_car_spots, payload.num_moto_spots) {
        Ok(result) => (StatusCode::CREATED, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn result_handler<S, D, L, N>(
    State(service): State<Arc<LotteryService<S, D, L, N>>>,
    Path(period): Path<String>,
    Query(query): Query<ResultQuery>,
) -> Response
where
    S: RequestSource + 'static,
    D: ResidentDirectory + 'static,
    L: LotteryRepository + 'static,
    N: Notifier + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(rejection) => return rejection,
    };

    match service.result_for_period(period, query.vehicle_category) {
        Ok(result) => (StatusCode::OK, axum::Json(result)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn assignments_handler<S, D, L, N>(
    State(service): State<Arc<LotteryService<S, D, L, N>>>,
    Path((period, resident_id)): Path<(String, String)>,
) -> Response
where
    S: RequestSource + 'static,
    D: ResidentDirectory + 'static,
    L: LotteryRepository + 'static,
    N: Notifier + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(rejection) => return rejection,
    };

    match service.assignments_for_resident(&ResidentId(resident_id), period) {
        Ok(assignments) => (StatusCode::OK, axum::Json(assignments)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_handler<S, D, L, N>(
    State(service): State<Arc<LotteryService<S, D, L, N>>>,
    Path(period): Path<String>,
) -> Response
where
    S: RequestSource + 'static,
    D: ResidentDirectory + 'static,
    L: LotteryRepository + 'static,
    N: Notifier + 'static,
{
    let period = match parse_period(&period) {
        Ok(period) => period,
        Err(rejection) => return rejection,
    };

    match service.delete_result(period) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

fn parse_period(raw: &str) -> Result<Period, Response> {
    raw.parse().map_err(|error: PeriodError| {
        (
            StatusCode::UNPROCESSABLE_ENTITY,
            axum::Json(json!({ "error": error.to_string() })),
        )
            .into_response()
    })
}

fn error_response(error: LotteryServiceError) -> Response {
    let status = match &error {
        LotteryServiceError::AlreadyExecuted(_) => StatusCode::CONFLICT,
        LotteryServiceError::ResultNotFound(_) => StatusCode::NOT_FOUND,
        LotteryServiceError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (status, axum::Json(json!({ "error": error.to_string() }))).into_response()
}
