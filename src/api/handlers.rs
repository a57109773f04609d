use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    Json,
};
use serde_json::{json, Value};

use crate::application::StockService;
use crate::domain::{Movement, MovementId, StockLevel, StockSummary};

use super::dto::{HistoryParams, MoveRequest, MoveResponse};
use super::error::ApiError;

type ApiResult<T> = Result<Json<T>, ApiError>;

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /stock/move`
pub async fn record_movement(
    State(service): State<StockService>,
    payload: Result<Json<MoveRequest>, JsonRejection>,
) -> ApiResult<MoveResponse> {
    let Json(body) = payload?;

    let movement = service
        .record_movement(&body.product, body.kind, body.quantity)
        .await?;

    Ok(Json(MoveResponse::recorded(movement.id)))
}

/// `GET /stock/{product}`
pub async fn get_stock(
    State(service): State<StockService>,
    Path(product): Path<String>,
) -> ApiResult<StockLevel> {
    Ok(Json(service.get_stock(&product).await?))
}

/// `GET /stock/move`: the static route shadows `/stock/{product}` for a
/// product literally named "move", so answer the stock query here.
pub async fn get_move_product_stock(State(service): State<StockService>) -> ApiResult<StockLevel> {
    Ok(Json(service.get_stock("move").await?))
}

/// `GET /stock`
pub async fn list_stock(State(service): State<StockService>) -> ApiResult<Vec<StockLevel>> {
    Ok(Json(service.get_all_stock().await?))
}

/// `GET /stock/{product}/movements?limit=N`
pub async fn list_product_movements(
    State(service): State<StockService>,
    Path(product): Path<String>,
    params: Result<Query<HistoryParams>, QueryRejection>,
) -> ApiResult<Vec<Movement>> {
    let Query(params) = params?;
    Ok(Json(
        service.list_movements(Some(&product), params.limit).await?,
    ))
}

/// `GET /stock/{product}/summary`
pub async fn get_summary(
    State(service): State<StockService>,
    Path(product): Path<String>,
) -> ApiResult<StockSummary> {
    Ok(Json(service.get_summary(&product).await?))
}

/// `GET /movements/{id}`
pub async fn get_movement(
    State(service): State<StockService>,
    id: Result<Path<MovementId>, PathRejection>,
) -> ApiResult<Movement> {
    let Path(id) = id?;
    Ok(Json(service.get_movement(id).await?))
}
