// src/handlers/inventory.rs

use axum::{
    extract::{Path, Query, State},
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    config::AppState,
    middleware::rbac::{RequireRole, StaffAccess},
    models::{
        catalog::Product,
        inventory::{AdjustStockPayload, StockMovement},
    },
};

// POST /api/products/{id}/adjust-stock
#[utoipa::path(
    post,
    path = "/api/products/{id}/adjust-stock",
    tag = "Inventory",
    request_body = AdjustStockPayload,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Estoque ajustado", body = Product),
        (status = 400, description = "Variação inválida ou estoque ficaria negativo"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn adjust_stock(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AdjustStockPayload>,
) -> Result<Json<Product>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state
        .inventory_service
        .adjust_stock(&guard.user, id, &payload)
        .await?;

    Ok(Json(product))
}

// GET /api/products/{id}/movements
#[utoipa::path(
    get,
    path = "/api/products/{id}/movements",
    tag = "Inventory",
    params(
        ("id" = Uuid, Path, description = "ID do produto"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    responses((status = 200, description = "Histórico de movimentações", body = Paginated<StockMovement>)),
    security(("api_jwt" = []))
)]
pub async fn list_movements(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<StockMovement>>, AppError> {
    let movements = app_state.inventory_service.list_movements(id, &page).await?;
    Ok(Json(movements))
}
