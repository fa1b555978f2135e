// src/handlers/sales.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
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
    middleware::{
        auth::AuthenticatedUser,
        rbac::{RequireRole, StaffAccess},
    },
    models::sale::{CreateSalePayload, LinkUserPayload, Sale, SaleDetail, SaleFilter},
};

// POST /api/sales
#[utoipa::path(
    post,
    path = "/api/sales",
    tag = "Sales",
    request_body = CreateSalePayload,
    responses(
        (status = 201, description = "Venda registrada", body = SaleDetail),
        (status = 400, description = "Carrinho inválido, estoque ou valor recebido insuficiente"),
        (status = 401, description = "Não autenticado"),
        (status = 403, description = "Apenas equipe"),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_sale(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Json(payload): Json<CreateSalePayload>,
) -> Result<(StatusCode, Json<SaleDetail>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let sale = app_state.sale_service.create_sale(&guard.user, &payload).await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

// GET /api/sales
#[utoipa::path(
    get,
    path = "/api/sales",
    tag = "Sales",
    params(
        ("from" = Option<String>, Query, description = "Início (RFC 3339)"),
        ("to" = Option<String>, Query, description = "Fim, exclusivo (RFC 3339)"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    responses((status = 200, description = "Vendas", body = Paginated<Sale>)),
    security(("api_jwt" = []))
)]
pub async fn list_sales(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(filter): Query<SaleFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<Sale>>, AppError> {
    let sales = app_state.sale_service.list_sales(&filter, &page).await?;
    Ok(Json(sales))
}

// GET /api/sales/mine
#[utoipa::path(
    get,
    path = "/api/sales/mine",
    tag = "Sales",
    responses((status = 200, description = "Compras vinculadas à conta da sessão", body = Paginated<Sale>)),
    security(("api_jwt" = []))
)]
pub async fn list_my_sales(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<Sale>>, AppError> {
    let sales = app_state.sale_service.list_my_sales(&user, &page).await?;
    Ok(Json(sales))
}

// GET /api/sales/{id}
#[utoipa::path(
    get,
    path = "/api/sales/{id}",
    tag = "Sales",
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda com itens", body = SaleDetail),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_sale(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<Json<SaleDetail>, AppError> {
    let sale = app_state.sale_service.get_sale(id).await?;
    Ok(Json(sale))
}

// PATCH /api/sales/{id}/link-user
#[utoipa::path(
    patch,
    path = "/api/sales/{id}/link-user",
    tag = "Sales",
    request_body = LinkUserPayload,
    params(("id" = Uuid, Path, description = "ID da venda")),
    responses(
        (status = 200, description = "Venda vinculada", body = Sale),
        (status = 409, description = "Venda já vinculada a outra conta")
    ),
    security(("api_jwt" = []))
)]
pub async fn link_user(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<LinkUserPayload>,
) -> Result<Json<Sale>, AppError> {
    let sale = app_state
        .sale_service
        .link_user(&guard.user, id, payload.user_id)
        .await?;
    Ok(Json(sale))
}
