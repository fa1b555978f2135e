// src/handlers/returns.rs

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
    middleware::rbac::{RequireRole, StaffAccess},
    models::returns::{CreateReturnPayload, Return, ReturnDetail, ReturnFilter, UpdateReturnStatusPayload},
};

#[utoipa::path(
    post,
    path = "/api/returns",
    tag = "Returns",
    request_body = CreateReturnPayload,
    responses(
        (status = 201, description = "Devolução aberta (pendente)", body = ReturnDetail),
        (status = 400, description = "Item não pertence à venda ou quantidade excedida"),
        (status = 404, description = "Venda não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_return(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Json(payload): Json<CreateReturnPayload>,
) -> Result<(StatusCode, Json<ReturnDetail>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let created = app_state.return_service.create_return(&guard.user, &payload).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

#[utoipa::path(
    get,
    path = "/api/returns",
    tag = "Returns",
    params(
        ("status" = Option<String>, Query, description = "pending | approved | rejected"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    responses((status = 200, description = "Devoluções", body = Paginated<Return>)),
    security(("api_jwt" = []))
)]
pub async fn list_returns(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(filter): Query<ReturnFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<Return>>, AppError> {
    let returns = app_state.return_service.list_returns(&filter, &page).await?;
    Ok(Json(returns))
}

pub async fn get_return(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<Json<ReturnDetail>, AppError> {
    let found = app_state.return_service.get_return(id).await?;
    Ok(Json(found))
}

#[utoipa::path(
    patch,
    path = "/api/returns/{id}",
    tag = "Returns",
    request_body = UpdateReturnStatusPayload,
    params(("id" = Uuid, Path, description = "ID da devolução")),
    responses(
        (status = 200, description = "Status aplicado; reaprovar não mexe no estoque", body = ReturnDetail),
        (status = 400, description = "Transição não permitida"),
        (status = 404, description = "Devolução não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_return_status(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateReturnStatusPayload>,
) -> Result<Json<ReturnDetail>, AppError> {
    let updated = app_state
        .return_service
        .update_status(&guard.user, id, &payload)
        .await?;
    Ok(Json(updated))
}
