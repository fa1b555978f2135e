// src/handlers/customers.rs

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
    middleware::rbac::{AdminAccess, RequireRole, StaffAccess},
    models::customer::{Customer, CustomerInput},
    services::customer_service::CustomerSearch,
};

#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    params(
        ("q" = Option<String>, Query, description = "Busca por nome, telefone ou e-mail"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    responses((status = 200, description = "Clientes", body = Paginated<Customer>)),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(search): Query<CustomerSearch>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<Customer>>, AppError> {
    let customers = app_state.customer_service.list_customers(&search, &page).await?;
    Ok(Json(customers))
}

#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = CustomerInput,
    responses(
        (status = 201, description = "Cliente criado", body = Customer),
        (status = 409, description = "Telefone já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Json(payload): Json<CustomerInput>,
) -> Result<(StatusCode, Json<Customer>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let customer = app_state.customer_service.create_customer(&guard.user, &payload).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn get_customer(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<Json<Customer>, AppError> {
    let customer = app_state.customer_service.get_customer(id).await?;
    Ok(Json(customer))
}

pub async fn update_customer(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerInput>,
) -> Result<Json<Customer>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let customer = app_state
        .customer_service
        .update_customer(&guard.user, id, &payload)
        .await?;
    Ok(Json(customer))
}

pub async fn delete_customer(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminAccess>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.customer_service.delete_customer(&guard.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
