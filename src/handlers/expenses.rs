// src/handlers/expenses.rs

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
    models::expense::{Expense, ExpenseFilter, ExpenseInput},
};

#[utoipa::path(
    get,
    path = "/api/expenses",
    tag = "Expenses",
    params(
        ("from" = Option<String>, Query, description = "Data inicial (AAAA-MM-DD)"),
        ("to" = Option<String>, Query, description = "Data final (AAAA-MM-DD)"),
        ("category" = Option<String>, Query, description = "Categoria"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    responses((status = 200, description = "Despesas", body = Paginated<Expense>)),
    security(("api_jwt" = []))
)]
pub async fn list_expenses(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(filter): Query<ExpenseFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<Expense>>, AppError> {
    let expenses = app_state.expense_service.list_expenses(&filter, &page).await?;
    Ok(Json(expenses))
}

#[utoipa::path(
    post,
    path = "/api/expenses",
    tag = "Expenses",
    request_body = ExpenseInput,
    responses((status = 201, description = "Despesa registrada", body = Expense)),
    security(("api_jwt" = []))
)]
pub async fn create_expense(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Json(payload): Json<ExpenseInput>,
) -> Result<(StatusCode, Json<Expense>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let expense = app_state.expense_service.create_expense(&guard.user, &payload).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

pub async fn get_expense(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
) -> Result<Json<Expense>, AppError> {
    let expense = app_state.expense_service.get_expense(id).await?;
    Ok(Json(expense))
}

pub async fn update_expense(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExpenseInput>,
) -> Result<Json<Expense>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let expense = app_state
        .expense_service
        .update_expense(&guard.user, id, &payload)
        .await?;
    Ok(Json(expense))
}

pub async fn delete_expense(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminAccess>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.expense_service.delete_expense(&guard.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
