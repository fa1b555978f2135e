// src/handlers/settings.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    config::AppState,
    middleware::rbac::{AdminAccess, RequireRole, StaffAccess},
    models::{
        activity::{ActivityFilter, ActivityLog, NewActivity},
        settings::{StoreSettings, UpdateSettingsRequest},
    },
};

// GET /api/settings
#[utoipa::path(
    get,
    path = "/api/settings",
    tag = "Settings",
    responses((status = 200, description = "Configurações da loja", body = StoreSettings)),
    security(("api_jwt" = []))
)]
pub async fn get_settings(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
) -> Result<Json<StoreSettings>, AppError> {
    let settings = app_state.settings_repo.current().await?;
    Ok(Json(settings))
}

// PUT /api/settings
#[utoipa::path(
    put,
    path = "/api/settings",
    tag = "Settings",
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Configurações atualizadas", body = StoreSettings),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_settings(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminAccess>,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<StoreSettings>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let mut tx = app_state.db_pool.begin().await?;

    let updated = app_state.settings_repo.update_settings(&mut *tx, &payload).await?;

    app_state
        .activity_repo
        .record(
            &mut *tx,
            NewActivity {
                actor_id: Some(guard.user.id),
                actor_email: Some(guard.user.email.clone()),
                action: "settings.updated",
                entity_type: "settings",
                entity_id: None,
                changes: Some(json!({
                    "storeName": updated.store_name,
                    "currency": updated.currency,
                    "defaultTaxRate": updated.default_tax_rate,
                    "loyaltyPointsPerUnit": updated.loyalty_points_per_unit,
                    "lowStockThreshold": updated.low_stock_threshold,
                })),
            },
        )
        .await?;

    tx.commit().await?;

    tracing::info!(user_id = %guard.user.id, "Configurações da loja atualizadas");
    Ok(Json(updated))
}

// GET /api/activity-logs
#[utoipa::path(
    get,
    path = "/api/activity-logs",
    tag = "Settings",
    params(
        ("entityType" = Option<String>, Query, description = "Filtra pelo tipo (sale, return, product...)"),
        ("page" = Option<i64>, Query, description = "Página"),
        ("limit" = Option<i64>, Query, description = "Itens por página")
    ),
    responses((status = 200, description = "Trilha de auditoria", body = Paginated<ActivityLog>)),
    security(("api_jwt" = []))
)]
pub async fn list_activity_logs(
    State(app_state): State<AppState>,
    _guard: RequireRole<AdminAccess>,
    Query(filter): Query<ActivityFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<ActivityLog>>, AppError> {
    let (logs, total) = app_state.activity_repo.list(&filter, &page).await?;
    Ok(Json(Paginated::new(logs, &page, total)))
}
