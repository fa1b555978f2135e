// src/handlers/analytics.rs

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::rbac::{RequireRole, StaffAccess},
    models::{
        analytics::{DailySales, DateRangeParams, FinancialReport, SalesSummary, TopProduct},
        catalog::Product,
    },
};

#[derive(Debug, Deserialize)]
pub struct LowStockParams {
    pub threshold: Option<i32>,
}

// GET /api/analytics/summary
#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = "Analytics",
    params(
        ("from" = Option<String>, Query, description = "Data inicial (AAAA-MM-DD), padrão: 30 dias atrás"),
        ("to" = Option<String>, Query, description = "Data final inclusiva (AAAA-MM-DD), padrão: hoje")
    ),
    responses((status = 200, description = "Resumo das vendas no período", body = SalesSummary)),
    security(("api_jwt" = []))
)]
pub async fn get_summary(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<SalesSummary>, AppError> {
    let summary = app_state.analytics_service.summary(&params).await?;
    Ok(Json(summary))
}

// GET /api/analytics/sales-by-day
#[utoipa::path(
    get,
    path = "/api/analytics/sales-by-day",
    tag = "Analytics",
    params(
        ("from" = Option<String>, Query, description = "Data inicial (AAAA-MM-DD)"),
        ("to" = Option<String>, Query, description = "Data final inclusiva (AAAA-MM-DD)")
    ),
    responses((status = 200, description = "Um ponto por dia, inclusive dias sem venda", body = Vec<DailySales>)),
    security(("api_jwt" = []))
)]
pub async fn get_sales_by_day(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<DailySales>>, AppError> {
    let days = app_state.analytics_service.sales_by_day(&params).await?;
    Ok(Json(days))
}

// GET /api/analytics/top-products
#[utoipa::path(
    get,
    path = "/api/analytics/top-products",
    tag = "Analytics",
    params(
        ("from" = Option<String>, Query, description = "Data inicial (AAAA-MM-DD)"),
        ("to" = Option<String>, Query, description = "Data final inclusiva (AAAA-MM-DD)"),
        ("limit" = Option<i64>, Query, description = "Quantos produtos (1 a 50, padrão 10)")
    ),
    responses((status = 200, description = "Mais vendidos por quantidade", body = Vec<TopProduct>)),
    security(("api_jwt" = []))
)]
pub async fn get_top_products(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<Vec<TopProduct>>, AppError> {
    let top = app_state.analytics_service.top_products(&params).await?;
    Ok(Json(top))
}

// GET /api/analytics/low-stock
#[utoipa::path(
    get,
    path = "/api/analytics/low-stock",
    tag = "Analytics",
    params(("threshold" = Option<i32>, Query, description = "Padrão: limite das configurações da loja")),
    responses((status = 200, description = "Produtos ativos no limite ou abaixo dele", body = Vec<Product>)),
    security(("api_jwt" = []))
)]
pub async fn get_low_stock(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(params): Query<LowStockParams>,
) -> Result<Json<Vec<Product>>, AppError> {
    let threshold = match params.threshold {
        Some(threshold) => threshold,
        None => app_state.settings_repo.current().await?.low_stock_threshold,
    };
    let products = app_state.analytics_service.low_stock(threshold).await?;
    Ok(Json(products))
}

// GET /api/reports/financial
#[utoipa::path(
    get,
    path = "/api/reports/financial",
    tag = "Analytics",
    params(
        ("from" = Option<String>, Query, description = "Data inicial (AAAA-MM-DD)"),
        ("to" = Option<String>, Query, description = "Data final inclusiva (AAAA-MM-DD)")
    ),
    responses((status = 200, description = "Receita, custos, reembolsos, despesas e lucro líquido", body = FinancialReport)),
    security(("api_jwt" = []))
)]
pub async fn get_financial_report(
    State(app_state): State<AppState>,
    _guard: RequireRole<StaffAccess>,
    Query(params): Query<DateRangeParams>,
) -> Result<Json<FinancialReport>, AppError> {
    let report = app_state.analytics_service.financial_report(&params).await?;
    Ok(Json(report))
}
