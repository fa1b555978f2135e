// src/handlers/catalog.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;
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
        rbac::{AdminAccess, RequireRole, StaffAccess},
    },
    models::catalog::{
        BulkUpdateInput, Category, CategoryInput, Product, ProductFilter, ProductInput, ProductView,
        Review, ReviewInput,
    },
};

#[derive(Debug, Serialize, ToSchema)]
pub struct BulkUpdateResponse {
    pub updated: u64,
}

// ---
// VITRINE (pública)
// ---

#[utoipa::path(
    get,
    path = "/api/products",
    tag = "Catalog",
    params(
        ("q" = Option<String>, Query, description = "Busca pelo nome"),
        ("categoryId" = Option<Uuid>, Query, description = "Filtra pela categoria"),
        ("onSale" = Option<bool>, Query, description = "Só produtos com desconto ativo"),
        ("page" = Option<i64>, Query, description = "Página (começa em 1)"),
        ("limit" = Option<i64>, Query, description = "Itens por página (máx. 100)")
    ),
    responses((status = 200, description = "Produtos ativos", body = Paginated<ProductView>))
)]
pub async fn list_products(
    State(app_state): State<AppState>,
    Query(filter): Query<ProductFilter>,
    Query(page): Query<PageParams>,
) -> Result<Json<Paginated<ProductView>>, AppError> {
    let products = app_state.catalog_service.list_products(&filter, &page).await?;
    Ok(Json(products))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto com preço efetivo", body = ProductView),
        (status = 404, description = "Produto não encontrado")
    )
)]
pub async fn get_product(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProductView>, AppError> {
    let product = app_state.catalog_service.get_product(id).await?;
    Ok(Json(product))
}

// ---
// GESTÃO
// ---

#[utoipa::path(
    post,
    path = "/api/products",
    tag = "Catalog",
    request_body = ProductInput,
    responses(
        (status = 201, description = "Produto criado", body = Product),
        (status = 400, description = "Dados inválidos")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_product(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Json(payload): Json<ProductInput>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state.catalog_service.create_product(&guard.user, payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[utoipa::path(
    put,
    path = "/api/products/{id}",
    tag = "Catalog",
    request_body = ProductInput,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 200, description = "Produto atualizado (o estoque não muda aqui)", body = Product),
        (status = 404, description = "Produto não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_product(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductInput>,
) -> Result<Json<Product>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let product = app_state.catalog_service.update_product(&guard.user, id, payload).await?;
    Ok(Json(product))
}

#[utoipa::path(
    delete,
    path = "/api/products/{id}",
    tag = "Catalog",
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 204, description = "Produto desativado"),
        (status = 403, description = "Apenas administradores")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_product(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminAccess>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.catalog_service.deactivate_product(&guard.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    patch,
    path = "/api/products/bulk",
    tag = "Catalog",
    request_body = BulkUpdateInput,
    responses((status = 200, description = "Produtos alterados", body = BulkUpdateResponse)),
    security(("api_jwt" = []))
)]
pub async fn bulk_update_products(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminAccess>,
    Json(payload): Json<BulkUpdateInput>,
) -> Result<Json<BulkUpdateResponse>, AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let updated = app_state.catalog_service.bulk_update(&guard.user, &payload).await?;
    Ok(Json(BulkUpdateResponse { updated }))
}

// ---
// CATEGORIAS
// ---

#[utoipa::path(
    get,
    path = "/api/categories",
    tag = "Catalog",
    responses((status = 200, description = "Categorias", body = Vec<Category>))
)]
pub async fn list_categories(State(app_state): State<AppState>) -> Result<Json<Vec<Category>>, AppError> {
    let categories = app_state.catalog_service.list_categories().await?;
    Ok(Json(categories))
}

#[utoipa::path(
    post,
    path = "/api/categories",
    tag = "Catalog",
    request_body = CategoryInput,
    responses(
        (status = 201, description = "Categoria criada", body = Category),
        (status = 409, description = "Nome já existe")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_category(
    State(app_state): State<AppState>,
    guard: RequireRole<StaffAccess>,
    Json(payload): Json<CategoryInput>,
) -> Result<(StatusCode, Json<Category>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let category = app_state.catalog_service.create_category(&guard.user, &payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn delete_category(
    State(app_state): State<AppState>,
    guard: RequireRole<AdminAccess>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    app_state.catalog_service.delete_category(&guard.user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ---
// AVALIAÇÕES
// ---

pub async fn list_reviews(
    State(app_state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Review>>, AppError> {
    let reviews = app_state.catalog_service.list_reviews(id).await?;
    Ok(Json(reviews))
}

#[utoipa::path(
    post,
    path = "/api/products/{id}/reviews",
    tag = "Catalog",
    request_body = ReviewInput,
    params(("id" = Uuid, Path, description = "ID do produto")),
    responses(
        (status = 201, description = "Avaliação registrada", body = Review),
        (status = 409, description = "Usuário já avaliou o produto")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_review(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReviewInput>,
) -> Result<(StatusCode, Json<Review>), AppError> {
    payload.validate().map_err(AppError::ValidationError)?;

    let review = app_state.catalog_service.create_review(&user, id, &payload).await?;
    Ok((StatusCode::CREATED, Json(review)))
}
