// src/db/catalog_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, pagination::PageParams},
    models::catalog::{
        BulkUpdateInput, Category, Product, ProductFilter, ProductImage, ProductInput, Review,
        SizeStock,
    },
};

// Filtro compartilhado entre a listagem e a contagem.
// $1 = busca por nome, $2 = categoria, $3 = só em promoção, $4 = agora
const PRODUCT_FILTER: &str = r#"
    is_active = TRUE
    AND ($1::text IS NULL OR name ILIKE '%' || $1 || '%')
    AND ($2::uuid IS NULL OR category_id = $2)
    AND (
        $3::bool IS NULL
        OR $3 = (COALESCE(discount, 0) > 0 AND (discount_end_time IS NULL OR discount_end_time > $4))
    )
"#;

#[derive(Clone)]
pub struct CatalogRepository {
    pool: PgPool,
}

impl CatalogRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  PRODUTOS (Leitura)
    // =========================================================================

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: &PageParams,
        now: DateTime<Utc>,
    ) -> Result<(Vec<Product>, i64), AppError> {
        let list_sql = format!(
            "SELECT * FROM products WHERE {PRODUCT_FILTER} ORDER BY name ASC LIMIT $5 OFFSET $6"
        );
        let products = sqlx::query_as::<_, Product>(&list_sql)
            .bind(filter.q.as_deref())
            .bind(filter.category_id)
            .bind(filter.on_sale)
            .bind(now)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM products WHERE {PRODUCT_FILTER}");
        let total = sqlx::query_scalar::<_, i64>(&count_sql)
            .bind(filter.q.as_deref())
            .bind(filter.category_id)
            .bind(filter.on_sale)
            .bind(now)
            .fetch_one(&self.pool)
            .await?;

        Ok((products, total))
    }

    pub async fn get_product(&self, id: Uuid) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(product)
    }

    /// Trava a linha do produto até o fim da transação.
    pub async fn get_product_for_update<'e, E>(
        &self,
        executor: E,
        id: Uuid,
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(product)
    }

    /// Trava vários produtos, sempre na ordem do id, para que duas transações
    /// concorrentes nunca se bloqueiem mutuamente.
    pub async fn lock_products<'e, E>(&self, executor: E, ids: &[Uuid]) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(ids)
        .fetch_all(executor)
        .await?;
        Ok(products)
    }

    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(
            "SELECT * FROM products WHERE is_active = TRUE AND stock <= $1 ORDER BY stock ASC, name ASC",
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await?;
        Ok(products)
    }

    // =========================================================================
    //  PRODUTOS (Escrita)
    // =========================================================================

    pub async fn insert_product<'e, E>(
        &self,
        executor: E,
        input: &ProductInput,
        stock: i32,
        images: &[ProductImage],
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (
                category_id, name, description, price, purchase_price,
                stock, stock_by_size, discount, discount_end_time, images
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            "#,
        )
        .bind(input.category_id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.purchase_price)
        .bind(stock)
        .bind(input.stock_by_size.as_ref().map(Json))
        .bind(input.discount)
        .bind(input.discount_end_time)
        .bind(Json(images))
        .fetch_one(executor)
        .await?;
        Ok(product)
    }

    // O estoque não é tocado aqui: só o ajuste, a venda e a devolução mexem nele.
    pub async fn update_product<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        input: &ProductInput,
        images: &[ProductImage],
    ) -> Result<Option<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                category_id = $2,
                name = $3,
                description = $4,
                price = $5,
                purchase_price = $6,
                discount = $7,
                discount_end_time = $8,
                images = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(input.category_id)
        .bind(&input.name)
        .bind(input.description.as_deref())
        .bind(input.price)
        .bind(input.purchase_price)
        .bind(input.discount)
        .bind(input.discount_end_time)
        .bind(Json(images))
        .fetch_optional(executor)
        .await?;
        Ok(product)
    }

    /// Grava o estoque já calculado (o total sempre acompanha os tamanhos).
    pub async fn write_stock<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        stock: i32,
        stock_by_size: Option<&SizeStock>,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            "UPDATE products SET stock = $2, stock_by_size = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(stock)
        .bind(stock_by_size.map(Json))
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn deactivate_product<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE products SET is_active = FALSE, updated_at = NOW() WHERE id = $1 AND is_active = TRUE",
        )
        .bind(id)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn bulk_update<'e, E>(&self, executor: E, input: &BulkUpdateInput) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // $2 = limpar desconto; $3/$4 só valem quando informados
        let result = sqlx::query(
            r#"
            UPDATE products SET
                discount = CASE WHEN $2 THEN NULL ELSE COALESCE($3, discount) END,
                discount_end_time = CASE WHEN $2 THEN NULL ELSE COALESCE($4, discount_end_time) END,
                is_active = COALESCE($5, is_active),
                updated_at = NOW()
            WHERE id = ANY($1)
            "#,
        )
        .bind(&input.product_ids)
        .bind(input.clear_discount)
        .bind(input.discount)
        .bind(input.discount_end_time)
        .bind(input.is_active)
        .execute(executor)
        .await?;
        Ok(result.rows_affected())
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let categories = sqlx::query_as::<_, Category>("SELECT * FROM categories ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(categories)
    }

    pub async fn create_category<'e, E>(
        &self,
        executor: E,
        name: &str,
        description: Option<&str>,
    ) -> Result<Category, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, description) VALUES ($1, $2) RETURNING *",
        )
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await
        .map_err(|e| AppError::from_unique_violation(e, format!("A categoria '{}' já existe.", name)))
    }

    pub async fn delete_category<'e, E>(&self, executor: E, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // =========================================================================
    //  AVALIAÇÕES
    // =========================================================================

    pub async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, AppError> {
        let reviews = sqlx::query_as::<_, Review>(
            "SELECT * FROM reviews WHERE product_id = $1 ORDER BY created_at DESC",
        )
        .bind(product_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reviews)
    }

    pub async fn create_review(
        &self,
        product_id: Uuid,
        user_id: Uuid,
        rating: i16,
        comment: Option<&str>,
    ) -> Result<Review, AppError> {
        sqlx::query_as::<_, Review>(
            r#"
            INSERT INTO reviews (product_id, user_id, rating, comment)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(product_id)
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::from_unique_violation(e, "Você já avaliou este produto."))
    }
}
