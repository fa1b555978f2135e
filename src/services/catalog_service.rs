// src/services/catalog_service.rs

use chrono::{DateTime, Utc};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{ActivityRepository, CatalogRepository},
    models::{
        activity::NewActivity,
        auth::CurrentUser,
        catalog::{
            BulkUpdateInput, Category, CategoryInput, Product, ProductFilter, ProductImage,
            ProductInput, ProductView, Review, ReviewInput, SizeStock,
        },
    },
    services::pricing,
};

/// Garante exatamente uma imagem principal. Sem marcação, a primeira vira principal.
pub fn normalize_images(mut images: Vec<ProductImage>) -> Result<Vec<ProductImage>, AppError> {
    if images.iter().any(|img| img.url.trim().is_empty()) {
        return Err(AppError::BadRequest("A URL da imagem não pode ser vazia.".into()));
    }

    match images.iter().filter(|img| img.is_primary).count() {
        0 => {
            if let Some(first) = images.first_mut() {
                first.is_primary = true;
            }
        }
        1 => {}
        _ => {
            return Err(AppError::BadRequest(
                "Apenas uma imagem pode ser a principal.".into(),
            ))
        }
    }

    Ok(images)
}

/// Com grade de tamanhos, o estoque total é a soma dela; sem grade, vale o informado.
pub fn derive_stock(stock: i32, stock_by_size: Option<&SizeStock>) -> Result<i32, AppError> {
    let Some(sizes) = stock_by_size.filter(|s| !s.is_empty()) else {
        return Ok(stock);
    };

    let mut total: i32 = 0;
    for (size, qty) in sizes {
        if size.trim().is_empty() {
            return Err(AppError::BadRequest("O nome do tamanho não pode ser vazio.".into()));
        }
        if *qty < 0 {
            return Err(AppError::BadRequest(format!(
                "O estoque do tamanho '{}' não pode ser negativo.",
                size
            )));
        }
        total = total
            .checked_add(*qty)
            .ok_or_else(|| AppError::BadRequest("Estoque total excede o limite.".into()))?;
    }
    Ok(total)
}

/// No PUT o estoque não pode vir junto: só ajuste, venda e devolução mexem nele.
pub fn reject_stock_fields(input: &ProductInput) -> Result<(), AppError> {
    if input.stock.is_some() || input.stock_by_size.is_some() {
        return Err(AppError::BadRequest(
            "O estoque não é alterado pela edição do produto; use POST /api/products/{id}/adjust-stock.".into(),
        ));
    }
    Ok(())
}

pub fn product_view(product: Product, now: DateTime<Utc>) -> ProductView {
    let discount_active =
        pricing::is_discount_active(product.discount, product.discount_end_time, now);
    let effective_price = pricing::effective_price(&product, now);
    ProductView {
        product,
        discount_active,
        effective_price,
    }
}

#[derive(Clone)]
pub struct CatalogService {
    pool: PgPool,
    catalog_repo: CatalogRepository,
    activity_repo: ActivityRepository,
}

impl CatalogService {
    pub fn new(pool: PgPool, catalog_repo: CatalogRepository, activity_repo: ActivityRepository) -> Self {
        Self {
            pool,
            catalog_repo,
            activity_repo,
        }
    }

    // =========================================================================
    //  VITRINE
    // =========================================================================

    pub async fn list_products(
        &self,
        filter: &ProductFilter,
        page: &PageParams,
    ) -> Result<Paginated<ProductView>, AppError> {
        let now = Utc::now();
        let (products, total) = self.catalog_repo.list_products(filter, page, now).await?;
        let views = products.into_iter().map(|p| product_view(p, now)).collect();
        Ok(Paginated::new(views, page, total))
    }

    // Produto inativo some da vitrine
    pub async fn get_product(&self, id: Uuid) -> Result<ProductView, AppError> {
        let product = self.find_product(id).await?;
        if !product.is_active {
            return Err(AppError::NotFound("Produto não encontrado.".into()));
        }
        Ok(product_view(product, Utc::now()))
    }

    async fn find_product(&self, id: Uuid) -> Result<Product, AppError> {
        self.catalog_repo
            .get_product(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto não encontrado.".into()))
    }

    // =========================================================================
    //  GESTÃO DE PRODUTOS
    // =========================================================================

    pub async fn create_product(&self, actor: &CurrentUser, input: ProductInput) -> Result<Product, AppError> {
        let stock = derive_stock(input.stock.unwrap_or(0), input.stock_by_size.as_ref())?;
        let images = normalize_images(input.images.clone())?;

        let mut tx = self.pool.begin().await?;

        let product = self
            .catalog_repo
            .insert_product(&mut *tx, &input, stock, &images)
            .await?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "product.created", "product", product.id)
                    .with_changes(json!({ "name": product.name, "price": product.price, "stock": stock })),
            )
            .await?;

        tx.commit().await?;

        tracing::info!(product_id = %product.id, "Produto criado");
        Ok(product)
    }

    pub async fn update_product(
        &self,
        actor: &CurrentUser,
        id: Uuid,
        input: ProductInput,
    ) -> Result<Product, AppError> {
        reject_stock_fields(&input)?;
        let images = normalize_images(input.images.clone())?;

        let mut tx = self.pool.begin().await?;

        let before = self
            .catalog_repo
            .get_product_for_update(&mut *tx, id)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto não encontrado.".into()))?;

        let product = self
            .catalog_repo
            .update_product(&mut *tx, id, &input, &images)
            .await?
            .ok_or_else(|| AppError::NotFound("Produto não encontrado.".into()))?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "product.updated", "product", id).with_changes(json!({
                    "before": { "price": before.price, "discount": before.discount },
                    "after": { "price": product.price, "discount": product.discount },
                })),
            )
            .await?;

        tx.commit().await?;
        Ok(product)
    }

    pub async fn deactivate_product(&self, actor: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.catalog_repo.deactivate_product(&mut *tx, id).await? {
            return Err(AppError::NotFound("Produto não encontrado.".into()));
        }

        self.activity_repo
            .record(&mut *tx, NewActivity::by(actor, "product.deactivated", "product", id))
            .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn bulk_update(&self, actor: &CurrentUser, input: &BulkUpdateInput) -> Result<u64, AppError> {
        if input.clear_discount && (input.discount.is_some() || input.discount_end_time.is_some()) {
            return Err(AppError::BadRequest(
                "Não é possível limpar e definir o desconto ao mesmo tempo.".into(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        let updated = self.catalog_repo.bulk_update(&mut *tx, input).await?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity {
                    actor_id: Some(actor.id),
                    actor_email: Some(actor.email.clone()),
                    action: "product.bulk_updated",
                    entity_type: "product",
                    entity_id: None,
                    changes: Some(json!({
                        "productIds": input.product_ids,
                        "discount": input.discount,
                        "clearDiscount": input.clear_discount,
                        "isActive": input.is_active,
                    })),
                },
            )
            .await?;

        tx.commit().await?;

        tracing::info!(updated, "Atualização em massa de produtos");
        Ok(updated)
    }

    // =========================================================================
    //  CATEGORIAS
    // =========================================================================

    pub async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        self.catalog_repo.list_categories().await
    }

    pub async fn create_category(&self, actor: &CurrentUser, input: &CategoryInput) -> Result<Category, AppError> {
        let mut tx = self.pool.begin().await?;

        let category = self
            .catalog_repo
            .create_category(&mut *tx, input.name.trim(), input.description.as_deref())
            .await?;

        self.activity_repo
            .record(&mut *tx, NewActivity::by(actor, "category.created", "category", category.id))
            .await?;

        tx.commit().await?;
        Ok(category)
    }

    pub async fn delete_category(&self, actor: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.catalog_repo.delete_category(&mut *tx, id).await? {
            return Err(AppError::NotFound("Categoria não encontrada.".into()));
        }

        self.activity_repo
            .record(&mut *tx, NewActivity::by(actor, "category.deleted", "category", id))
            .await?;

        tx.commit().await?;
        Ok(())
    }

    // =========================================================================
    //  AVALIAÇÕES
    // =========================================================================

    pub async fn list_reviews(&self, product_id: Uuid) -> Result<Vec<Review>, AppError> {
        self.find_product(product_id).await?;
        self.catalog_repo.list_reviews(product_id).await
    }

    pub async fn create_review(
        &self,
        actor: &CurrentUser,
        product_id: Uuid,
        input: &ReviewInput,
    ) -> Result<Review, AppError> {
        let product = self.find_product(product_id).await?;
        if !product.is_active {
            return Err(AppError::NotFound("Produto não encontrado.".into()));
        }

        self.catalog_repo
            .create_review(product_id, actor.id, input.rating, input.comment.as_deref())
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::pricing::tests::{d, product};
    use chrono::Duration;

    fn img(url: &str, is_primary: bool) -> ProductImage {
        ProductImage {
            url: url.into(),
            is_primary,
        }
    }

    #[test]
    fn first_image_becomes_primary_when_none_flagged() {
        let images = normalize_images(vec![img("a.jpg", false), img("b.jpg", false)]).unwrap();
        assert!(images[0].is_primary);
        assert!(!images[1].is_primary);
    }

    #[test]
    fn flagged_primary_is_kept_in_place() {
        let images = normalize_images(vec![img("a.jpg", false), img("b.jpg", true)]).unwrap();
        assert_eq!(images.iter().filter(|i| i.is_primary).count(), 1);
        assert!(images[1].is_primary);
    }

    #[test]
    fn two_primaries_or_blank_url_are_rejected() {
        assert!(normalize_images(vec![img("a.jpg", true), img("b.jpg", true)]).is_err());
        assert!(normalize_images(vec![img("  ", false)]).is_err());
        assert!(normalize_images(vec![]).unwrap().is_empty());
    }

    #[test]
    fn stock_is_sum_of_sizes() {
        let sizes: SizeStock = [("P".to_string(), 2), ("M".to_string(), 5), ("G".to_string(), 0)].into();
        // O escalar informado é ignorado quando há grade
        assert_eq!(derive_stock(99, Some(&sizes)).unwrap(), 7);
        assert_eq!(derive_stock(4, None).unwrap(), 4);
        assert_eq!(derive_stock(4, Some(&SizeStock::new())).unwrap(), 4);
    }

    #[test]
    fn negative_size_bucket_is_rejected() {
        let sizes: SizeStock = [("P".to_string(), -1)].into();
        assert!(matches!(derive_stock(0, Some(&sizes)), Err(AppError::BadRequest(_))));
    }

    fn edit_input() -> ProductInput {
        ProductInput {
            name: "Camiseta".into(),
            description: None,
            category_id: None,
            price: d("50"),
            purchase_price: None,
            stock: None,
            stock_by_size: None,
            discount: None,
            discount_end_time: None,
            images: vec![],
        }
    }

    #[test]
    fn edit_without_stock_fields_is_accepted() {
        assert!(reject_stock_fields(&edit_input()).is_ok());
    }

    #[test]
    fn edit_carrying_stock_points_to_adjustment() {
        let with_stock = ProductInput { stock: Some(0), ..edit_input() };
        let err = reject_stock_fields(&with_stock).unwrap_err();
        assert!(matches!(&err, AppError::BadRequest(msg) if msg.contains("adjust-stock")));

        let with_sizes = ProductInput {
            stock_by_size: Some([("M".to_string(), 3)].into()),
            ..edit_input()
        };
        assert!(matches!(reject_stock_fields(&with_sizes), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn view_reports_active_discount_and_price() {
        let now = Utc::now();
        let active = product_view(product("200", Some("25"), Some(now + Duration::days(1))), now);
        assert!(active.discount_active);
        assert_eq!(active.effective_price, d("150"));

        let expired = product_view(product("200", Some("25"), Some(now - Duration::days(1))), now);
        assert!(!expired.discount_active);
        assert_eq!(expired.effective_price, d("200"));
    }
}
