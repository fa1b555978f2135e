//! Ajuste manual de estoque e baixa por tamanho contra um Postgres real.

mod common;

use common::{dec, movements_with_reason, seed_product, seed_sized_product, sizes_of, TestApp};
use vitrine_backend::{
    common::error::AppError,
    models::{
        inventory::AdjustStockPayload,
        sale::{CreateSalePayload, SaleLineInput},
    },
};

fn adjustment(quantity_change: i32, size: Option<&str>, reason: &str) -> AdjustStockPayload {
    AdjustStockPayload {
        quantity_change,
        size: size.map(str::to_string),
        reason: reason.to_string(),
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn adjustments_change_stock_and_append_movements() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Meia", dec("20"), 4, None).await;
    let inventory = &app.state.inventory_service;

    let updated = inventory
        .adjust_stock(&app.staff, product, &adjustment(6, None, "Reposição do fornecedor"))
        .await
        .expect("entrada deve passar");
    assert_eq!(updated.stock, 10);

    inventory
        .adjust_stock(&app.staff, product, &adjustment(-3, None, "  Peças avariadas  "))
        .await
        .expect("saída deve passar");
    assert_eq!(app.stock_of(product).await, 7);

    let movements = movements_with_reason(&app.pool, product, "adjustment").await;
    assert_eq!(movements, vec![(None, 6), (None, -3)]);

    let notes = sqlx::query_scalar::<_, Option<String>>(
        "SELECT notes FROM stock_movements WHERE product_id = $1 AND quantity_change = -3",
    )
    .bind(product)
    .fetch_one(&app.pool)
    .await
    .unwrap();
    assert_eq!(notes.as_deref(), Some("Peças avariadas"));
    assert_eq!(app.count("activity_logs").await, 2);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn zero_delta_is_rejected() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Meia", dec("20"), 4, None).await;

    let err = app
        .state
        .inventory_service
        .adjust_stock(&app.staff, product, &adjustment(0, None, "Conferência"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    assert_eq!(app.count("stock_movements").await, 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn blank_reason_is_rejected() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Meia", dec("20"), 4, None).await;

    let err = app
        .state
        .inventory_service
        .adjust_stock(&app.staff, product, &adjustment(2, None, "   "))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    assert_eq!(app.stock_of(product).await, 4);
    assert_eq!(app.count("stock_movements").await, 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn unknown_size_is_rejected_without_writing() {
    let app = TestApp::spawn().await;
    let product = seed_sized_product(&app.pool, "Camiseta", dec("50"), &[("P", 2), ("M", 3)]).await;

    let err = app
        .state
        .inventory_service
        .adjust_stock(&app.staff, product, &adjustment(1, Some("GG"), "Achado no depósito"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    assert_eq!(app.stock_of(product).await, 5);
    assert_eq!(sizes_of(&app.pool, product).await.get("GG"), None);
    assert_eq!(app.count("stock_movements").await, 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn adjustment_below_zero_writes_nothing() {
    let app = TestApp::spawn().await;
    let product = seed_sized_product(&app.pool, "Camiseta", dec("50"), &[("P", 2), ("M", 3)]).await;

    let err = app
        .state
        .inventory_service
        .adjust_stock(&app.staff, product, &adjustment(-3, Some("P"), "Furto"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InsufficientStock { .. }), "{err:?}");
    assert_eq!(app.stock_of(product).await, 5);
    assert_eq!(sizes_of(&app.pool, product).await.get("P"), Some(&2));
    assert_eq!(app.count("stock_movements").await, 0);
    assert_eq!(app.count("activity_logs").await, 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn sized_adjustment_recomputes_total() {
    let app = TestApp::spawn().await;
    let product = seed_sized_product(&app.pool, "Camiseta", dec("50"), &[("P", 2), ("M", 3)]).await;

    let updated = app
        .state
        .inventory_service
        .adjust_stock(&app.staff, product, &adjustment(4, Some("P"), "Reposição"))
        .await
        .expect("ajuste por tamanho deve passar");

    assert_eq!(updated.stock, 9);
    assert_eq!(sizes_of(&app.pool, product).await.get("P"), Some(&6));
    assert_eq!(app.stock_of(product).await, 9);
    assert_eq!(
        movements_with_reason(&app.pool, product, "adjustment").await,
        vec![(Some("P".to_string()), 4)]
    );
}

fn sized_cart(product_id: uuid::Uuid, quantity: i32, size: Option<&str>) -> CreateSalePayload {
    CreateSalePayload {
        items: vec![SaleLineInput {
            product_id,
            quantity,
            size: size.map(str::to_string),
        }],
        customer_name: None,
        customer_phone: None,
        customer_email: None,
        tax: None,
        cash_received: Some(dec("1000")),
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn sale_of_sized_product_decrements_bucket_and_total() {
    let app = TestApp::spawn().await;
    let product = seed_sized_product(&app.pool, "Camiseta", dec("50"), &[("P", 2), ("M", 3)]).await;

    app.state
        .sale_service
        .create_sale(&app.staff, &sized_cart(product, 2, Some("M")))
        .await
        .expect("venda por tamanho deve passar");

    let sizes = sizes_of(&app.pool, product).await;
    assert_eq!(sizes.get("M"), Some(&1));
    assert_eq!(sizes.get("P"), Some(&2));
    assert_eq!(app.stock_of(product).await, 3);
    assert_eq!(
        movements_with_reason(&app.pool, product, "sale").await,
        vec![(Some("M".to_string()), -2)]
    );
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn sale_of_sized_product_needs_a_size() {
    let app = TestApp::spawn().await;
    let product = seed_sized_product(&app.pool, "Camiseta", dec("50"), &[("P", 2), ("M", 3)]).await;

    let err = app
        .state
        .sale_service
        .create_sale(&app.staff, &sized_cart(product, 1, None))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::BadRequest(_)), "{err:?}");
    assert_eq!(app.stock_of(product).await, 5);
    assert_eq!(app.count("sales").await, 0);
}
