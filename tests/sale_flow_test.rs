//! Fluxo completo da venda contra um Postgres real.

mod common;

use chrono::{Datelike, Utc};
use common::{dec, seed_product, seed_user, TestApp};
use vitrine_backend::{
    common::error::AppError,
    models::{
        auth::UserRole,
        sale::{CreateSalePayload, SaleLineInput},
    },
};

fn cart(product_id: uuid::Uuid, quantity: i32, cash: &str) -> CreateSalePayload {
    CreateSalePayload {
        items: vec![SaleLineInput { product_id, quantity, size: None }],
        customer_name: None,
        customer_phone: None,
        customer_email: None,
        tax: None,
        cash_received: Some(dec(cash)),
    }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn sale_applies_discount_change_and_stock() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Tênis", dec("1000"), 5, Some(dec("10"))).await;

    let detail = app
        .state
        .sale_service
        .create_sale(&app.staff, &cart(product, 2, "2000"))
        .await
        .expect("sale should succeed");

    assert_eq!(detail.sale.subtotal, dec("1800.00"));
    assert_eq!(detail.sale.discount_amount, dec("200.00"));
    assert_eq!(detail.sale.total, dec("1800.00"));
    assert_eq!(detail.sale.change_given, dec("200.00"));
    assert_eq!(detail.items.len(), 1);
    assert_eq!(detail.items[0].final_price, dec("900.00"));
    assert_eq!(app.stock_of(product).await, 3);
    assert_eq!(app.count("stock_movements").await, 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn insufficient_stock_leaves_no_trace() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Boné", dec("50"), 1, None).await;

    let err = app
        .state
        .sale_service
        .create_sale(&app.staff, &cart(product, 2, "100"))
        .await
        .expect_err("sale should fail");

    assert!(matches!(err, AppError::InsufficientStock { .. }));
    assert_eq!(app.stock_of(product).await, 1);
    assert_eq!(app.count("sales").await, 0);
    assert_eq!(app.count("stock_movements").await, 0);
    assert_eq!(app.count("document_counters").await, 0);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn insufficient_cash_is_rejected() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Meia", dec("20"), 10, None).await;

    let err = app
        .state
        .sale_service
        .create_sale(&app.staff, &cart(product, 2, "39.99"))
        .await
        .expect_err("sale should fail");

    assert!(matches!(err, AppError::InsufficientCash { .. }));
    assert_eq!(app.stock_of(product).await, 10);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn sale_numbers_follow_the_year_sequence() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Camiseta", dec("30"), 10, None).await;
    let year = Utc::now().year();

    let first = app.state.sale_service.create_sale(&app.staff, &cart(product, 1, "30")).await.unwrap();
    let second = app.state.sale_service.create_sale(&app.staff, &cart(product, 1, "30")).await.unwrap();

    assert_eq!(first.sale.sale_number, format!("SALE-{year}-0001"));
    assert_eq!(second.sale.sale_number, format!("SALE-{year}-0002"));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn last_unit_is_sold_only_once() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Jaqueta", dec("300"), 1, None).await;

    let first = cart(product, 1, "300");
    let second = cart(product, 1, "300");
    let (a, b) = tokio::join!(
        app.state.sale_service.create_sale(&app.staff, &first),
        app.state.sale_service.create_sale(&app.staff, &second),
    );

    let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
    assert_eq!(successes, 1);
    assert_eq!(app.stock_of(product).await, 0);
    assert_eq!(app.count("sales").await, 1);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn sale_links_the_account_with_the_same_email() {
    let app = TestApp::spawn().await;
    let buyer = seed_user(&app.pool, "cliente@exemplo.com", Some("11999990000"), UserRole::Customer).await;
    let product = seed_product(&app.pool, "Bolsa", dec("120"), 3, None).await;

    let mut payload = cart(product, 1, "120");
    payload.customer_name = Some("Maria".into());
    payload.customer_phone = Some("11999990000".into());
    payload.customer_email = Some("cliente@exemplo.com".into());

    let detail = app.state.sale_service.create_sale(&app.staff, &payload).await.unwrap();

    assert_eq!(detail.sale.user_id, Some(buyer.id));
    assert!(detail.sale.customer_id.is_some());
    assert_eq!(app.count("customers").await, 1);
}
