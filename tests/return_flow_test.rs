//! Devoluções: criação, aprovação e a guarda de idempotência do estoque.

mod common;

use common::{dec, seed_product, TestApp};
use vitrine_backend::{
    common::error::AppError,
    models::{
        returns::{CreateReturnPayload, ReturnLineInput, ReturnStatus, UpdateReturnStatusPayload},
        sale::{CreateSalePayload, SaleLineInput},
    },
};

async fn sell(app: &TestApp, product_id: uuid::Uuid, quantity: i32) -> uuid::Uuid {
    let payload = CreateSalePayload {
        items: vec![SaleLineInput { product_id, quantity, size: None }],
        customer_name: None,
        customer_phone: None,
        customer_email: None,
        tax: None,
        cash_received: Some(dec("10000")),
    };
    app.state.sale_service.create_sale(&app.staff, &payload).await.unwrap().sale.id
}

fn return_of(sale_id: uuid::Uuid, product_id: uuid::Uuid, quantity: i32) -> CreateReturnPayload {
    CreateReturnPayload {
        sale_id,
        items: vec![ReturnLineInput { product_id, size: None, quantity, reason: None }],
        reason: Some("Defeito".into()),
        notes: None,
    }
}

fn status(status: ReturnStatus) -> UpdateReturnStatusPayload {
    UpdateReturnStatusPayload { status, notes: None }
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn approving_twice_restores_stock_once() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Calça", dec("200"), 5, None).await;
    let sale_id = sell(&app, product, 2).await;
    assert_eq!(app.stock_of(product).await, 3);

    let created = app
        .state
        .return_service
        .create_return(&app.staff, &return_of(sale_id, product, 1))
        .await
        .unwrap();
    assert_eq!(created.header.status, ReturnStatus::Pending);
    assert_eq!(created.header.total_refund, dec("200.00"));
    // Pendente não mexe no estoque
    assert_eq!(app.stock_of(product).await, 3);

    let approved = app
        .state
        .return_service
        .update_status(&app.staff, created.header.id, &status(ReturnStatus::Approved))
        .await
        .unwrap();
    assert!(approved.header.stock_restored);
    assert_eq!(app.stock_of(product).await, 4);

    app.state
        .return_service
        .update_status(&app.staff, created.header.id, &status(ReturnStatus::Approved))
        .await
        .unwrap();
    assert_eq!(app.stock_of(product).await, 4);
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn cannot_return_more_than_was_sold() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Cinto", dec("80"), 5, None).await;
    let sale_id = sell(&app, product, 2).await;

    app.state
        .return_service
        .create_return(&app.staff, &return_of(sale_id, product, 2))
        .await
        .unwrap();

    let err = app
        .state
        .return_service
        .create_return(&app.staff, &return_of(sale_id, product, 1))
        .await
        .expect_err("nothing left to return");
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
#[ignore = "requires TEST_DATABASE_URL"]
async fn rejected_return_frees_the_quantity_again() {
    let app = TestApp::spawn().await;
    let product = seed_product(&app.pool, "Luva", dec("40"), 5, None).await;
    let sale_id = sell(&app, product, 1).await;

    let first = app
        .state
        .return_service
        .create_return(&app.staff, &return_of(sale_id, product, 1))
        .await
        .unwrap();
    app.state
        .return_service
        .update_status(&app.staff, first.header.id, &status(ReturnStatus::Rejected))
        .await
        .unwrap();

    // Rejeitada não conta como devolvida
    app.state
        .return_service
        .create_return(&app.staff, &return_of(sale_id, product, 1))
        .await
        .unwrap();

    // E não pode voltar a ser aprovada
    let err = app
        .state
        .return_service
        .update_status(&app.staff, first.header.id, &status(ReturnStatus::Approved))
        .await
        .expect_err("rejected is final");
    assert!(matches!(err, AppError::BadRequest(_)));
    assert_eq!(app.stock_of(product).await, 4);
}
