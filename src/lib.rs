// src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::{config::AppState, docs::ApiDoc, middleware::auth::session_layer};

pub fn build_router(state: AppState) -> Router {
    // Rotas públicas de autenticação
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .route("/{id}/role", patch(handlers::auth::update_role));

    let product_routes = Router::new()
        .route(
            "/",
            get(handlers::catalog::list_products).post(handlers::catalog::create_product),
        )
        .route("/bulk", patch(handlers::catalog::bulk_update_products))
        .route(
            "/{id}",
            get(handlers::catalog::get_product)
                .put(handlers::catalog::update_product)
                .delete(handlers::catalog::delete_product),
        )
        .route(
            "/{id}/reviews",
            get(handlers::catalog::list_reviews).post(handlers::catalog::create_review),
        )
        .route("/{id}/adjust-stock", post(handlers::inventory::adjust_stock))
        .route("/{id}/movements", get(handlers::inventory::list_movements));

    let category_routes = Router::new()
        .route(
            "/",
            get(handlers::catalog::list_categories).post(handlers::catalog::create_category),
        )
        .route("/{id}", axum::routing::delete(handlers::catalog::delete_category));

    let customer_routes = Router::new()
        .route(
            "/",
            get(handlers::customers::list_customers).post(handlers::customers::create_customer),
        )
        .route(
            "/{id}",
            get(handlers::customers::get_customer)
                .put(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        );

    let sale_routes = Router::new()
        .route(
            "/",
            get(handlers::sales::list_sales).post(handlers::sales::create_sale),
        )
        .route("/mine", get(handlers::sales::list_my_sales))
        .route("/{id}", get(handlers::sales::get_sale))
        .route("/{id}/link-user", patch(handlers::sales::link_user));

    let return_routes = Router::new()
        .route(
            "/",
            get(handlers::returns::list_returns).post(handlers::returns::create_return),
        )
        .route(
            "/{id}",
            get(handlers::returns::get_return).patch(handlers::returns::update_return_status),
        );

    let expense_routes = Router::new()
        .route(
            "/",
            get(handlers::expenses::list_expenses).post(handlers::expenses::create_expense),
        )
        .route(
            "/{id}",
            get(handlers::expenses::get_expense)
                .put(handlers::expenses::update_expense)
                .delete(handlers::expenses::delete_expense),
        );

    let analytics_routes = Router::new()
        .route("/summary", get(handlers::analytics::get_summary))
        .route("/sales-by-day", get(handlers::analytics::get_sales_by_day))
        .route("/top-products", get(handlers::analytics::get_top_products))
        .route("/low-stock", get(handlers::analytics::get_low_stock));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/products", product_routes)
        .nest("/api/categories", category_routes)
        .nest("/api/customers", customer_routes)
        .nest("/api/sales", sale_routes)
        .nest("/api/returns", return_routes)
        .nest("/api/expenses", expense_routes)
        .nest("/api/analytics", analytics_routes)
        .route("/api/reports/financial", get(handlers::analytics::get_financial_report))
        .route(
            "/api/settings",
            get(handlers::settings::get_settings).put(handlers::settings::update_settings),
        )
        .route("/api/activity-logs", get(handlers::settings::list_activity_logs))
        .layer(axum_middleware::from_fn_with_state(state.clone(), session_layer))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
