//! Utilitários compartilhados pelos testes de integração.
//!
//! Os testes que tocam o banco exigem `TEST_DATABASE_URL` apontando para um
//! Postgres descartável e rodam com `cargo test -- --ignored`.

#![allow(dead_code)]

use rust_decimal::Decimal;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use vitrine_backend::{
    config::{AppState, Config},
    models::{
        auth::{CurrentUser, UserRole},
        catalog::SizeStock,
    },
};

pub const TEST_JWT_SECRET: &str = "segredo-de-teste";

// Os testes de um mesmo binário compartilham o banco: um de cada vez.
static DB_LOCK: Mutex<()> = Mutex::const_new(());

pub fn test_config(database_url: &str) -> Config {
    Config {
        database_url: database_url.to_string(),
        jwt_secret: TEST_JWT_SECRET.to_string(),
        jwt_ttl_hours: 1,
        bind_addr: "127.0.0.1:0".to_string(),
        db_max_connections: 10,
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn,vitrine_backend=debug")
        .with_test_writer()
        .try_init();
}

pub struct TestApp {
    pub pool: PgPool,
    pub state: AppState,
    pub staff: CurrentUser,
    _guard: MutexGuard<'static, ()>,
}

impl TestApp {
    /// Banco migrado, tabelas zeradas e um funcionário cadastrado.
    pub async fn spawn() -> Self {
        init_tracing();
        let guard = DB_LOCK.lock().await;

        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set");
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(&url)
            .await
            .expect("Failed to connect to test database");

        sqlx::migrate!().run(&pool).await.expect("Failed to run migrations");

        sqlx::query(
            r#"
            TRUNCATE return_items, returns, sale_items, sales, stock_movements, expenses,
                     activity_logs, document_counters, customers, reviews, products,
                     categories, users
            CASCADE
            "#,
        )
        .execute(&pool)
        .await
        .expect("Failed to reset tables");

        sqlx::query("UPDATE store_settings SET default_tax_rate = 0, loyalty_points_per_unit = 0.01 WHERE id = 1")
            .execute(&pool)
            .await
            .expect("Failed to reset settings");

        let state = AppState::from_pool(pool.clone(), &test_config(&url));
        let staff = seed_user(&pool, "caixa@loja.com", None, UserRole::Staff).await;

        Self { pool, state, staff, _guard: guard }
    }

    pub async fn stock_of(&self, product_id: Uuid) -> i32 {
        sqlx::query_scalar::<_, i32>("SELECT stock FROM products WHERE id = $1")
            .bind(product_id)
            .fetch_one(&self.pool)
            .await
            .expect("Failed to read stock")
    }

    pub async fn count(&self, table: &str) -> i64 {
        sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {table}"))
            .fetch_one(&self.pool)
            .await
            .expect("Failed to count rows")
    }
}

pub async fn seed_user(pool: &PgPool, email: &str, phone: Option<&str>, role: UserRole) -> CurrentUser {
    let id = sqlx::query_scalar::<_, Uuid>(
        "INSERT INTO users (email, phone, password_hash, role) VALUES ($1, $2, 'x', $3) RETURNING id",
    )
    .bind(email)
    .bind(phone)
    .bind(role)
    .fetch_one(pool)
    .await
    .expect("Failed to seed user");

    CurrentUser { id, email: email.to_string(), role }
}

pub async fn seed_product(pool: &PgPool, name: &str, price: Decimal, stock: i32, discount: Option<Decimal>) -> Uuid {
    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO products (name, price, purchase_price, stock, discount)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(price)
    .bind(price / Decimal::TWO)
    .bind(stock)
    .bind(discount)
    .fetch_one(pool)
    .await
    .expect("Failed to seed product")
}

/// Produto com grade: o estoque escalar é a soma dos tamanhos.
pub async fn seed_sized_product(pool: &PgPool, name: &str, price: Decimal, sizes: &[(&str, i32)]) -> Uuid {
    let sizes: SizeStock = sizes.iter().map(|(size, qty)| (size.to_string(), *qty)).collect();
    let stock: i32 = sizes.values().sum();

    sqlx::query_scalar::<_, Uuid>(
        r#"
        INSERT INTO products (name, price, purchase_price, stock, stock_by_size)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(name)
    .bind(price)
    .bind(price / Decimal::TWO)
    .bind(stock)
    .bind(sqlx::types::Json(&sizes))
    .fetch_one(pool)
    .await
    .expect("Failed to seed sized product")
}

pub async fn sizes_of(pool: &PgPool, product_id: Uuid) -> SizeStock {
    sqlx::query_scalar::<_, sqlx::types::Json<SizeStock>>("SELECT stock_by_size FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_one(pool)
        .await
        .expect("Failed to read size stock")
        .0
}

pub async fn movements_with_reason(pool: &PgPool, product_id: Uuid, reason: &str) -> Vec<(Option<String>, i32)> {
    sqlx::query_as::<_, (Option<String>, i32)>(
        r#"
        SELECT size, quantity_change FROM stock_movements
        WHERE product_id = $1 AND reason::text = $2
        ORDER BY created_at
        "#,
    )
    .bind(product_id)
    .bind(reason)
    .fetch_all(pool)
    .await
    .expect("Failed to read stock movements")
}

pub fn dec(value: &str) -> Decimal {
    value.parse().expect("invalid decimal literal")
}
