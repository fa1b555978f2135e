// src/config.rs

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::{env, time::Duration};

use crate::{
    db::{
        ActivityRepository, CatalogRepository, CounterRepository, CustomerRepository,
        ExpenseRepository, InventoryRepository, ReturnRepository, SaleRepository,
        SettingsRepository, UserRepository,
    },
    services::{
        analytics_service::AnalyticsService, auth::AuthService, catalog_service::CatalogService,
        customer_service::CustomerService, expense_service::ExpenseService,
        inventory_service::InventoryService, return_service::ReturnService,
        sale_service::SaleService,
    },
};

// Configuração lida do ambiente (.env em desenvolvimento)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub bind_addr: String,
    pub db_max_connections: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let jwt_ttl_hours = env::var("JWT_TTL_HOURS")
            .ok()
            .map(|v| v.parse::<i64>())
            .transpose()
            .context("JWT_TTL_HOURS deve ser um número inteiro")?
            .unwrap_or(24 * 7);

        let db_max_connections = env::var("DB_MAX_CONNECTIONS")
            .ok()
            .map(|v| v.parse::<u32>())
            .transpose()
            .context("DB_MAX_CONNECTIONS deve ser um número inteiro")?
            .unwrap_or(5);

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        Ok(Self {
            database_url,
            jwt_secret,
            jwt_ttl_hours,
            bind_addr,
            db_max_connections,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub inventory_service: InventoryService,
    pub customer_service: CustomerService,
    pub sale_service: SaleService,
    pub return_service: ReturnService,
    pub expense_service: ExpenseService,
    pub analytics_service: AnalyticsService,
    pub activity_repo: ActivityRepository,
    pub settings_repo: SettingsRepository,
}

impl AppState {
    pub async fn new(config: &Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::from_pool(db_pool, config))
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(db_pool: PgPool, config: &Config) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let catalog_repo = CatalogRepository::new(db_pool.clone());
        let inventory_repo = InventoryRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new(db_pool.clone());
        let sale_repo = SaleRepository::new(db_pool.clone());
        let return_repo = ReturnRepository::new(db_pool.clone());
        let expense_repo = ExpenseRepository::new(db_pool.clone());
        let counter_repo = CounterRepository::new();
        let activity_repo = ActivityRepository::new(db_pool.clone());
        let settings_repo = SettingsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_hours,
        );
        let catalog_service = CatalogService::new(
            db_pool.clone(),
            catalog_repo.clone(),
            activity_repo.clone(),
        );
        let inventory_service = InventoryService::new(
            db_pool.clone(),
            catalog_repo.clone(),
            inventory_repo.clone(),
            activity_repo.clone(),
        );
        let customer_service = CustomerService::new(
            db_pool.clone(),
            customer_repo.clone(),
            activity_repo.clone(),
        );
        let sale_service = SaleService::new(
            db_pool.clone(),
            sale_repo.clone(),
            customer_repo,
            user_repo,
            counter_repo.clone(),
            settings_repo.clone(),
            inventory_service.clone(),
            activity_repo.clone(),
        );
        let return_service = ReturnService::new(
            db_pool.clone(),
            return_repo.clone(),
            sale_repo.clone(),
            counter_repo.clone(),
            inventory_service.clone(),
            activity_repo.clone(),
        );
        let expense_service = ExpenseService::new(
            db_pool.clone(),
            expense_repo.clone(),
            counter_repo,
            activity_repo.clone(),
        );
        let analytics_service = AnalyticsService::new(sale_repo, return_repo, expense_repo, catalog_repo);

        Self {
            db_pool,
            auth_service,
            catalog_service,
            inventory_service,
            customer_service,
            sale_service,
            return_service,
            expense_service,
            analytics_service,
            activity_repo,
            settings_repo,
        }
    }
}
