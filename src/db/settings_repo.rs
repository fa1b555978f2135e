// src/db/settings_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use crate::{
    common::error::AppError,
    models::settings::{StoreSettings, UpdateSettingsRequest},
};

#[derive(Clone)]
pub struct SettingsRepository {
    pool: PgPool,
}

impl SettingsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // A linha única é criada pela migração inicial
    pub async fn get_settings<'e, E>(&self, executor: E) -> Result<StoreSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, StoreSettings>(
            r#"
            SELECT store_name, currency, default_tax_rate, loyalty_points_per_unit,
                   low_stock_threshold, updated_at
            FROM store_settings WHERE id = 1
            "#,
        )
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }

    pub async fn current(&self) -> Result<StoreSettings, AppError> {
        self.get_settings(&self.pool).await
    }

    pub async fn update_settings<'e, E>(&self, executor: E, input: &UpdateSettingsRequest) -> Result<StoreSettings, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let settings = sqlx::query_as::<_, StoreSettings>(
            r#"
            UPDATE store_settings SET
                store_name = COALESCE($1, store_name),
                currency = COALESCE($2, currency),
                default_tax_rate = COALESCE($3, default_tax_rate),
                loyalty_points_per_unit = COALESCE($4, loyalty_points_per_unit),
                low_stock_threshold = COALESCE($5, low_stock_threshold),
                updated_at = NOW()
            WHERE id = 1
            RETURNING store_name, currency, default_tax_rate, loyalty_points_per_unit,
                      low_stock_threshold, updated_at
            "#,
        )
        .bind(input.store_name.as_deref())
        .bind(input.currency.as_deref())
        .bind(input.default_tax_rate)
        .bind(input.loyalty_points_per_unit)
        .bind(input.low_stock_threshold)
        .fetch_one(executor)
        .await?;

        Ok(settings)
    }
}
