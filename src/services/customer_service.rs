// src/services/customer_service.rs

use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{
        error::AppError,
        pagination::{PageParams, Paginated},
    },
    db::{ActivityRepository, CustomerRepository},
    models::{
        activity::NewActivity,
        auth::CurrentUser,
        customer::{Customer, CustomerInput},
    },
};

#[derive(Debug, Default, Deserialize)]
pub struct CustomerSearch {
    pub q: Option<String>,
}

#[derive(Clone)]
pub struct CustomerService {
    pool: PgPool,
    customer_repo: CustomerRepository,
    activity_repo: ActivityRepository,
}

impl CustomerService {
    pub fn new(pool: PgPool, customer_repo: CustomerRepository, activity_repo: ActivityRepository) -> Self {
        Self {
            pool,
            customer_repo,
            activity_repo,
        }
    }

    pub async fn list_customers(
        &self,
        search: &CustomerSearch,
        page: &PageParams,
    ) -> Result<Paginated<Customer>, AppError> {
        let q = search.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
        let (customers, total) = self.customer_repo.list_customers(q, page).await?;
        Ok(Paginated::new(customers, page, total))
    }

    pub async fn get_customer(&self, id: Uuid) -> Result<Customer, AppError> {
        self.customer_repo
            .get_customer(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Cliente não encontrado.".into()))
    }

    pub async fn create_customer(&self, actor: &CurrentUser, input: &CustomerInput) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = self.customer_repo.create_customer(&mut *tx, input).await?;

        self.activity_repo
            .record(
                &mut *tx,
                NewActivity::by(actor, "customer.created", "customer", customer.id)
                    .with_changes(json!({ "name": customer.name, "phone": customer.phone })),
            )
            .await?;

        tx.commit().await?;
        Ok(customer)
    }

    // Os acumulados (gasto, compras, pontos) só mudam pelas vendas
    pub async fn update_customer(
        &self,
        actor: &CurrentUser,
        id: Uuid,
        input: &CustomerInput,
    ) -> Result<Customer, AppError> {
        let mut tx = self.pool.begin().await?;

        let customer = self
            .customer_repo
            .update_customer(&mut *tx, id, input)
            .await?
            .ok_or_else(|| AppError::NotFound("Cliente não encontrado.".into()))?;

        self.activity_repo
            .record(&mut *tx, NewActivity::by(actor, "customer.updated", "customer", id))
            .await?;

        tx.commit().await?;
        Ok(customer)
    }

    pub async fn delete_customer(&self, actor: &CurrentUser, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        if !self.customer_repo.delete_customer(&mut *tx, id).await? {
            return Err(AppError::NotFound("Cliente não encontrado.".into()));
        }

        self.activity_repo
            .record(&mut *tx, NewActivity::by(actor, "customer.deleted", "customer", id))
            .await?;

        tx.commit().await?;
        Ok(())
    }
}
