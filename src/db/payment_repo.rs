// src/db/payment_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_constraint, AppError},
    models::payment::{NewPayment, OrderPayment},
};

const PAYMENT_COLUMNS: &str =
    "id, tenant_id, order_id, payment_method, amount_paid, troco, cashier_id, created_by, created_at";

#[derive(Clone, Default)]
pub struct PaymentRepository;

impl PaymentRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        payment: &NewPayment,
        cashier_id: Option<Uuid>,
        created_by: Uuid,
    ) -> Result<OrderPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, OrderPayment>(&format!(
            r#"
            INSERT INTO order_payments (tenant_id, order_id, payment_method, amount_paid, troco, cashier_id, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(order_id)
        .bind(payment.payment_method)
        .bind(payment.amount_paid)
        .bind(payment.troco)
        .bind(cashier_id)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::CashierNotFound))
    }

    pub async fn list_by_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<OrderPayment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let payments = sqlx::query_as::<_, OrderPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM order_payments WHERE tenant_id = $1 AND order_id = $2 ORDER BY created_at"
        ))
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(payments)
    }

    pub async fn lock_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment_id: Uuid,
    ) -> Result<OrderPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, OrderPayment>(&format!(
            "SELECT {PAYMENT_COLUMNS} FROM order_payments WHERE tenant_id = $1 AND id = $2 FOR UPDATE"
        ))
        .bind(tenant_id)
        .bind(payment_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::PaymentNotFound)
    }

    pub async fn save<'e, E>(&self, executor: E, payment: &OrderPayment) -> Result<OrderPayment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, OrderPayment>(&format!(
            r#"
            UPDATE order_payments
            SET payment_method = $3, amount_paid = $4, troco = $5, cashier_id = $6
            WHERE tenant_id = $1 AND id = $2
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(payment.tenant_id)
        .bind(payment.id)
        .bind(payment.payment_method)
        .bind(payment.amount_paid)
        .bind(payment.troco)
        .bind(payment.cashier_id)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::CashierNotFound))?
        .ok_or(AppError::PaymentNotFound)
    }
}
