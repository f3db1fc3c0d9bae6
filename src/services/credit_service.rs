// src/services/credit_service.rs

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::OrderRepository,
    models::customer::{CreditSnapshot, Customer},
};

// Leitura do crédito comprometido em fiado. Não grava nada.
#[derive(Clone)]
pub struct CreditService {
    order_repo: OrderRepository,
}

impl CreditService {
    pub fn new(order_repo: OrderRepository) -> Self {
        Self { order_repo }
    }

    pub async fn used_credit(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<Decimal, AppError> {
        self.order_repo.used_credit(conn, tenant_id, customer_id, None).await
    }

    pub async fn pending_expired_fiado_count(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<i64, AppError> {
        self.order_repo.pending_expired_count(conn, tenant_id, customer_id).await
    }

    pub async fn used_credit_by_customer(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
    ) -> Result<Vec<(Uuid, Decimal)>, AppError> {
        self.order_repo.used_credit_by_customer(conn, tenant_id).await
    }

    /// Limite, uso e vencidos do cliente. `exclude_order` deixa de fora o
    /// pedido em edição, que será recontado com o novo total.
    pub async fn snapshot(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        customer: &Customer,
        exclude_order: Option<Uuid>,
    ) -> Result<CreditSnapshot, AppError> {
        let used_credit = self
            .order_repo
            .used_credit(&mut *conn, tenant_id, customer.id, exclude_order)
            .await?;
        let pending_expired = self
            .order_repo
            .pending_expired_count(&mut *conn, tenant_id, customer.id)
            .await?;

        Ok(CreditSnapshot {
            customer_id: customer.id,
            max_credit: customer.max_credit,
            used_credit,
            pending_expired,
        })
    }
}
