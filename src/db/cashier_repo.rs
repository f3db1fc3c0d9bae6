// src/db/cashier_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_constraint, AppError},
    models::cashier::{Cashier, CashierTransaction, DeliveryFee, NewCashierTransaction},
};

const CASHIER_COLUMNS: &str = "id, tenant_id, name, currency, created_at";
const TX_COLUMNS: &str =
    "id, tenant_id, cashier_id, order_id, payment_id, amount, direction, description, created_by, created_at";

#[derive(Clone, Default)]
pub struct CashierRepository;

impl CashierRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, name: &str) -> Result<Cashier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cashier = sqlx::query_as::<_, Cashier>(&format!(
            "INSERT INTO cashiers (tenant_id, name) VALUES ($1, $2) RETURNING {CASHIER_COLUMNS}"
        ))
        .bind(tenant_id)
        .bind(name)
        .fetch_one(executor)
        .await?;
        Ok(cashier)
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Cashier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let cashiers = sqlx::query_as::<_, Cashier>(&format!(
            "SELECT {CASHIER_COLUMNS} FROM cashiers WHERE tenant_id = $1 ORDER BY name"
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(cashiers)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
    ) -> Result<Cashier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cashier>(&format!(
            "SELECT {CASHIER_COLUMNS} FROM cashiers WHERE tenant_id = $1 AND id = $2"
        ))
        .bind(tenant_id)
        .bind(cashier_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::CashierNotFound)
    }

    pub async fn rename<'e, E>(&self, executor: E, cashier: &Cashier) -> Result<Cashier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Cashier>(&format!(
            "UPDATE cashiers SET name = $3 WHERE tenant_id = $1 AND id = $2 RETURNING {CASHIER_COLUMNS}"
        ))
        .bind(cashier.tenant_id)
        .bind(cashier.id)
        .bind(&cashier.name)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::CashierNotFound)
    }

    /// Só apaga caixa zerado e sem histórico; caso contrário, nada muda.
    pub async fn delete_if_empty<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            DELETE FROM cashiers c
            WHERE c.tenant_id = $1 AND c.id = $2 AND c.currency = 0
              AND NOT EXISTS (SELECT 1 FROM cashier_transactions t WHERE t.cashier_id = c.id)
            "#,
        )
        .bind(tenant_id)
        .bind(cashier_id)
        .execute(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::CashierNotEmpty))?;
        Ok(result.rows_affected() == 1)
    }

    pub async fn insert_transaction<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
        tx: &NewCashierTransaction,
        created_by: Uuid,
    ) -> Result<CashierTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, CashierTransaction>(&format!(
            r#"
            INSERT INTO cashier_transactions (tenant_id, cashier_id, order_id, payment_id, amount,
                                              direction, description, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {TX_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(cashier_id)
        .bind(tx.order_id)
        .bind(tx.payment_id)
        .bind(tx.amount)
        .bind(tx.direction)
        .bind(&tx.description)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::CashierNotFound))
    }

    /// `currency = currency + delta` na própria linha: sem ler-modificar-gravar.
    pub async fn apply_balance_delta<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
        delta: Decimal,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_scalar(
            r#"
            UPDATE cashiers SET currency = currency + $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING currency
            "#,
        )
        .bind(tenant_id)
        .bind(cashier_id)
        .bind(delta)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::CashierNotFound)
    }

    pub async fn list_transactions<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
    ) -> Result<Vec<CashierTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, CashierTransaction>(&format!(
            r#"
            SELECT {TX_COLUMNS} FROM cashier_transactions
            WHERE tenant_id = $1 AND cashier_id = $2
            ORDER BY created_at DESC
            "#
        ))
        .bind(tenant_id)
        .bind(cashier_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn transactions_for_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<CashierTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, CashierTransaction>(&format!(
            r#"
            SELECT {TX_COLUMNS} FROM cashier_transactions
            WHERE tenant_id = $1 AND order_id = $2
            ORDER BY created_at
            "#
        ))
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    // --- Taxa de entrega ---

    pub async fn ensure_delivery_fee<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("INSERT INTO delivery_fees (tenant_id) VALUES ($1) ON CONFLICT DO NOTHING")
            .bind(tenant_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn get_delivery_fee<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<DeliveryFee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fee = sqlx::query_as::<_, DeliveryFee>(
            "SELECT tenant_id, taxa_por_km FROM delivery_fees WHERE tenant_id = $1",
        )
        .bind(tenant_id)
        .fetch_optional(executor)
        .await?;

        // Loja sem linha cadastrada cobra zero por km
        Ok(fee.unwrap_or(DeliveryFee {
            tenant_id,
            taxa_por_km: Decimal::ZERO,
        }))
    }

    pub async fn upsert_delivery_fee<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        taxa_por_km: Decimal,
    ) -> Result<DeliveryFee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let fee = sqlx::query_as::<_, DeliveryFee>(
            r#"
            INSERT INTO delivery_fees (tenant_id, taxa_por_km) VALUES ($1, $2)
            ON CONFLICT (tenant_id) DO UPDATE SET taxa_por_km = EXCLUDED.taxa_por_km
            RETURNING tenant_id, taxa_por_km
            "#,
        )
        .bind(tenant_id)
        .bind(taxa_por_km)
        .fetch_one(executor)
        .await?;
        Ok(fee)
    }
}
