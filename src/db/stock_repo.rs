// src/db/stock_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_constraint, AppError},
    models::stock::{
        CreateProductPayload, CreateSkuPayload, Product, Sku, SkuQuantity, StockListing,
        StockReason, StockTransaction,
    },
};

const SKU_COLUMNS: &str = "id, tenant_id, name, quantity, cost_price, created_at";
const PRODUCT_COLUMNS: &str = "id, tenant_id, sku_id, name, category, price, image_id, created_at";

#[derive(Clone, Default)]
pub struct StockRepository;

impl StockRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn create_sku<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateSkuPayload,
    ) -> Result<Sku, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sku = sqlx::query_as::<_, Sku>(&format!(
            r#"
            INSERT INTO skus (tenant_id, name, quantity, cost_price)
            VALUES ($1, $2, $3, $4)
            RETURNING {SKU_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(&payload.name)
        .bind(payload.quantity)
        .bind(payload.cost_price)
        .fetch_one(executor)
        .await?;
        Ok(sku)
    }

    pub async fn create_product<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateProductPayload,
    ) -> Result<Product, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (tenant_id, sku_id, name, category, price, image_id)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(payload.sku_id)
        .bind(&payload.name)
        .bind(&payload.category)
        .bind(payload.price)
        .bind(payload.image_id)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::SkuNotFound))
    }

    /// `quantity = quantity + delta` (delta com sinal).
    pub async fn apply_quantity_delta<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku_id: Uuid,
        delta: Decimal,
    ) -> Result<Sku, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Sku>(&format!(
            r#"
            UPDATE skus SET quantity = quantity + $3
            WHERE tenant_id = $1 AND id = $2
            RETURNING {SKU_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(sku_id)
        .bind(delta)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::SkuNotFound)
    }

    pub async fn insert_movement<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku_id: Uuid,
        order_id: Option<Uuid>,
        quantity: Decimal,
        reason: StockReason,
        created_by: Uuid,
    ) -> Result<StockTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, StockTransaction>(
            r#"
            INSERT INTO stock_transactions (tenant_id, sku_id, order_id, quantity, reason, created_by)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, tenant_id, sku_id, order_id, quantity, reason, created_by, created_at
            "#,
        )
        .bind(tenant_id)
        .bind(sku_id)
        .bind(order_id)
        .bind(quantity)
        .bind(reason)
        .bind(created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::SkuNotFound))
    }

    /// Quantidades do pedido agregadas por SKU. Produtos sem SKU não movimentam estoque.
    pub async fn sku_quantities_for_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<SkuQuantity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, SkuQuantity>(
            r#"
            SELECT p.sku_id AS sku_id, SUM(i.quantity) AS quantity
            FROM order_items i
            JOIN products p ON p.id = i.product_id
            WHERE i.tenant_id = $1 AND i.order_id = $2 AND p.sku_id IS NOT NULL
            GROUP BY p.sku_id
            ORDER BY p.sku_id
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn list_skus<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        listing: &StockListing,
    ) -> Result<Vec<Sku>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // `sort_column` vem de lista fixa (StockQuery::normalize)
        let direction = if listing.descending { "DESC" } else { "ASC" };
        let rows = sqlx::query_as::<_, Sku>(&format!(
            r#"
            SELECT {SKU_COLUMNS} FROM skus
            WHERE tenant_id = $1 AND ($2::text IS NULL OR name ILIKE $2)
            ORDER BY {column} {direction}, id
            LIMIT $3 OFFSET $4
            "#,
            column = listing.sort_column,
        ))
        .bind(tenant_id)
        .bind(listing.name_pattern.as_deref())
        .bind(listing.limit)
        .bind(listing.offset)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn count_skus<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        listing: &StockListing,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM skus WHERE tenant_id = $1 AND ($2::text IS NULL OR name ILIKE $2)",
        )
        .bind(tenant_id)
        .bind(listing.name_pattern.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn list_products<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Product>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE tenant_id = $1 ORDER BY category, name"
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
