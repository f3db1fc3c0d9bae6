// src/db/order_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_constraint, AppError},
    models::{
        order::{NewOrderItem, Order, OrderInfo, OrderItem, OrderStatus, OrderSummary},
        payment::PendingFiado,
    },
};

const ORDER_COLUMNS: &str = "o.id, o.tenant_id, o.customer_id, o.address_id, o.order_type, o.status, \
     o.is_fiado, o.total, o.amount_paid, o.taxa_entrega, o.motoboy_id, o.cashier_id, o.observation, \
     o.expire_at, o.stock_applied, o.created_by, o.created_at, o.updated_at";

const ITEM_COLUMNS: &str = "id, tenant_id, order_id, product_id, quantity, price";

// Fiado "em aberto": não cancelado e ainda não quitado.
const OPEN_FIADO: &str = "o.is_fiado AND o.status <> 'CANCELED' AND o.amount_paid < o.total";

/// Cabeçalho de um pedido novo, já classificado pela admissão.
pub struct NewOrder<'a> {
    pub info: &'a OrderInfo,
    pub status: OrderStatus,
    pub is_fiado: bool,
    pub amount_paid: Decimal,
    pub created_by: Uuid,
}

#[derive(Clone, Default)]
pub struct OrderRepository;

impl OrderRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        new_order: NewOrder<'_>,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let info = new_order.info;
        sqlx::query_as::<_, Order>(&format!(
            r#"
            INSERT INTO orders AS o (tenant_id, customer_id, address_id, order_type, status, is_fiado,
                                     total, amount_paid, taxa_entrega, motoboy_id, cashier_id,
                                     observation, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(info.customer_id)
        .bind(info.address_id)
        .bind(info.order_type)
        .bind(new_order.status)
        .bind(new_order.is_fiado)
        .bind(info.stored_total())
        .bind(new_order.amount_paid)
        .bind(info.taxa_entrega)
        .bind(info.motoboy_id)
        .bind(info.cashier_id)
        .bind(&info.observation)
        .bind(new_order.created_by)
        .fetch_one(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::CustomerNotFound))
    }

    /// Insere todos os itens de uma vez (UNNEST), devolvendo as linhas gravadas.
    pub async fn insert_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        items: &[NewOrderItem],
    ) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let product_ids: Vec<Uuid> = items.iter().map(|i| i.product_id).collect();
        let quantities: Vec<Decimal> = items.iter().map(|i| i.quantity).collect();
        let prices: Vec<Decimal> = items.iter().map(|i| i.price).collect();

        sqlx::query_as::<_, OrderItem>(&format!(
            r#"
            INSERT INTO order_items (tenant_id, order_id, product_id, quantity, price)
            SELECT $1, $2, item.product_id, item.quantity, item.price
            FROM UNNEST($3::uuid[], $4::numeric[], $5::numeric[]) AS item(product_id, quantity, price)
            RETURNING {ITEM_COLUMNS}
            "#
        ))
        .bind(tenant_id)
        .bind(order_id)
        .bind(&product_ids)
        .bind(&quantities)
        .bind(&prices)
        .fetch_all(executor)
        .await
        .map_err(|e| map_constraint(e, AppError::ProductNotFound))
    }

    pub async fn delete_items<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM order_items WHERE tenant_id = $1 AND order_id = $2")
            .bind(tenant_id)
            .bind(order_id)
            .execute(executor)
            .await?;
        Ok(())
    }

    pub async fn items_for_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<OrderItem>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let items = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ITEM_COLUMNS} FROM order_items WHERE tenant_id = $1 AND order_id = $2 ORDER BY id"
        ))
        .bind(tenant_id)
        .bind(order_id)
        .fetch_all(executor)
        .await?;
        Ok(items)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let order = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.tenant_id = $1 AND o.id = $2"
        ))
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(order)
    }

    /// SELECT ... FOR UPDATE: toda alteração de pedido passa por aqui.
    pub async fn lock_by_id<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders o WHERE o.tenant_id = $1 AND o.id = $2 FOR UPDATE"
        ))
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::OrderNotFound)
    }

    /// Grava os campos mutáveis de um pedido já mesclado em memória.
    pub async fn save<'e, E>(&self, executor: E, order: &Order) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Order>(&format!(
            r#"
            UPDATE orders AS o
            SET status = $3, total = $4, amount_paid = $5, taxa_entrega = $6, motoboy_id = $7,
                observation = $8, expire_at = $9, stock_applied = $10, updated_at = NOW()
            WHERE o.tenant_id = $1 AND o.id = $2
            RETURNING {ORDER_COLUMNS}
            "#
        ))
        .bind(order.tenant_id)
        .bind(order.id)
        .bind(order.status)
        .bind(order.total)
        .bind(order.amount_paid)
        .bind(order.taxa_entrega)
        .bind(order.motoboy_id)
        .bind(&order.observation)
        .bind(order.expire_at)
        .bind(order.stock_applied)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::OrderNotFound)
    }

    /// Soma (ou subtrai) do valor pago sem ler-modificar-gravar.
    pub async fn add_amount_paid<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        delta: Decimal,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            r#"
            UPDATE orders SET amount_paid = amount_paid + $3, updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(order_id)
        .bind(delta)
        .execute(executor)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::OrderNotFound);
        }
        Ok(())
    }

    // --- Leituras com o nome do cliente ---

    pub async fn find_summary<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<OrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let summary = sqlx::query_as::<_, OrderSummary>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, c.name AS customer_name
            FROM orders o LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.tenant_id = $1 AND o.id = $2
            "#
        ))
        .bind(tenant_id)
        .bind(order_id)
        .fetch_optional(executor)
        .await?;
        Ok(summary)
    }

    pub async fn list_all<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<OrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, c.name AS customer_name
            FROM orders o LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.tenant_id = $1
            ORDER BY o.created_at DESC
            "#
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Pedidos ainda em andamento (nem entregues nem fechados).
    pub async fn list_current<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<OrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, c.name AS customer_name
            FROM orders o LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.tenant_id = $1
              AND o.status IN ('PENDING', 'CONFIRMED', 'PREPARING', 'ON THE WAY')
            ORDER BY o.created_at
            "#
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Fiados em aberto; opcionalmente de um único cliente.
    pub async fn list_not_paid<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<OrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, OrderSummary>(&format!(
            r#"
            SELECT {ORDER_COLUMNS}, c.name AS customer_name
            FROM orders o LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.tenant_id = $1 AND {OPEN_FIADO}
              AND ($2::uuid IS NULL OR o.customer_id = $2)
            ORDER BY o.expire_at NULLS LAST, o.created_at
            "#
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    pub async fn list_pending_fiado<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<PendingFiado>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, PendingFiado>(&format!(
            r#"
            SELECT o.id AS order_id, o.customer_id, c.name AS customer_name, o.total, o.amount_paid,
                   o.total - o.amount_paid AS outstanding, o.expire_at, o.created_at
            FROM orders o LEFT JOIN customers c ON c.id = o.customer_id
            WHERE o.tenant_id = $1 AND {OPEN_FIADO}
            ORDER BY o.expire_at NULLS LAST, o.created_at
            "#
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    // --- Crédito ---

    /// Soma dos totais dos fiados em aberto do cliente. `exclude_order`
    /// tira da conta o pedido que está sendo editado.
    pub async fn used_credit<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
        exclude_order: Option<Uuid>,
    ) -> Result<Decimal, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let used: Decimal = sqlx::query_scalar(&format!(
            r#"
            SELECT COALESCE(SUM(o.total), 0)
            FROM orders o
            WHERE o.tenant_id = $1 AND o.customer_id = $2 AND {OPEN_FIADO}
              AND ($3::uuid IS NULL OR o.id <> $3)
            "#
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .bind(exclude_order)
        .fetch_one(executor)
        .await?;
        Ok(used)
    }

    pub async fn pending_expired_count<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Uuid,
    ) -> Result<i64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let count: i64 = sqlx::query_scalar(&format!(
            r#"
            SELECT COUNT(*)
            FROM orders o
            WHERE o.tenant_id = $1 AND o.customer_id = $2 AND {OPEN_FIADO}
              AND o.expire_at IS NOT NULL AND o.expire_at < NOW()
            "#
        ))
        .bind(tenant_id)
        .bind(customer_id)
        .fetch_one(executor)
        .await?;
        Ok(count)
    }

    pub async fn used_credit_by_customer<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<(Uuid, Decimal)>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows: Vec<(Uuid, Decimal)> = sqlx::query_as(&format!(
            r#"
            SELECT o.customer_id, SUM(o.total)
            FROM orders o
            WHERE o.tenant_id = $1 AND o.customer_id IS NOT NULL AND {OPEN_FIADO}
            GROUP BY o.customer_id
            "#
        ))
        .bind(tenant_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
