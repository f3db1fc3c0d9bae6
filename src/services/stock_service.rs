// src/services/stock_service.rs

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{OrderRepository, StockRepository},
    models::{
        auth::User,
        logs::{LogType, NewLogEntry},
        order::Order,
        stock::{
            group_by_category, CreateProductPayload, CreateSkuPayload, Page, Product,
            ProductCategory, Sku, StockQuery, StockReason,
        },
    },
    services::audit_service::AuditService,
};

#[derive(Clone)]
pub struct StockService {
    repo: StockRepository,
    order_repo: OrderRepository,
    audit: AuditService,
}

impl StockService {
    pub fn new(repo: StockRepository, order_repo: OrderRepository, audit: AuditService) -> Self {
        Self {
            repo,
            order_repo,
            audit,
        }
    }

    // --- Baixa / estorno por pedido (sempre dentro da transação do pedido) ---

    /// Baixa o estoque dos itens do pedido. Idempotente: `stock_applied`
    /// impede a segunda baixa do mesmo pedido.
    pub(crate) async fn apply_order(
        &self,
        conn: &mut PgConnection,
        order: &mut Order,
        created_by: Uuid,
    ) -> Result<(), AppError> {
        if order.stock_applied {
            return Ok(());
        }
        self.move_order_stock(conn, order, StockReason::Venda, created_by).await?;
        order.stock_applied = true;
        *order = self.order_repo.save(&mut *conn, order).await?;
        Ok(())
    }

    /// Devolve ao estoque o que `apply_order` baixou.
    pub(crate) async fn reverse_order(
        &self,
        conn: &mut PgConnection,
        order: &mut Order,
        created_by: Uuid,
    ) -> Result<(), AppError> {
        if !order.stock_applied {
            return Ok(());
        }
        self.move_order_stock(conn, order, StockReason::Estorno, created_by).await?;
        order.stock_applied = false;
        *order = self.order_repo.save(&mut *conn, order).await?;
        Ok(())
    }

    async fn move_order_stock(
        &self,
        conn: &mut PgConnection,
        order: &Order,
        reason: StockReason,
        created_by: Uuid,
    ) -> Result<(), AppError> {
        let quantities = self
            .repo
            .sku_quantities_for_order(&mut *conn, order.tenant_id, order.id)
            .await?;

        for line in quantities {
            let delta = match reason {
                StockReason::Venda => -line.quantity,
                _ => line.quantity,
            };
            self.repo
                .apply_quantity_delta(&mut *conn, order.tenant_id, line.sku_id, delta)
                .await?;
            self.repo
                .insert_movement(&mut *conn, order.tenant_id, line.sku_id, Some(order.id), delta, reason, created_by)
                .await?;
        }
        Ok(())
    }

    // --- Ajuste manual ---

    pub async fn adjust<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        sku_id: Uuid,
        quantity: Decimal,
        user: &User,
    ) -> Result<Sku, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let sku = self
            .repo
            .apply_quantity_delta(&mut *tx, tenant_id, sku_id, quantity)
            .await?;
        let movement = self
            .repo
            .insert_movement(&mut *tx, tenant_id, sku_id, None, quantity, StockReason::Ajuste, user.id)
            .await?;

        let entry = NewLogEntry::new(
            LogType::Log,
            user.id,
            format!("{} ajustou o estoque de {} em {}", user.username, sku.name, quantity.normalize()),
        )
        .route("/estoque", "Ajuste de estoque")
        .metadata(json!({ "sku_id": sku_id, "movement_id": movement.id, "quantity": quantity }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(sku)
    }

    // --- Cadastro e leitura ---

    pub async fn create_sku<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateSkuPayload,
    ) -> Result<Sku, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create_sku(executor, tenant_id, payload).await
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
        self.repo.create_product(executor, tenant_id, payload).await
    }

    /// Página de SKUs + total com o mesmo filtro.
    pub async fn list(&self, conn: &mut PgConnection, tenant_id: Uuid, query: &StockQuery) -> Result<Page<Sku>, AppError> {
        let listing = query.normalize();

        let rows = self.repo.list_skus(&mut *conn, tenant_id, &listing).await?;
        let count = self.repo.count_skus(&mut *conn, tenant_id, &listing).await?;

        Ok(Page { rows, count })
    }

    pub async fn products_by_category<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
    ) -> Result<Vec<ProductCategory>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let products = self.repo.list_products(executor, tenant_id).await?;
        Ok(group_by_category(products))
    }
}
