// src/services/order_service.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, format::format_date_br},
    db::{
        order_repo::NewOrder, CustomerRepository, OrderRepository, PaymentRepository,
        RbacRepository, TenantRepository,
    },
    middleware::rbac::{PermMotoboy, PermissionDef},
    models::{
        auth::User,
        customer::Customer,
        logs::{LogType, NewLogEntry},
        order::{
            CreateFiadoOrderPayload, CreatePaidOrderPayload, CreateWaitingOrderPayload,
            CreatedOrder, NewOrderItem, Order, OrderDetail, OrderInfo, OrderItem, OrderStatus,
            OrderSummary,
            OrderUpdate,
        },
    },
    services::{
        admission::{self, OrderKind},
        audit_service::AuditService,
        cashier_service::CashierService,
        credit_service::CreditService,
        payment_service::PaymentService,
        stock_service::StockService,
    },
};

#[derive(Clone)]
pub struct OrderService {
    repo: OrderRepository,
    customer_repo: CustomerRepository,
    tenant_repo: TenantRepository,
    rbac_repo: RbacRepository,
    payment_repo: PaymentRepository,
    credit: CreditService,
    payments: PaymentService,
    stock: StockService,
    cashier: CashierService,
    audit: AuditService,
    strict_transitions: bool,
}

impl OrderService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        repo: OrderRepository,
        customer_repo: CustomerRepository,
        tenant_repo: TenantRepository,
        rbac_repo: RbacRepository,
        payment_repo: PaymentRepository,
        credit: CreditService,
        payments: PaymentService,
        stock: StockService,
        cashier: CashierService,
        audit: AuditService,
        strict_transitions: bool,
    ) -> Self {
        Self {
            repo,
            customer_repo,
            tenant_repo,
            rbac_repo,
            payment_repo,
            credit,
            payments,
            stock,
            cashier,
            audit,
            strict_transitions,
        }
    }

    // --- Admissão (somente leitura, antes de qualquer escrita) ---

    /// Cliente + endereço. Em fiado a linha do cliente fica travada até o commit.
    async fn admit_customer(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        info: &OrderInfo,
        lock: bool,
    ) -> Result<Customer, AppError> {
        let customer_id = info.customer_id.ok_or(AppError::CustomerNotFound)?;
        let customer = if lock {
            self.customer_repo.lock_by_id(&mut *conn, tenant_id, customer_id).await?
        } else {
            self.customer_repo.find_by_id(&mut *conn, tenant_id, customer_id).await?
        };

        let address = match info.address_id {
            Some(address_id) => Some(
                self.customer_repo
                    .find_address(&mut *conn, tenant_id, customer_id, address_id)
                    .await?,
            ),
            None => None,
        };

        let customer = admission::check_customer(customer.as_ref(), address.as_ref().map(Option::as_ref))?;
        Ok(customer.clone())
    }

    /// Motoboy informado precisa ser membro ativo com a permissão de entregador.
    async fn check_courier(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        motoboy_id: Option<Uuid>,
    ) -> Result<(), AppError> {
        let Some(motoboy_id) = motoboy_id else {
            return Ok(());
        };
        if !self
            .rbac_repo
            .user_has_permission(&mut *conn, motoboy_id, tenant_id, PermMotoboy::slug())
            .await?
        {
            return Err(AppError::CourierNotFound);
        }
        Ok(())
    }

    /// Grava cabeçalho + itens e, se o pedido já nasce entregue, baixa o estoque.
    async fn persist(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        new_order: NewOrder<'_>,
        items: &[NewOrderItem],
    ) -> Result<(Order, Vec<OrderItem>), AppError> {
        let created_by = new_order.created_by;
        let mut order = self.repo.insert_order(&mut *conn, tenant_id, new_order).await?;
        let order_items = self.repo.insert_items(&mut *conn, tenant_id, order.id, items).await?;

        if order.status == OrderStatus::Delivered {
            self.stock.apply_order(conn, &mut order, created_by).await?;
        }
        Ok((order, order_items))
    }

    // --- Criação ---

    pub async fn create_fiado_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateFiadoOrderPayload,
        user: &User,
    ) -> Result<CreatedOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let info = &payload.order_info;
        let mut tx = executor.begin().await?;

        let customer = self.admit_customer(&mut tx, tenant_id, info, true).await?;
        let credit = self.credit.snapshot(&mut tx, tenant_id, &customer, None).await?;
        admission::check_credit(&credit, info.total)?;
        self.check_courier(&mut tx, tenant_id, info.motoboy_id).await?;

        let new_order = NewOrder {
            info,
            status: admission::initial_status(OrderKind::Fiado, info.motoboy_id),
            is_fiado: true,
            amount_paid: Decimal::ZERO,
            created_by: user.id,
        };
        let (order, order_items) = self.persist(&mut tx, tenant_id, new_order, &payload.order_items).await?;

        let entry = NewLogEntry::new(LogType::Caixa, user.id, "Pedido fiado")
            .order(order.id)
            .customer(order.customer_id)
            .cashier(order.cashier_id)
            .route("/pedidos", "Fiado")
            .metadata(json!({ "total": order.total, "used_credit": credit.used_credit }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, customer_id = %customer.id, "Pedido fiado criado");
        Ok(CreatedOrder {
            order,
            order_items,
            payments: None,
        })
    }

    pub async fn create_paid_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreatePaidOrderPayload,
        user: &User,
    ) -> Result<CreatedOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let info = &payload.order_info;
        let mut tx = executor.begin().await?;

        // Venda de balcão pode não ter cliente
        if info.customer_id.is_some() {
            self.admit_customer(&mut tx, tenant_id, info, false).await?;
        }
        let amount_paid = admission::check_payments(info.total, &payload.payment_info)?;
        admission::check_cash_cashier(&payload.payment_info, info.cashier_id)?;
        self.check_courier(&mut tx, tenant_id, info.motoboy_id).await?;

        let new_order = NewOrder {
            info,
            status: admission::initial_status(OrderKind::Paid, info.motoboy_id),
            is_fiado: false,
            amount_paid,
            created_by: user.id,
        };
        let (order, order_items) = self.persist(&mut tx, tenant_id, new_order, &payload.order_items).await?;
        let payments = self
            .payments
            .record_order_payments(&mut tx, &order, &payload.payment_info, user)
            .await?;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, payments = payments.len(), "Pedido pago criado");
        Ok(CreatedOrder {
            order,
            order_items,
            payments: Some(payments),
        })
    }

    /// Delivery em espera: sai confirmado com motoboy e sem pagamento.
    pub async fn create_waiting_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payload: &CreateWaitingOrderPayload,
        user: &User,
    ) -> Result<CreatedOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let info = &payload.order_info;
        let mut tx = executor.begin().await?;

        self.admit_customer(&mut tx, tenant_id, info, false).await?;
        let motoboy_id = admission::require_courier(info.motoboy_id)?;
        self.check_courier(&mut tx, tenant_id, Some(motoboy_id)).await?;

        let new_order = NewOrder {
            info,
            status: admission::initial_status(OrderKind::Waiting, Some(motoboy_id)),
            is_fiado: false,
            amount_paid: Decimal::ZERO,
            created_by: user.id,
        };
        let (order, order_items) = self.persist(&mut tx, tenant_id, new_order, &payload.order_items).await?;

        let entry = NewLogEntry::new(LogType::Caixa, user.id, "Pedido delivery, EM ESPERA")
            .order(order.id)
            .customer(order.customer_id)
            .cashier(order.cashier_id)
            .route("/pedidos", "Fiado")
            .metadata(json!({ "motoboy_id": motoboy_id }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(CreatedOrder {
            order,
            order_items,
            payments: None,
        })
    }

    // --- Edição ---

    /// Troca cabeçalho e itens de uma vez. Fiado é reavaliado contra o limite
    /// sem contar o próprio pedido; estoque já baixado é refeito.
    pub async fn update_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        update: &OrderUpdate,
        user: &User,
    ) -> Result<CreatedOrder, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut order = self.repo.lock_by_id(&mut *tx, tenant_id, order_id).await?;
        if order.status.is_closed() {
            return Err(AppError::OrderClosed);
        }
        if update.motoboy_id != order.motoboy_id {
            self.check_courier(&mut tx, tenant_id, update.motoboy_id).await?;
        }

        if order.is_fiado {
            if let Some(customer_id) = order.customer_id {
                let customer = self
                    .customer_repo
                    .lock_by_id(&mut *tx, tenant_id, customer_id)
                    .await?
                    .ok_or(AppError::CustomerNotFound)?;
                let credit = self.credit.snapshot(&mut tx, tenant_id, &customer, Some(order.id)).await?;
                if credit.used_credit + update.total > credit.max_credit {
                    return Err(AppError::InsufficientCredit);
                }
            }
        }

        let restock = order.stock_applied;
        if restock {
            self.stock.reverse_order(&mut tx, &mut order, user.id).await?;
        }

        update.apply_to(&mut order);
        self.repo.delete_items(&mut *tx, tenant_id, order.id).await?;
        let order_items = self.repo.insert_items(&mut *tx, tenant_id, order.id, &update.items).await?;
        let mut order = self.repo.save(&mut *tx, &order).await?;

        if restock {
            self.stock.apply_order(&mut tx, &mut order, user.id).await?;
        }

        let entry = NewLogEntry::new(
            LogType::System,
            user.id,
            format!("{} atualizou o pedido {}", user.username, order.id),
        )
        .order(order.id)
        .customer(order.customer_id)
        .route("/pedidos", "Editar pedido")
        .metadata(json!({ "total": order.total, "items": order_items.len() }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(CreatedOrder {
            order,
            order_items,
            payments: None,
        })
    }

    pub async fn update_status<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        status: OrderStatus,
        user: &User,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut order = self.repo.lock_by_id(&mut *tx, tenant_id, order_id).await?;

        if status == OrderStatus::Canceled {
            let order = self.cancel_locked(&mut tx, order, user).await?;
            tx.commit().await?;
            return Ok(order);
        }

        if self.strict_transitions && !order.status.can_transition_to(status) {
            return Err(AppError::IllegalTransition {
                from: order.status,
                to: status,
            });
        }

        let from = order.status;
        order.status = status;
        let mut order = self.repo.save(&mut *tx, &order).await?;
        if status == OrderStatus::Delivered {
            self.stock.apply_order(&mut tx, &mut order, user.id).await?;
        }

        let entry = NewLogEntry::new(
            LogType::System,
            user.id,
            format!("{} atualizou o status do pedido {} para {}", user.username, order.id, status),
        )
        .order(order.id)
        .customer(order.customer_id)
        .route("/pedidos", "Atualizar Status do Pedido")
        .metadata(json!({ "from": from, "to": status }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(order)
    }

    pub async fn update_expire_date<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        expire_at: DateTime<Utc>,
        user: &User,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut order = self.repo.lock_by_id(&mut *tx, tenant_id, order_id).await?;
        if !order.is_fiado {
            return Err(AppError::NotFiadoOrder);
        }

        order.expire_at = Some(expire_at);
        let order = self.repo.save(&mut *tx, &order).await?;

        let entry = NewLogEntry::new(
            LogType::System,
            user.id,
            format!(
                "{} atualizou a data de vencimento do pedido {} para {}",
                user.username,
                order.id,
                format_date_br(&expire_at)
            ),
        )
        .order(order.id)
        .customer(order.customer_id)
        .route("/pedidos", "Atualizar vencimento")
        .metadata(json!({ "expire_at": expire_at }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(order)
    }

    pub async fn update_courier<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        motoboy_id: Uuid,
        user: &User,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut order = self.repo.lock_by_id(&mut *tx, tenant_id, order_id).await?;
        if order.status.is_closed() {
            return Err(AppError::OrderClosed);
        }

        let couriers = self
            .tenant_repo
            .list_members_with_permission(&mut *tx, tenant_id, PermMotoboy::slug())
            .await?;
        let courier = couriers
            .into_iter()
            .find(|m| m.user_id == motoboy_id)
            .ok_or(AppError::CourierNotFound)?;

        order.motoboy_id = Some(courier.user_id);
        let order = self.repo.save(&mut *tx, &order).await?;

        let entry = NewLogEntry::new(
            LogType::System,
            user.id,
            format!(
                "{} atualizou o motoboy do pedido {} para {}",
                user.username, order.id, courier.username
            ),
        )
        .order(order.id)
        .customer(order.customer_id)
        .route("/pedidos", "Atualizar motoboy")
        .metadata(json!({ "motoboy_id": courier.user_id }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(order)
    }

    // --- Cancelamento ---

    pub async fn cancel_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        user: &User,
    ) -> Result<Order, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let order = self.repo.lock_by_id(&mut *tx, tenant_id, order_id).await?;
        let order = self.cancel_locked(&mut tx, order, user).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, "Pedido cancelado");
        Ok(order)
    }

    /// Estorna estoque e caixa e marca CANCELED. O pedido já vem travado.
    async fn cancel_locked(
        &self,
        conn: &mut PgConnection,
        mut order: Order,
        user: &User,
    ) -> Result<Order, AppError> {
        if order.status.is_closed() {
            return Err(AppError::OrderClosed);
        }
        let from = order.status;

        self.stock.reverse_order(&mut *conn, &mut order, user.id).await?;
        let reversals = self
            .cashier
            .reverse_for_order(&mut *conn, order.tenant_id, order.id, user.id)
            .await?;

        order.status = OrderStatus::Canceled;
        let order = self.repo.save(&mut *conn, &order).await?;

        let entry = NewLogEntry::new(
            LogType::System,
            user.id,
            format!("{} cancelou o pedido {}", user.username, order.id),
        )
        .order(order.id)
        .customer(order.customer_id)
        .route("/pedidos", "Cancelar pedido")
        .metadata(json!({
            "from": from,
            "cashier_reversals": reversals.iter().map(|t| t.id).collect::<Vec<_>>(),
        }));
        self.audit.record(conn, order.tenant_id, entry).await;

        Ok(order)
    }

    // --- Consultas ---

    pub async fn get_by_id(&self, conn: &mut PgConnection, tenant_id: Uuid, order_id: Uuid) -> Result<OrderDetail, AppError> {
        let summary = self
            .repo
            .find_summary(&mut *conn, tenant_id, order_id)
            .await?
            .ok_or(AppError::OrderNotFound)?;
        let items = self.repo.items_for_order(&mut *conn, tenant_id, order_id).await?;
        let payments = self.payment_repo.list_by_order(conn, tenant_id, order_id).await?;

        Ok(OrderDetail {
            header: summary.order,
            customer_name: summary.customer_name,
            items,
            payments,
        })
    }

    pub async fn get_current<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<OrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_current(executor, tenant_id).await
    }

    pub async fn get_all<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<OrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_all(executor, tenant_id).await
    }

    pub async fn get_not_paid<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        customer_id: Option<Uuid>,
    ) -> Result<Vec<OrderSummary>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_not_paid(executor, tenant_id, customer_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::test_support::{counter_info, item, TestStore},
        models::{payment::{NewPayment, PaymentMethod}, stock::Product},
    };

    fn fiado(product: &Product, customer_id: Uuid, quantity: i64) -> CreateFiadoOrderPayload {
        CreateFiadoOrderPayload {
            order_items: vec![item(product, quantity)],
            order_info: counter_info(Some(customer_id), quantity * 5, None),
        }
    }

    fn payment(method: PaymentMethod, amount: i64) -> NewPayment {
        NewPayment {
            payment_method: method,
            amount_paid: Decimal::from(amount),
            troco: Decimal::ZERO,
        }
    }

    #[tokio::test]
    async fn fiado_over_limit_writes_nothing() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let orders = &store.state.order_service;
        let customer = store.customer(100).await;
        let (sku, product) = store.product(50, 5).await;

        // 16 x 5 = 80 de crédito usado
        orders
            .create_fiado_order(store.pool(), store.tenant_id, &fiado(&product, customer.id, 16), &store.owner)
            .await
            .unwrap();
        let logs_before = store.logs(None, Some(customer.id)).await.len();

        // 80 + 30 > 100
        let err = orders
            .create_fiado_order(store.pool(), store.tenant_id, &fiado(&product, customer.id, 6), &store.owner)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InsufficientCredit));

        let open = orders.get_not_paid(store.pool(), store.tenant_id, Some(customer.id)).await.unwrap();
        assert_eq!(open.len(), 1);
        assert_eq!(store.logs(None, Some(customer.id)).await.len(), logs_before);
        assert_eq!(store.sku_quantity(sku.id).await, Decimal::from(34));
    }

    #[tokio::test]
    async fn fiado_within_limit_adds_to_used_credit() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let orders = &store.state.order_service;
        let customer = store.customer(100).await;
        let (_, product) = store.product(50, 5).await;

        orders
            .create_fiado_order(store.pool(), store.tenant_id, &fiado(&product, customer.id, 16), &store.owner)
            .await
            .unwrap();
        // 80 + 15 = 95 <= 100
        let created = orders
            .create_fiado_order(store.pool(), store.tenant_id, &fiado(&product, customer.id, 3), &store.owner)
            .await
            .unwrap();
        assert!(created.order.is_fiado);
        assert_eq!(created.order.amount_paid, Decimal::ZERO);

        let mut conn = store.pool().acquire().await.unwrap();
        let used = store
            .state
            .credit_service
            .used_credit(&mut conn, store.tenant_id, customer.id)
            .await
            .unwrap();
        assert_eq!(used, Decimal::from(95));

        // Fechar exatamente no limite ainda é permitido
        orders
            .create_fiado_order(store.pool(), store.tenant_id, &fiado(&product, customer.id, 1), &store.owner)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn header_and_items_are_written_together() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let orders = &store.state.order_service;
        let customer = store.customer(500).await;
        let (_, agua) = store.product(20, 5).await;
        let (_, gelo) = store.product(20, 5).await;

        let payload = CreateFiadoOrderPayload {
            order_items: vec![item(&agua, 2), item(&gelo, 1)],
            order_info: counter_info(Some(customer.id), 15, None),
        };
        let created = orders
            .create_fiado_order(store.pool(), store.tenant_id, &payload, &store.owner)
            .await
            .unwrap();
        assert_eq!(created.order_items.len(), 2);
        assert!(created.order_items.iter().all(|i| i.order_id == created.order.id));

        let mut conn = store.pool().acquire().await.unwrap();
        let detail = orders.get_by_id(&mut conn, store.tenant_id, created.order.id).await.unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.header.total, Decimal::from(15));
    }

    #[tokio::test]
    async fn paid_order_records_every_payment() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let (_, product) = store.product(10, 25).await;
        let cashier = store.cashier().await;

        let payload = CreatePaidOrderPayload {
            order_items: vec![item(&product, 2)],
            order_info: counter_info(None, 50, Some(cashier.id)),
            payment_info: vec![payment(PaymentMethod::Dinheiro, 30), payment(PaymentMethod::Pix, 25)],
        };
        let created = store
            .state
            .order_service
            .create_paid_order(store.pool(), store.tenant_id, &payload, &store.owner)
            .await
            .unwrap();

        assert_eq!(created.order.amount_paid, Decimal::from(55));
        assert_eq!(created.payments.as_ref().map(Vec::len), Some(2));
        assert_eq!(store.logs(Some(created.order.id), None).await.len(), 2);

        // Só o dinheiro entra no caixa, com um ajuste de saldo por movimentação
        let mut conn = store.pool().acquire().await.unwrap();
        let ledger = store
            .state
            .cashier_service
            .list_transactions(&mut conn, store.tenant_id, cashier.id)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger[0].amount, Decimal::from(30));
        assert_eq!(store.cashier_balance(cashier.id).await, Decimal::from(30));
    }

    #[tokio::test]
    async fn cash_without_cashier_is_rejected_before_writing() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let orders = &store.state.order_service;
        let (sku, product) = store.product(10, 25).await;

        let payload = CreatePaidOrderPayload {
            order_items: vec![item(&product, 2)],
            order_info: counter_info(None, 50, None),
            payment_info: vec![payment(PaymentMethod::Dinheiro, 50)],
        };
        let err = orders
            .create_paid_order(store.pool(), store.tenant_id, &payload, &store.owner)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CashWithoutCashier));

        assert!(orders.get_all(store.pool(), store.tenant_id).await.unwrap().is_empty());
        assert_eq!(store.sku_quantity(sku.id).await, Decimal::from(10));
    }

    #[tokio::test]
    async fn cancel_reverses_stock_and_cashier() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let orders = &store.state.order_service;
        let (sku, product) = store.product(10, 25).await;
        let cashier = store.cashier().await;

        let payload = CreatePaidOrderPayload {
            order_items: vec![item(&product, 2)],
            order_info: counter_info(None, 50, Some(cashier.id)),
            payment_info: vec![payment(PaymentMethod::Dinheiro, 50)],
        };
        let created = orders
            .create_paid_order(store.pool(), store.tenant_id, &payload, &store.owner)
            .await
            .unwrap();
        assert_eq!(created.order.status, OrderStatus::Delivered);
        assert!(created.order.stock_applied);
        assert_eq!(store.sku_quantity(sku.id).await, Decimal::from(8));
        assert_eq!(store.cashier_balance(cashier.id).await, Decimal::from(50));

        let canceled = orders
            .cancel_order(store.pool(), store.tenant_id, created.order.id, &store.owner)
            .await
            .unwrap();
        assert_eq!(canceled.status, OrderStatus::Canceled);
        assert!(!canceled.stock_applied);
        assert_eq!(store.sku_quantity(sku.id).await, Decimal::from(10));
        assert_eq!(store.cashier_balance(cashier.id).await, Decimal::ZERO);

        let mut conn = store.pool().acquire().await.unwrap();
        let ledger = store
            .state
            .cashier_service
            .list_transactions(&mut conn, store.tenant_id, cashier.id)
            .await
            .unwrap();
        assert_eq!(ledger.len(), 2);
        let net: Decimal = ledger.iter().map(|t| t.direction.signed(t.amount)).sum();
        assert_eq!(net, Decimal::ZERO);

        let again = orders
            .cancel_order(store.pool(), store.tenant_id, created.order.id, &store.owner)
            .await
            .unwrap_err();
        assert!(matches!(again, AppError::OrderClosed));
    }
}
