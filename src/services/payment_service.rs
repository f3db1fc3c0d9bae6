// src/services/payment_service.rs

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, format::format_brl},
    db::{OrderRepository, PaymentRepository},
    models::{
        auth::User,
        logs::{LogType, NewLogEntry},
        order::{Order, OrderStatus},
        payment::{NewPayment, OrderPayment, PaymentPatch, PendingFiado, ReceivePaymentPayload},
    },
    services::{admission, audit_service::AuditService, cashier_service::CashierService},
};

/// "Pedido realizado com pagamento de R$ 30,00 para pedido X com troco de R$ 5,00"
pub fn order_payment_log_text(payment: &OrderPayment) -> String {
    let mut text = format!(
        "Pedido realizado com pagamento de {} para pedido {}",
        format_brl(payment.amount_paid),
        payment.order_id
    );
    if !payment.troco.is_zero() {
        text.push_str(&format!(" com troco de {}", format_brl(payment.troco)));
    }
    text
}

pub fn received_payment_log_text(payment: &OrderPayment) -> String {
    format!(
        "Pagamento com {} realizado, valor pago: {} - Pedido: {}",
        payment.payment_method.as_str(),
        format_brl(payment.amount_paid),
        payment.order_id
    )
}

#[derive(Clone)]
pub struct PaymentService {
    repo: PaymentRepository,
    order_repo: OrderRepository,
    cashier: CashierService,
    audit: AuditService,
}

impl PaymentService {
    pub fn new(
        repo: PaymentRepository,
        order_repo: OrderRepository,
        cashier: CashierService,
        audit: AuditService,
    ) -> Self {
        Self {
            repo,
            order_repo,
            cashier,
            audit,
        }
    }

    /// Pagamentos de um pedido pago, gravados na transação da criação.
    pub(crate) async fn record_order_payments(
        &self,
        conn: &mut PgConnection,
        order: &Order,
        payments: &[NewPayment],
        user: &User,
    ) -> Result<Vec<OrderPayment>, AppError> {
        let mut rows = Vec::with_capacity(payments.len());
        for payment in payments {
            let row = self
                .repo
                .insert(&mut *conn, order.tenant_id, order.id, payment, order.cashier_id, user.id)
                .await?;
            let cash = self.cashier.mirror_cash(&mut *conn, order.tenant_id, &row, user.id).await?;

            let entry = NewLogEntry::new(LogType::Caixa, user.id, order_payment_log_text(&row))
                .order(order.id)
                .customer(order.customer_id)
                .cashier(row.cashier_id)
                .currency(row.amount_paid)
                .route("/pedidos", "Inserir pedido pago")
                .metadata(json!({
                    "payment_id": row.id,
                    "amount_paid": row.amount_paid,
                    "troco": row.troco,
                    "cashier_transaction_id": cash.map(|t| t.id),
                }));
            self.audit.record(&mut *conn, order.tenant_id, entry).await;

            rows.push(row);
        }
        Ok(rows)
    }

    /// "Receber fiado": pagamento avulso sobre um pedido existente.
    pub async fn receive_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
        payload: &ReceivePaymentPayload,
        user: &User,
    ) -> Result<OrderPayment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let order = self.order_repo.lock_by_id(&mut *tx, tenant_id, order_id).await?;
        if order.status == OrderStatus::Canceled {
            return Err(AppError::OrderCanceled);
        }

        let cashier_id = payload.cashier_id.or(order.cashier_id);
        admission::check_cash_cashier(std::slice::from_ref(&payload.payment), cashier_id)?;
        let payment = self
            .repo
            .insert(&mut *tx, tenant_id, order.id, &payload.payment, cashier_id, user.id)
            .await?;
        self.order_repo
            .add_amount_paid(&mut *tx, tenant_id, order.id, payment.amount_paid)
            .await?;
        self.cashier.mirror_cash(&mut tx, tenant_id, &payment, user.id).await?;

        let entry = NewLogEntry::new(LogType::Caixa, user.id, received_payment_log_text(&payment))
            .order(order.id)
            .customer(order.customer_id)
            .cashier(cashier_id)
            .currency(payment.amount_paid)
            .route("/fiado", "Receber fiado")
            .metadata(json!({ "payment_id": payment.id, "troco": payment.troco }));
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;

        tracing::info!(order_id = %order.id, payment_id = %payment.id, "Pagamento recebido");
        Ok(payment)
    }

    /// Corrige um pagamento; o pedido e o caixa acompanham a diferença.
    pub async fn update_payment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        payment_id: Uuid,
        patch: &PaymentPatch,
        user: &User,
    ) -> Result<OrderPayment, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        let mut payment = self.repo.lock_by_id(&mut *tx, tenant_id, payment_id).await?;
        let order = self.order_repo.lock_by_id(&mut *tx, tenant_id, payment.order_id).await?;
        if order.status == OrderStatus::Canceled {
            return Err(AppError::OrderCanceled);
        }

        let cash_before = payment.net_cash();
        let cashier_before = payment.cashier_id;
        let delta = patch.apply_to(&mut payment);
        let payment = self.repo.save(&mut *tx, &payment).await?;

        if !delta.is_zero() {
            self.order_repo
                .add_amount_paid(&mut *tx, tenant_id, payment.order_id, delta)
                .await?;
        }

        // Troca de caixa: estorna no antigo e lança tudo no novo
        if cashier_before != payment.cashier_id {
            if let Some(previous) = cashier_before {
                let moved_out = OrderPayment { cashier_id: Some(previous), ..payment.clone() };
                self.cashier
                    .mirror_cash_delta(&mut tx, tenant_id, &moved_out, -cash_before, user.id)
                    .await?;
            }
            self.cashier
                .mirror_cash_delta(&mut tx, tenant_id, &payment, payment.net_cash(), user.id)
                .await?;
        } else {
            self.cashier
                .mirror_cash_delta(&mut tx, tenant_id, &payment, payment.net_cash() - cash_before, user.id)
                .await?;
        }

        let entry = NewLogEntry::new(
            LogType::System,
            user.id,
            format!(
                "{} atualizou o pagamento {} do pedido {} para {}",
                user.username,
                payment.id,
                payment.order_id,
                format_brl(payment.amount_paid)
            ),
        )
        .order(payment.order_id)
        .customer(order.customer_id)
        .cashier(payment.cashier_id)
        .currency(delta)
        .route("/pedidos", "Editar pagamento");
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(payment)
    }

    pub async fn payments_for_order<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Vec<OrderPayment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list_by_order(executor, tenant_id, order_id).await
    }

    pub async fn pending_fiado<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<PendingFiado>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.order_repo.list_pending_fiado(executor, tenant_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        common::test_support::{counter_info, item, TestStore},
        models::{order::CreateFiadoOrderPayload, payment::PaymentMethod},
    };
    use chrono::Utc;

    fn payment(method: PaymentMethod, amount: Decimal, troco: Decimal) -> OrderPayment {
        OrderPayment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            order_id: Uuid::nil(),
            payment_method: method,
            amount_paid: amount,
            troco,
            cashier_id: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn paid_order_log_mentions_change_only_when_given() {
        let without = payment(PaymentMethod::Pix, Decimal::new(3000, 2), Decimal::ZERO);
        assert_eq!(
            order_payment_log_text(&without),
            format!("Pedido realizado com pagamento de R$ 30,00 para pedido {}", Uuid::nil())
        );

        let with = payment(PaymentMethod::Dinheiro, Decimal::from(50), Decimal::from(5));
        assert!(order_payment_log_text(&with).ends_with(" com troco de R$ 5,00"));
    }

    #[test]
    fn received_payment_log_names_method() {
        let p = payment(PaymentMethod::CartaoDebito, Decimal::from(42), Decimal::ZERO);
        assert_eq!(
            received_payment_log_text(&p),
            format!("Pagamento com CARTAO_DEBITO realizado, valor pago: R$ 42,00 - Pedido: {}", Uuid::nil())
        );
    }

    async fn open_fiado(store: &TestStore) -> Order {
        let customer = store.customer(100).await;
        let (_, product) = store.product(10, 20).await;
        let payload = CreateFiadoOrderPayload {
            order_items: vec![item(&product, 2)],
            order_info: counter_info(Some(customer.id), 40, None),
        };
        store
            .state
            .order_service
            .create_fiado_order(store.pool(), store.tenant_id, &payload, &store.owner)
            .await
            .unwrap()
            .order
    }

    fn receive(cashier_id: Option<Uuid>, method: PaymentMethod, amount: i64) -> ReceivePaymentPayload {
        ReceivePaymentPayload {
            cashier_id,
            payment: NewPayment {
                payment_method: method,
                amount_paid: Decimal::from(amount),
                troco: Decimal::ZERO,
            },
        }
    }

    #[tokio::test]
    async fn cash_fiado_payment_needs_a_cashier() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let payments = &store.state.payment_service;
        let order = open_fiado(&store).await;

        let err = payments
            .receive_payment(
                store.pool(),
                store.tenant_id,
                order.id,
                &receive(None, PaymentMethod::Dinheiro, 15),
                &store.owner,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CashWithoutCashier));
        assert!(payments.payments_for_order(store.pool(), store.tenant_id, order.id).await.unwrap().is_empty());

        let cashier = store.cashier().await;
        payments
            .receive_payment(
                store.pool(),
                store.tenant_id,
                order.id,
                &receive(Some(cashier.id), PaymentMethod::Dinheiro, 15),
                &store.owner,
            )
            .await
            .unwrap();

        let mut conn = store.pool().acquire().await.unwrap();
        let detail = store
            .state
            .order_service
            .get_by_id(&mut conn, store.tenant_id, order.id)
            .await
            .unwrap();
        assert_eq!(detail.header.amount_paid, Decimal::from(15));
        assert_eq!(store.cashier_balance(cashier.id).await, Decimal::from(15));
    }

    #[tokio::test]
    async fn pix_fiado_payment_skips_the_cashier() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let order = open_fiado(&store).await;

        let payment = store
            .state
            .payment_service
            .receive_payment(
                store.pool(),
                store.tenant_id,
                order.id,
                &receive(None, PaymentMethod::Pix, 40),
                &store.owner,
            )
            .await
            .unwrap();
        assert_eq!(payment.cashier_id, None);

        let mut conn = store.pool().acquire().await.unwrap();
        let used = store
            .state
            .credit_service
            .used_credit(&mut conn, store.tenant_id, order.customer_id.unwrap())
            .await
            .unwrap();
        assert_eq!(used, Decimal::ZERO);
    }
}

