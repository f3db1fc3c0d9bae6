// src/services/cashier_service.rs

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::{Acquire, Executor, PgConnection, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, format::format_brl},
    db::CashierRepository,
    models::{
        auth::User,
        cashier::{
            Cashier, CashierDirection, CashierPatch, CashierTransaction, DeliveryFee,
            NewCashierTransaction,
        },
        logs::{LogType, NewLogEntry},
        payment::OrderPayment,
    },
    services::audit_service::AuditService,
};

#[derive(Clone)]
pub struct CashierService {
    repo: CashierRepository,
    audit: AuditService,
}

impl CashierService {
    pub fn new(repo: CashierRepository, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    // --- Núcleo: cada movimentação anda junto com exatamente um ajuste de saldo ---

    pub(crate) async fn post_transaction(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        cashier_id: Uuid,
        tx: &NewCashierTransaction,
        created_by: Uuid,
    ) -> Result<CashierTransaction, AppError> {
        let row = self
            .repo
            .insert_transaction(&mut *conn, tenant_id, cashier_id, tx, created_by)
            .await?;
        self.repo
            .apply_balance_delta(&mut *conn, tenant_id, cashier_id, tx.direction.signed(tx.amount))
            .await?;
        Ok(row)
    }

    /// Espelha no caixa a parte em dinheiro de um pagamento (pago - troco).
    pub(crate) async fn mirror_cash(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payment: &OrderPayment,
        created_by: Uuid,
    ) -> Result<Option<CashierTransaction>, AppError> {
        let net = payment.net_cash();
        if net <= Decimal::ZERO {
            return Ok(None);
        }
        let cashier_id = payment.cashier_id.ok_or(AppError::CashWithoutCashier)?;

        let tx = NewCashierTransaction {
            amount: net,
            direction: CashierDirection::Entrada,
            description: format!("Pagamento em dinheiro - Pedido: {}", payment.order_id),
            order_id: Some(payment.order_id),
            payment_id: Some(payment.id),
        };
        self.post_transaction(conn, tenant_id, cashier_id, &tx, created_by)
            .await
            .map(Some)
    }

    /// Lança a diferença de dinheiro líquido após a edição de um pagamento.
    pub(crate) async fn mirror_cash_delta(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        payment: &OrderPayment,
        delta: Decimal,
        created_by: Uuid,
    ) -> Result<Option<CashierTransaction>, AppError> {
        if delta.is_zero() {
            return Ok(None);
        }
        let cashier_id = payment.cashier_id.ok_or(AppError::CashWithoutCashier)?;

        let direction = if delta > Decimal::ZERO {
            CashierDirection::Entrada
        } else {
            CashierDirection::Saida
        };
        let tx = NewCashierTransaction {
            amount: delta.abs(),
            direction,
            description: format!("Ajuste de pagamento - Pedido: {}", payment.order_id),
            order_id: Some(payment.order_id),
            payment_id: Some(payment.id),
        };
        self.post_transaction(conn, tenant_id, cashier_id, &tx, created_by)
            .await
            .map(Some)
    }

    /// Estorna cada movimentação ligada ao pedido com uma de sentido oposto.
    pub(crate) async fn reverse_for_order(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        order_id: Uuid,
        created_by: Uuid,
    ) -> Result<Vec<CashierTransaction>, AppError> {
        let originals = self
            .repo
            .transactions_for_order(&mut *conn, tenant_id, order_id)
            .await?;

        let mut reversals = Vec::with_capacity(originals.len());
        for original in originals {
            let tx = NewCashierTransaction {
                amount: original.amount,
                direction: original.direction.opposite(),
                description: format!("Estorno: {}", original.description),
                order_id: Some(order_id),
                payment_id: original.payment_id,
            };
            let row = self
                .post_transaction(&mut *conn, tenant_id, original.cashier_id, &tx, created_by)
                .await?;
            reversals.push(row);
        }
        Ok(reversals)
    }

    // --- API de caixas ---

    pub async fn insert_transactions<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
        transactions: &[NewCashierTransaction],
        user: &User,
    ) -> Result<Vec<CashierTransaction>, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;

        // Garante 404 antes de tentar inserir
        self.repo.find_by_id(&mut *tx, tenant_id, cashier_id).await?;

        let mut rows = Vec::with_capacity(transactions.len());
        for new_tx in transactions {
            let row = self
                .post_transaction(&mut tx, tenant_id, cashier_id, new_tx, user.id)
                .await?;

            let verb = match new_tx.direction {
                CashierDirection::Entrada => "Entrada",
                CashierDirection::Saida => "Saída",
            };
            let entry = NewLogEntry::new(
                LogType::Caixa,
                user.id,
                format!("{} de {} no caixa: {}", verb, format_brl(new_tx.amount), new_tx.description),
            )
            .cashier(Some(cashier_id))
            .currency(new_tx.direction.signed(new_tx.amount))
            .route("/caixas", "Movimentar caixa")
            .metadata(json!({ "transaction_id": row.id, "order_id": new_tx.order_id }));
            self.audit.record(&mut tx, tenant_id, entry).await;

            rows.push(row);
        }

        tx.commit().await?;
        Ok(rows)
    }

    pub async fn insert_transaction<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
        transaction: NewCashierTransaction,
        user: &User,
    ) -> Result<CashierTransaction, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut rows = self
            .insert_transactions(executor, tenant_id, cashier_id, std::slice::from_ref(&transaction), user)
            .await?;
        rows.pop()
            .ok_or_else(|| AppError::InternalServerError(anyhow::anyhow!("movimentação não retornada")))
    }

    pub async fn create<'e, E>(&self, executor: E, tenant_id: Uuid, name: &str) -> Result<Cashier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.create(executor, tenant_id, name).await
    }

    pub async fn list<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Vec<Cashier>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.list(executor, tenant_id).await
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, cashier_id: Uuid) -> Result<Cashier, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.find_by_id(executor, tenant_id, cashier_id).await
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        cashier_id: Uuid,
        patch: &CashierPatch,
    ) -> Result<Cashier, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let mut cashier = self.repo.find_by_id(&mut *tx, tenant_id, cashier_id).await?;
        patch.apply_to(&mut cashier);
        let cashier = self.repo.rename(&mut *tx, &cashier).await?;
        tx.commit().await?;
        Ok(cashier)
    }

    /// Só caixa zerado e sem movimentações pode ser removido.
    pub async fn delete<'e, E>(&self, executor: E, tenant_id: Uuid, cashier_id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        self.repo.find_by_id(&mut *tx, tenant_id, cashier_id).await?;
        if !self.repo.delete_if_empty(&mut *tx, tenant_id, cashier_id).await? {
            return Err(AppError::CashierNotEmpty);
        }
        tx.commit().await?;
        Ok(())
    }

    pub async fn list_transactions(
        &self,
        conn: &mut PgConnection,
        tenant_id: Uuid,
        cashier_id: Uuid,
    ) -> Result<Vec<CashierTransaction>, AppError> {
        self.repo.find_by_id(&mut *conn, tenant_id, cashier_id).await?;
        self.repo.list_transactions(conn, tenant_id, cashier_id).await
    }

    // --- Taxa de entrega (junto do caixa: mesma permissão) ---

    pub async fn get_delivery_fee<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<DeliveryFee, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.get_delivery_fee(executor, tenant_id).await
    }

    pub async fn update_delivery_fee<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        taxa_por_km: Decimal,
        user: &User,
    ) -> Result<DeliveryFee, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        let mut tx = executor.begin().await?;
        let fee = self.repo.upsert_delivery_fee(&mut *tx, tenant_id, taxa_por_km).await?;

        let entry = NewLogEntry::new(
            LogType::System,
            user.id,
            format!("{} alterou a taxa por km para {}", user.username, format_brl(taxa_por_km)),
        )
        .route("/configuracoes", "Taxa de entrega");
        self.audit.record(&mut tx, tenant_id, entry).await;

        tx.commit().await?;
        Ok(fee)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_support::TestStore;

    fn movement(direction: CashierDirection, amount: i64, description: &str) -> NewCashierTransaction {
        NewCashierTransaction {
            amount: Decimal::from(amount),
            direction,
            description: description.into(),
            order_id: None,
            payment_id: None,
        }
    }

    #[tokio::test]
    async fn balance_follows_every_movement() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let cashiers = &store.state.cashier_service;
        let cashier = store.cashier().await;

        let batch = [
            movement(CashierDirection::Entrada, 100, "Abertura"),
            movement(CashierDirection::Saida, 30, "Sangria"),
        ];
        let rows = cashiers
            .insert_transactions(store.pool(), store.tenant_id, cashier.id, &batch, &store.owner)
            .await
            .unwrap();
        assert_eq!(rows.len(), 2);

        let mut conn = store.pool().acquire().await.unwrap();
        let ledger = cashiers
            .list_transactions(&mut conn, store.tenant_id, cashier.id)
            .await
            .unwrap();
        let net: Decimal = ledger.iter().map(|t| t.direction.signed(t.amount)).sum();

        assert_eq!(net, Decimal::from(70));
        assert_eq!(store.cashier_balance(cashier.id).await, net);
    }

    #[tokio::test]
    async fn unknown_cashier_takes_no_movement() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let err = store
            .state
            .cashier_service
            .insert_transactions(
                store.pool(),
                store.tenant_id,
                Uuid::new_v4(),
                &[movement(CashierDirection::Entrada, 10, "Troco")],
                &store.owner,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CashierNotFound));
    }
}
