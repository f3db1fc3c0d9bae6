// src/models/logs.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "log_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogType {
    Caixa,  // Movimentações de dinheiro
    System, // Ciclo de vida dos pedidos
    Log,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Pagamento com PIX realizado, valor pago: R$ 30,00 - Pedido: 42")]
    pub text: String,
    pub log_type: LogType,
    pub created_by: Option<Uuid>,
    #[schema(value_type = Object)]
    pub metadata: Value,
    pub order_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,
    pub pathname: String,
    pub route_name: String,
    pub currency: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

/// Registro a ser gravado. Montado pelos services com o builder abaixo.
#[derive(Debug, Clone)]
pub struct NewLogEntry {
    pub text: String,
    pub log_type: LogType,
    pub created_by: Uuid,
    pub metadata: Value,
    pub order_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,
    pub pathname: String,
    pub route_name: String,
    pub currency: Option<Decimal>,
}

impl NewLogEntry {
    pub fn new(log_type: LogType, created_by: Uuid, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            log_type,
            created_by,
            metadata: Value::Object(Default::default()),
            order_id: None,
            customer_id: None,
            cashier_id: None,
            pathname: String::new(),
            route_name: String::new(),
            currency: None,
        }
    }

    pub fn order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn customer(mut self, customer_id: Option<Uuid>) -> Self {
        self.customer_id = customer_id;
        self
    }

    pub fn cashier(mut self, cashier_id: Option<Uuid>) -> Self {
        self.cashier_id = cashier_id;
        self
    }

    pub fn currency(mut self, amount: Decimal) -> Self {
        self.currency = Some(amount);
        self
    }

    pub fn route(mut self, pathname: &str, route_name: &str) -> Self {
        self.pathname = pathname.to_string();
        self.route_name = route_name.to_string();
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = metadata;
        self
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LogQuery {
    pub order_id: Option<Uuid>,
    pub customer_id: Option<Uuid>,
    pub log_type: Option<LogType>,
    /// Máximo de registros (1..=500, padrão 100).
    pub limit: Option<i64>,
}

impl LogQuery {
    pub fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(100).clamp(1, 500)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn builder_fills_context() {
        let order_id = Uuid::new_v4();
        let entry = NewLogEntry::new(LogType::Caixa, Uuid::new_v4(), "Pedido realizado")
            .order(order_id)
            .currency(Decimal::from(30))
            .route("/pedidos", "orders.create")
            .metadata(json!({ "troco": "0" }));

        assert_eq!(entry.order_id, Some(order_id));
        assert_eq!(entry.currency, Some(Decimal::from(30)));
        assert_eq!(entry.route_name, "orders.create");
        assert_eq!(entry.metadata["troco"], "0");
    }

    #[test]
    fn limit_is_clamped() {
        let query = LogQuery { order_id: None, customer_id: None, log_type: None, limit: Some(10_000) };
        assert_eq!(query.effective_limit(), 500);
        let query = LogQuery { limit: None, ..query };
        assert_eq!(query.effective_limit(), 100);
    }
}
