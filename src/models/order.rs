// src/models/order.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::payment::{NewPayment, OrderPayment};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderType {
    Delivery,
    Balcao,
    Retirada,
}

/// Ciclo de vida do pedido.
///
/// ```text
/// PENDING -> CONFIRMED -> PREPARING -> ON THE WAY -> DELIVERED
///    \___________\____________\____________\______-> CANCELED | ENDED
/// ```
/// DELIVERED, CANCELED e ENDED são terminais.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "order_status")]
pub enum OrderStatus {
    #[sqlx(rename = "PENDING")]
    #[serde(rename = "PENDING")]
    Pending,
    #[sqlx(rename = "CONFIRMED")]
    #[serde(rename = "CONFIRMED")]
    Confirmed,
    #[sqlx(rename = "PREPARING")]
    #[serde(rename = "PREPARING")]
    Preparing,
    #[sqlx(rename = "ON THE WAY")]
    #[serde(rename = "ON THE WAY")]
    OnTheWay,
    #[sqlx(rename = "DELIVERED")]
    #[serde(rename = "DELIVERED")]
    Delivered,
    #[sqlx(rename = "CANCELED")]
    #[serde(rename = "CANCELED")]
    Canceled,
    #[sqlx(rename = "ENDED")]
    #[serde(rename = "ENDED")]
    Ended,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 7] = [
        OrderStatus::Pending,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::OnTheWay,
        OrderStatus::Delivered,
        OrderStatus::Canceled,
        OrderStatus::Ended,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "PENDING",
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Preparing => "PREPARING",
            OrderStatus::OnTheWay => "ON THE WAY",
            OrderStatus::Delivered => "DELIVERED",
            OrderStatus::Canceled => "CANCELED",
            OrderStatus::Ended => "ENDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatus::Delivered | OrderStatus::Canceled | OrderStatus::Ended)
    }

    /// Pedido que não aceita mais edição nem cancelamento.
    pub fn is_closed(&self) -> bool {
        matches!(self, OrderStatus::Canceled | OrderStatus::Ended)
    }

    /// Estados alcançáveis a partir deste.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Preparing, OnTheWay, Delivered, Canceled, Ended],
            Confirmed => &[Preparing, OnTheWay, Delivered, Canceled, Ended],
            Preparing => &[OnTheWay, Delivered, Canceled, Ended],
            OnTheWay => &[Delivered, Canceled, Ended],
            Delivered | Canceled | Ended => &[],
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// --- Structs ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub address_id: Option<Uuid>,
    pub order_type: OrderType,
    pub status: OrderStatus,
    pub is_fiado: bool,
    #[schema(example = "55.00")]
    pub total: Decimal,
    #[schema(example = "55.00")]
    pub amount_paid: Decimal,
    #[schema(example = "5.00")]
    pub taxa_entrega: Option<Decimal>,
    pub motoboy_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,
    #[schema(example = "Entregar no portão lateral")]
    pub observation: String,
    pub expire_at: Option<DateTime<Utc>>,
    pub stock_applied: bool,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Quanto ainda falta pagar (nunca negativo).
    pub fn outstanding(&self) -> Decimal {
        (self.total - self.amount_paid).max(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    #[schema(example = "2")]
    pub quantity: Decimal,
    #[schema(example = "12.50")]
    pub price: Decimal,
}

// Leitura de pedido com o nome do cliente (listagens)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub order: Order,
    pub customer_name: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderDetail {
    #[serde(flatten)]
    pub header: Order,
    pub customer_name: Option<String>,
    pub items: Vec<OrderItem>,
    pub payments: Vec<OrderPayment>,
}

/// Resposta das três operações de criação.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub order: Order,
    pub order_items: Vec<OrderItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payments: Option<Vec<OrderPayment>>,
}

// --- Payloads ---

pub(crate) fn validate_not_negative(val: &Decimal) -> Result<(), ValidationError> {
    if val.is_sign_negative() && !val.is_zero() {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor não pode ser negativo.".into());
        return Err(err);
    }
    Ok(())
}

pub(crate) fn validate_positive(val: &Decimal) -> Result<(), ValidationError> {
    if *val <= Decimal::ZERO {
        let mut err = ValidationError::new("range");
        err.message = Some("O valor deve ser maior que zero.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: Uuid,

    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "2")]
    pub quantity: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "12.50")]
    pub price: Decimal,
}

/// Cabeçalho comum às três formas de criação de pedido.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderInfo {
    pub customer_id: Option<Uuid>,
    pub address_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "50.00")]
    pub total: Decimal,

    #[serde(default)]
    pub observation: String,

    pub order_type: OrderType,
    pub motoboy_id: Option<Uuid>,
    pub cashier_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    pub taxa_entrega: Option<Decimal>,
}

impl OrderInfo {
    /// O total gravado sempre inclui a taxa de entrega.
    pub fn stored_total(&self) -> Decimal {
        self.total + self.taxa_entrega.unwrap_or(Decimal::ZERO)
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFiadoOrderPayload {
    #[validate(length(min = 1, message = "O pedido precisa de pelo menos um item."), nested)]
    pub order_items: Vec<NewOrderItem>,
    #[validate(nested)]
    pub order_info: OrderInfo,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaidOrderPayload {
    #[validate(length(min = 1, message = "O pedido precisa de pelo menos um item."), nested)]
    pub order_items: Vec<NewOrderItem>,
    #[validate(nested)]
    pub order_info: OrderInfo,
    #[validate(length(min = 1, message = "Informe pelo menos um pagamento."), nested)]
    pub payment_info: Vec<NewPayment>,
}

pub type CreateWaitingOrderPayload = CreateFiadoOrderPayload;

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    pub status: OrderStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateExpireDatePayload {
    pub expire_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCourierPayload {
    pub motoboy_id: Uuid,
}

/// Atualização completa de um pedido: cabeçalho + novo conjunto de itens.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderUpdate {
    #[validate(custom(function = "validate_not_negative"))]
    pub total: Decimal,
    pub observation: Option<String>,
    pub motoboy_id: Option<Uuid>,
    #[validate(custom(function = "validate_not_negative"))]
    pub taxa_entrega: Option<Decimal>,
    #[validate(length(min = 1, message = "O pedido precisa de pelo menos um item."), nested)]
    pub items: Vec<NewOrderItem>,
}

impl OrderUpdate {
    /// Aplica os campos do patch sobre o pedido persistido.
    pub fn apply_to(&self, order: &mut Order) {
        order.taxa_entrega = self.taxa_entrega.or(order.taxa_entrega);
        order.total = self.total + order.taxa_entrega.unwrap_or(Decimal::ZERO);
        if let Some(observation) = &self.observation {
            order.observation = observation.clone();
        }
        if let Some(motoboy_id) = self.motoboy_id {
            order.motoboy_id = Some(motoboy_id);
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_order(status: OrderStatus) -> Order {
        let now = Utc::now();
        Order {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            customer_id: Some(Uuid::new_v4()),
            address_id: None,
            order_type: OrderType::Balcao,
            status,
            is_fiado: false,
            total: Decimal::from(50),
            amount_paid: Decimal::ZERO,
            taxa_entrega: None,
            motoboy_id: None,
            cashier_id: None,
            observation: String::new(),
            expire_at: None,
            stock_applied: false,
            created_by: Uuid::new_v4(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn happy_path_is_allowed() {
        use OrderStatus::*;
        let path = [Pending, Confirmed, Preparing, OnTheWay, Delivered];
        for pair in path.windows(2) {
            assert!(pair[0].can_transition_to(pair[1]), "{} -> {}", pair[0], pair[1]);
        }
    }

    #[test]
    fn cancel_and_end_reachable_from_every_non_terminal_state() {
        for status in OrderStatus::ALL.iter().filter(|s| !s.is_terminal()) {
            assert!(status.can_transition_to(OrderStatus::Canceled));
            assert!(status.can_transition_to(OrderStatus::Ended));
        }
    }

    #[test]
    fn terminal_states_have_no_way_out() {
        for status in [OrderStatus::Delivered, OrderStatus::Canceled, OrderStatus::Ended] {
            for next in OrderStatus::ALL {
                assert!(!status.can_transition_to(next), "{status} -> {next}");
            }
        }
    }

    #[test]
    fn delivered_back_to_pending_is_rejected() {
        assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn no_backwards_moves() {
        assert!(!OrderStatus::Preparing.can_transition_to(OrderStatus::Confirmed));
        assert!(!OrderStatus::OnTheWay.can_transition_to(OrderStatus::Pending));
    }

    #[test]
    fn status_serializes_with_space() {
        let json = serde_json::to_string(&OrderStatus::OnTheWay).unwrap();
        assert_eq!(json, "\"ON THE WAY\"");
        let parsed: OrderStatus = serde_json::from_str("\"ON THE WAY\"").unwrap();
        assert_eq!(parsed, OrderStatus::OnTheWay);
    }

    #[test]
    fn stored_total_includes_delivery_fee() {
        let info = OrderInfo {
            customer_id: None,
            address_id: None,
            total: Decimal::from(50),
            observation: String::new(),
            order_type: OrderType::Delivery,
            motoboy_id: None,
            cashier_id: None,
            taxa_entrega: Some(Decimal::from(7)),
        };
        assert_eq!(info.stored_total(), Decimal::from(57));

        let counter = OrderInfo { taxa_entrega: None, ..info };
        assert_eq!(counter.stored_total(), Decimal::from(50));
    }

    #[test]
    fn order_update_recomputes_total_with_existing_fee() {
        let mut order = sample_order(OrderStatus::Confirmed);
        order.taxa_entrega = Some(Decimal::from(5));

        let update = OrderUpdate {
            total: Decimal::from(80),
            observation: Some("sem cebola".into()),
            motoboy_id: None,
            taxa_entrega: None,
            items: vec![],
        };
        update.apply_to(&mut order);

        assert_eq!(order.total, Decimal::from(85));
        assert_eq!(order.observation, "sem cebola");
        assert_eq!(order.taxa_entrega, Some(Decimal::from(5)));
    }

    #[test]
    fn outstanding_never_negative() {
        let mut order = sample_order(OrderStatus::Delivered);
        order.amount_paid = Decimal::from(70);
        assert_eq!(order.outstanding(), Decimal::ZERO);
    }

    #[test]
    fn items_must_have_positive_quantity() {
        let item = NewOrderItem {
            product_id: Uuid::new_v4(),
            quantity: Decimal::ZERO,
            price: Decimal::from(3),
        };
        assert!(item.validate().is_err());
    }

    #[test]
    fn paid_order_needs_items_and_payments() {
        let payload: CreatePaidOrderPayload = serde_json::from_value(serde_json::json!({
            "orderItems": [],
            "orderInfo": { "total": 10, "orderType": "BALCAO" },
            "paymentInfo": []
        }))
        .unwrap();

        let errors = payload.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("order_items"));
        assert!(fields.contains_key("payment_info"));
    }

    #[test]
    fn nested_item_errors_are_reported() {
        let payload: CreateFiadoOrderPayload = serde_json::from_value(serde_json::json!({
            "orderItems": [{ "productId": Uuid::new_v4(), "quantity": 0, "price": 3 }],
            "orderInfo": { "total": 10, "orderType": "BALCAO" }
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }
}
