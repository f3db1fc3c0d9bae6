// src/models/payment.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::order::validate_not_negative;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "payment_method", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Dinheiro,
    Pix,
    CartaoCredito,
    CartaoDebito,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Dinheiro => "DINHEIRO",
            PaymentMethod::Pix => "PIX",
            PaymentMethod::CartaoCredito => "CARTAO_CREDITO",
            PaymentMethod::CartaoDebito => "CARTAO_DEBITO",
        }
    }

    /// Só dinheiro mexe no saldo físico do caixa.
    pub fn moves_cash(&self) -> bool {
        matches!(self, PaymentMethod::Dinheiro)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrderPayment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub order_id: Uuid,
    pub payment_method: PaymentMethod,
    #[schema(example = "30.00")]
    pub amount_paid: Decimal,
    #[schema(example = "0.00")]
    pub troco: Decimal,
    pub cashier_id: Option<Uuid>,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

impl OrderPayment {
    /// Entrada líquida de dinheiro no caixa (pago - troco).
    pub fn net_cash(&self) -> Decimal {
        net_cash(self.payment_method, self.amount_paid, self.troco)
    }
}

pub fn net_cash(method: PaymentMethod, amount_paid: Decimal, troco: Decimal) -> Decimal {
    if method.moves_cash() {
        amount_paid - troco
    } else {
        Decimal::ZERO
    }
}

/// Pagamento informado na criação de um pedido pago.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewPayment {
    pub payment_method: PaymentMethod,

    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = "30.00")]
    pub amount_paid: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub troco: Decimal,
}

/// Soma de todos os valores pagos.
pub fn total_paid(payments: &[NewPayment]) -> Decimal {
    payments.iter().map(|p| p.amount_paid).sum()
}

/// "Receber fiado": pagamento avulso para um pedido existente.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReceivePaymentPayload {
    pub cashier_id: Option<Uuid>,
    #[validate(nested)]
    #[serde(flatten)]
    pub payment: NewPayment,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPatch {
    pub payment_method: Option<PaymentMethod>,
    #[validate(custom(function = "validate_not_negative"))]
    pub amount_paid: Option<Decimal>,
    #[validate(custom(function = "validate_not_negative"))]
    pub troco: Option<Decimal>,
    pub cashier_id: Option<Uuid>,
}

impl PaymentPatch {
    /// Aplica o patch e devolve a variação de `amount_paid` para o pedido.
    pub fn apply_to(&self, payment: &mut OrderPayment) -> Decimal {
        let before = payment.amount_paid;
        if let Some(method) = self.payment_method {
            payment.payment_method = method;
        }
        if let Some(amount) = self.amount_paid {
            payment.amount_paid = amount;
        }
        if let Some(troco) = self.troco {
            payment.troco = troco;
        }
        if let Some(cashier_id) = self.cashier_id {
            payment.cashier_id = Some(cashier_id);
        }
        payment.amount_paid - before
    }
}

/// Pedido fiado em aberto, com o nome do cliente (tela de recebimento).
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingFiado {
    pub order_id: Uuid,
    pub customer_id: Option<Uuid>,
    pub customer_name: Option<String>,
    pub total: Decimal,
    pub amount_paid: Decimal,
    pub outstanding: Decimal,
    pub expire_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payment(method: PaymentMethod, amount: i64, troco: i64) -> NewPayment {
        NewPayment {
            payment_method: method,
            amount_paid: Decimal::from(amount),
            troco: Decimal::from(troco),
        }
    }

    #[test]
    fn total_paid_sums_split_payments() {
        let payments = vec![payment(PaymentMethod::Dinheiro, 30, 0), payment(PaymentMethod::Pix, 25, 0)];
        assert_eq!(total_paid(&payments), Decimal::from(55));
    }

    #[test]
    fn only_cash_moves_the_cashier() {
        assert_eq!(net_cash(PaymentMethod::Dinheiro, Decimal::from(50), Decimal::from(5)), Decimal::from(45));
        assert_eq!(net_cash(PaymentMethod::CartaoDebito, Decimal::from(50), Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn patch_reports_amount_delta() {
        let mut stored = OrderPayment {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            order_id: Uuid::new_v4(),
            payment_method: PaymentMethod::Pix,
            amount_paid: Decimal::from(20),
            troco: Decimal::ZERO,
            cashier_id: None,
            created_by: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        let patch = PaymentPatch {
            amount_paid: Some(Decimal::from(35)),
            ..Default::default()
        };

        assert_eq!(patch.apply_to(&mut stored), Decimal::from(15));
        assert_eq!(stored.payment_method, PaymentMethod::Pix);
    }

    #[test]
    fn negative_amount_is_rejected() {
        assert!(payment(PaymentMethod::Pix, -1, 0).validate().is_err());
    }

    #[test]
    fn receive_payload_accepts_flat_json() {
        let json = serde_json::json!({
            "cashierId": null,
            "paymentMethod": "PIX",
            "amountPaid": 12.5
        });
        let payload: ReceivePaymentPayload = serde_json::from_value(json).unwrap();
        assert_eq!(payload.payment.payment_method, PaymentMethod::Pix);
        assert_eq!(payload.payment.troco, Decimal::ZERO);
    }
}
