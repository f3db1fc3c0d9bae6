// src/models/cashier.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::order::{validate_not_negative, validate_positive};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "cashier_direction", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashierDirection {
    Entrada, // Soma no saldo
    Saida,   // Subtrai do saldo
}

impl CashierDirection {
    pub fn opposite(&self) -> Self {
        match self {
            CashierDirection::Entrada => CashierDirection::Saida,
            CashierDirection::Saida => CashierDirection::Entrada,
        }
    }

    /// Valor com sinal aplicado ao saldo do caixa.
    pub fn signed(&self, amount: Decimal) -> Decimal {
        match self {
            CashierDirection::Entrada => amount,
            CashierDirection::Saida => -amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Cashier {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Caixa 1")]
    pub name: String,
    /// Saldo em dinheiro, mantido a cada movimentação.
    #[schema(example = "150.00")]
    pub currency: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashierTransaction {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub cashier_id: Uuid,
    pub order_id: Option<Uuid>,
    pub payment_id: Option<Uuid>,
    #[schema(example = "45.00")]
    pub amount: Decimal,
    pub direction: CashierDirection,
    pub description: String,
    pub created_by: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Movimentação a ser gravada (vinda da API ou gerada por um pagamento).
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCashierTransaction {
    #[validate(custom(function = "validate_positive"))]
    #[schema(example = "20.00")]
    pub amount: Decimal,
    pub direction: CashierDirection,
    #[serde(default)]
    #[schema(example = "Sangria")]
    pub description: String,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    #[serde(default)]
    pub payment_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InsertTransactionsPayload {
    #[validate(length(min = 1, message = "Informe pelo menos uma movimentação."), nested)]
    pub transactions: Vec<NewCashierTransaction>,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateCashierPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CashierPatch {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
}

impl CashierPatch {
    pub fn apply_to(&self, cashier: &mut Cashier) {
        if let Some(name) = &self.name {
            cashier.name = name.clone();
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryFee {
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "1.50")]
    pub taxa_por_km: Decimal,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateDeliveryFeePayload {
    #[validate(custom(function = "validate_not_negative"))]
    pub taxa_por_km: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sign() {
        let amount = Decimal::from(10);
        assert_eq!(CashierDirection::Entrada.signed(amount), Decimal::from(10));
        assert_eq!(CashierDirection::Saida.signed(amount), Decimal::from(-10));
    }

    #[test]
    fn reversal_cancels_out() {
        let amount = Decimal::new(4550, 2);
        let direction = CashierDirection::Entrada;
        assert_eq!(
            direction.signed(amount) + direction.opposite().signed(amount),
            Decimal::ZERO
        );
    }

    #[test]
    fn zero_amount_transaction_is_invalid() {
        let tx = NewCashierTransaction {
            amount: Decimal::ZERO,
            direction: CashierDirection::Saida,
            description: String::new(),
            order_id: None,
            payment_id: None,
        };
        assert!(tx.validate().is_err());
    }

    #[test]
    fn empty_transaction_batch_is_invalid() {
        let payload = InsertTransactionsPayload { transactions: vec![] };
        assert!(payload.validate().is_err());
    }
}
