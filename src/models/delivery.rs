// src/models/delivery.rs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Endereço de entrega a ser geocodificado.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDistancePayload {
    #[validate(length(min = 8, max = 9, message = "CEP inválido."))]
    #[schema(example = "01310-100")]
    pub cep: String,
    #[schema(example = "SP")]
    pub state: String,
    #[schema(example = "São Paulo")]
    pub city: String,
    #[schema(example = "Bela Vista")]
    pub bairro: String,
    #[validate(length(min = 1, message = "A rua é obrigatória."))]
    #[schema(example = "Avenida Paulista")]
    pub street: String,
    #[schema(example = "1000")]
    pub number: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "Brasil".to_string()
}

impl DeliveryDistancePayload {
    /// "rua, número, bairro, cidade, estado, cep, país"
    pub fn query(&self) -> String {
        [
            &self.street,
            &self.number,
            &self.bairro,
            &self.city,
            &self.state,
            &self.cep,
            &self.country,
        ]
        .iter()
        .map(|part| part.trim())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryQuote {
    #[schema(example = 3.2)]
    pub distance_km: f64,
    #[schema(example = "4.80")]
    pub fee: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_skips_blank_parts() {
        let payload = DeliveryDistancePayload {
            cep: "01310-100".into(),
            state: "SP".into(),
            city: "São Paulo".into(),
            bairro: " ".into(),
            street: "Avenida Paulista".into(),
            number: "1000".into(),
            country: "Brasil".into(),
        };
        assert_eq!(payload.query(), "Avenida Paulista, 1000, São Paulo, SP, 01310-100, Brasil");
    }
}
