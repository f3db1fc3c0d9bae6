// src/models/customer.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::order::validate_not_negative;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Mercadinho São José")]
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cellphone: Option<String>,
    #[schema(example = "12.345.678/0001-90")]
    pub cpf_cnpj: Option<String>,
    pub is_retail: bool,
    #[schema(example = "500.00")]
    pub max_credit: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    pub customer_id: Uuid,
    #[schema(example = "01310-100")]
    pub cep: String,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub neighborhood: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    /// Distância até o depósito, em km.
    pub distance: Option<f64>,
    pub created_at: DateTime<Utc>,
}

/// Cliente com os endereços e o crédito já comprometido em fiado.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerWithAddresses {
    #[serde(flatten)]
    pub customer: Customer,
    pub used_credit: Decimal,
    pub addresses: Vec<Address>,
}

/// Situação de crédito de um cliente num instante.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreditSnapshot {
    pub customer_id: Uuid,
    pub max_credit: Decimal,
    pub used_credit: Decimal,
    pub pending_expired: i64,
}

impl CreditSnapshot {
    pub fn available(&self) -> Decimal {
        self.max_credit - self.used_credit
    }
}

// --- Payloads ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: String,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub phone: Option<String>,
    pub cellphone: Option<String>,
    pub cpf_cnpj: Option<String>,

    #[serde(default = "default_true")]
    pub is_retail: bool,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub max_credit: Decimal,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub name: Option<String>,
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub cellphone: Option<String>,
    pub cpf_cnpj: Option<String>,
    pub is_retail: Option<bool>,
    #[validate(custom(function = "validate_not_negative"))]
    pub max_credit: Option<Decimal>,
}

impl CustomerPatch {
    pub fn apply_to(&self, customer: &mut Customer) {
        if let Some(name) = &self.name {
            customer.name = name.clone();
        }
        if let Some(email) = &self.email {
            customer.email = Some(email.clone());
        }
        if let Some(phone) = &self.phone {
            customer.phone = Some(phone.clone());
        }
        if let Some(cellphone) = &self.cellphone {
            customer.cellphone = Some(cellphone.clone());
        }
        if let Some(cpf_cnpj) = &self.cpf_cnpj {
            customer.cpf_cnpj = Some(cpf_cnpj.clone());
        }
        if let Some(is_retail) = self.is_retail {
            customer.is_retail = is_retail;
        }
        if let Some(max_credit) = self.max_credit {
            customer.max_credit = max_credit;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    #[validate(length(min = 8, max = 9, message = "CEP inválido."))]
    #[schema(example = "01310-100")]
    pub cep: String,
    #[validate(length(min = 1, message = "A rua é obrigatória."))]
    pub street: String,
    #[validate(length(min = 1, message = "O número é obrigatório."))]
    pub number: String,
    pub complement: Option<String>,
    #[validate(length(min = 1, message = "O bairro é obrigatório."))]
    pub neighborhood: String,
    #[validate(length(min = 1, message = "A cidade é obrigatória."))]
    pub city: String,
    #[validate(length(equal = 2, message = "Use a sigla do estado (ex: SP)."))]
    pub state: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: Option<f64>,
    #[validate(range(min = 0.0))]
    pub distance: Option<f64>,
}

fn default_country() -> String {
    "BR".to_string()
}

#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddressPatch {
    #[validate(length(min = 8, max = 9, message = "CEP inválido."))]
    pub cep: Option<String>,
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub neighborhood: Option<String>,
    pub city: Option<String>,
    #[validate(length(equal = 2, message = "Use a sigla do estado (ex: SP)."))]
    pub state: Option<String>,
    pub country: Option<String>,
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lon: Option<f64>,
    #[validate(range(min = 0.0))]
    pub distance: Option<f64>,
}

impl AddressPatch {
    pub fn apply_to(&self, address: &mut Address) {
        fn set(target: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                *target = v.clone();
            }
        }
        set(&mut address.cep, &self.cep);
        set(&mut address.street, &self.street);
        set(&mut address.number, &self.number);
        set(&mut address.neighborhood, &self.neighborhood);
        set(&mut address.city, &self.city);
        set(&mut address.state, &self.state);
        set(&mut address.country, &self.country);
        if self.complement.is_some() {
            address.complement = self.complement.clone();
        }
        if self.lat.is_some() {
            address.lat = self.lat;
        }
        if self.lon.is_some() {
            address.lon = self.lon;
        }
        if self.distance.is_some() {
            address.distance = self.distance;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_customer() -> Customer {
        let now = Utc::now();
        Customer {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "Bar do Zé".into(),
            email: None,
            phone: Some("1133334444".into()),
            cellphone: None,
            cpf_cnpj: None,
            is_retail: true,
            max_credit: Decimal::from(100),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn patch_touches_only_given_fields() {
        let mut customer = sample_customer();
        let patch = CustomerPatch {
            max_credit: Some(Decimal::from(250)),
            ..Default::default()
        };
        patch.apply_to(&mut customer);

        assert_eq!(customer.max_credit, Decimal::from(250));
        assert_eq!(customer.name, "Bar do Zé");
        assert_eq!(customer.phone.as_deref(), Some("1133334444"));
    }

    #[test]
    fn negative_credit_limit_is_rejected() {
        let patch = CustomerPatch {
            max_credit: Some(Decimal::from(-1)),
            ..Default::default()
        };
        assert!(patch.validate().is_err());
    }

    #[test]
    fn available_credit() {
        let snapshot = CreditSnapshot {
            customer_id: Uuid::new_v4(),
            max_credit: Decimal::from(100),
            used_credit: Decimal::from(80),
            pending_expired: 0,
        };
        assert_eq!(snapshot.available(), Decimal::from(20));
    }

    #[test]
    fn address_patch_keeps_geocode_when_absent() {
        let mut address = Address {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            cep: "01310-100".into(),
            street: "Av. Paulista".into(),
            number: "1000".into(),
            complement: None,
            neighborhood: "Bela Vista".into(),
            city: "São Paulo".into(),
            state: "SP".into(),
            country: "BR".into(),
            lat: Some(-23.56),
            lon: Some(-46.65),
            distance: Some(3.2),
            created_at: Utc::now(),
        };
        let patch = AddressPatch {
            number: Some("1200".into()),
            ..Default::default()
        };
        patch.apply_to(&mut address);

        assert_eq!(address.number, "1200");
        assert_eq!(address.lat, Some(-23.56));
        assert_eq!(address.distance, Some(3.2));
    }

    #[test]
    fn address_with_bad_latitude_is_invalid() {
        let address = NewAddress {
            cep: "01310100".into(),
            street: "Rua A".into(),
            number: "1".into(),
            complement: None,
            neighborhood: "Centro".into(),
            city: "Campinas".into(),
            state: "SP".into(),
            country: "BR".into(),
            lat: Some(123.0),
            lon: None,
            distance: None,
        };
        assert!(address.validate().is_err());
    }
}
