// src/models/tenancy.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// A loja (distribuidora). lat/lng marcam o depósito de onde saem as entregas.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Tenant {
    pub id: Uuid,
    #[schema(example = "Distribuidora Central")]
    pub name: String,
    #[schema(example = "central")]
    pub subdomain: String,
    pub address: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl Tenant {
    pub fn depot(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lng)
    }
}

// Loja + cargo do usuário nela (GET /api/tenants)
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TenantMembership {
    #[serde(flatten)]
    #[sqlx(flatten)]
    pub tenant: Tenant,
    pub role_name: String,
}

// Entregador disponível para atribuir a pedidos
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Motoboy {
    pub user_id: Uuid,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTenantPayload {
    #[validate(length(min = 1, message = "O nome do estabelecimento é obrigatório."))]
    #[schema(example = "Distribuidora Central")]
    pub name: String,

    #[validate(length(min = 2, max = 63, message = "Subdomínio deve ter entre 2 e 63 caracteres."))]
    #[schema(example = "central")]
    pub subdomain: String,

    /// Endereço do depósito; geocodificado quando lat/lng não vêm preenchidos.
    pub address: Option<String>,

    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: Option<f64>,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: String,
    pub role_id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depot_requires_both_coordinates() {
        let mut tenant = Tenant {
            id: Uuid::new_v4(),
            name: "Loja".into(),
            subdomain: "loja".into(),
            address: None,
            lat: Some(-23.5),
            lng: None,
            created_at: Utc::now(),
        };
        assert_eq!(tenant.depot(), None);

        tenant.lng = Some(-46.6);
        assert_eq!(tenant.depot(), Some((-23.5, -46.6)));
    }
}
