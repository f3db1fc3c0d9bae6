// src/models/rbac.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// O que sai do banco (Tabela Roles)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,

    #[schema(ignore)] // Ocultamos tenant_id da documentação pública
    pub tenant_id: Uuid,

    #[schema(example = "Caixa")]
    pub name: String,

    #[schema(example = "Recebe fiado e movimenta o caixa")]
    pub description: Option<String>,

    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

// O que sai do banco (Tabela Permissions)
#[derive(Debug, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Permission {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440001")]
    pub id: Uuid,

    #[schema(example = "receber_fiado")]
    pub slug: String,

    #[schema(example = "Receber Fiado")]
    pub description: String,

    #[schema(example = "PEDIDOS")]
    pub module: String,
}

// O Payload para criar um cargo
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRolePayload {
    #[validate(length(min = 1, message = "O nome do cargo é obrigatório."))]
    #[schema(example = "Motoboy")]
    pub name: String,

    #[schema(example = "Faz as entregas")]
    pub description: Option<String>,

    #[schema(example = json!(["motoboy"]))]
    pub permissions: Vec<String>, // Slugs das permissões
}

// Resposta completa (Cargo + Lista de Permissões)
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoleResponse {
    #[serde(flatten)]
    pub role: Role,

    #[schema(example = json!(["receber_fiado", "editar_caixas"]))]
    pub permissions: Vec<String>,
}
