// src/models/image.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Image {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub data: Vec<u8>,
    pub uploaded_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadedImage {
    pub img_id: Uuid,
}

// Usado só para documentar o formulário no Swagger.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ImageUploadForm {
    #[schema(example = "logo.jpg")]
    pub name: String,
    #[schema(value_type = String, format = Binary)]
    pub image: Vec<u8>,
}
