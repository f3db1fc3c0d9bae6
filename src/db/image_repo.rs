// src/db/image_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{common::error::AppError, models::image::Image};

#[derive(Clone, Default)]
pub struct ImageRepository;

impl ImageRepository {
    pub fn new() -> Self {
        Self
    }

    pub async fn insert<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        data: &[u8],
        uploaded_by: Uuid,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar(
            "INSERT INTO images (tenant_id, name, data, uploaded_by) VALUES ($1, $2, $3, $4) RETURNING id",
        )
        .bind(tenant_id)
        .bind(name)
        .bind(data)
        .bind(uploaded_by)
        .fetch_one(executor)
        .await?;
        Ok(id)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid, image_id: Uuid) -> Result<Image, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Image>(
            "SELECT id, tenant_id, name, data, uploaded_by, created_at FROM images WHERE tenant_id = $1 AND id = $2",
        )
        .bind(tenant_id)
        .bind(image_id)
        .fetch_optional(executor)
        .await?
        .ok_or(AppError::ImageNotFound)
    }
}
