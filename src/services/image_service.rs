// src/services/image_service.rs

use sqlx::{Acquire, Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::ImageRepository,
    models::{
        auth::User,
        image::Image,
        logs::{LogType, NewLogEntry},
    },
    services::audit_service::AuditService,
};

#[derive(Clone)]
pub struct ImageService {
    repo: ImageRepository,
    audit: AuditService,
}

impl ImageService {
    pub fn new(repo: ImageRepository, audit: AuditService) -> Self {
        Self { repo, audit }
    }

    pub async fn upload<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        bytes: &[u8],
        user: &User,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres> + Acquire<'e, Database = Postgres>,
    {
        if bytes.is_empty() {
            return Err(AppError::InvalidMultipart("arquivo vazio".into()));
        }

        let mut tx = executor.begin().await?;
        let image_id = self.repo.insert(&mut *tx, tenant_id, name, bytes, user.id).await?;

        self.audit
            .record(
                &mut tx,
                tenant_id,
                NewLogEntry::new(LogType::Log, user.id, format!("Imagem {} enviada", name))
                    .route("/imagens", "images.upload"),
            )
            .await;

        tx.commit().await?;
        Ok(image_id)
    }

    pub async fn get<'e, E>(&self, executor: E, tenant_id: Uuid, image_id: Uuid) -> Result<Image, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.repo.find_by_id(executor, tenant_id, image_id).await
    }
}
