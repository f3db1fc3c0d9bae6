// src/services/rbac_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::RbacRepository,
    models::rbac::{CreateRolePayload, Permission, Role, RoleResponse},
};

#[derive(Clone)]
pub struct RbacService {
    repo: RbacRepository,
    pool: PgPool,
}

impl RbacService {
    pub fn new(repo: RbacRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Cria o cargo e vincula as permissões pedidas numa só transação.
    pub async fn create_role(&self, tenant_id: Uuid, payload: CreateRolePayload) -> Result<RoleResponse, AppError> {
        let mut tx = self.pool.begin().await?;

        let role = self
            .repo
            .create_role(&mut *tx, tenant_id, &payload.name, payload.description.as_deref())
            .await?;

        let mut permission_slugs = Vec::new();
        if !payload.permissions.is_empty() {
            let permissions = self
                .repo
                .find_permissions_by_slugs(&mut *tx, &payload.permissions)
                .await?;

            // Slug inexistente não é ignorado em silêncio
            if let Some(missing) = payload
                .permissions
                .iter()
                .find(|slug| !permissions.iter().any(|p| &p.slug == *slug))
            {
                return Err(AppError::PermissionNotFound(missing.clone()));
            }

            let ids: Vec<Uuid> = permissions.iter().map(|p| p.id).collect();
            self.repo.assign_permissions(&mut *tx, role.id, &ids).await?;
            permission_slugs = permissions.into_iter().map(|p| p.slug).collect();
        }

        tx.commit().await?;

        Ok(RoleResponse {
            role,
            permissions: permission_slugs,
        })
    }

    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        self.repo.list_all_permissions(&self.pool).await
    }

    pub async fn list_roles(&self, tenant_id: Uuid) -> Result<Vec<Role>, AppError> {
        self.repo.list_roles(tenant_id).await
    }
}
