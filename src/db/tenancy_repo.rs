// src/db/tenancy_repo.rs

use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::tenancy::{Motoboy, Tenant, TenantMembership},
};

const TENANT_COLUMNS: &str = "t.id, t.name, t.subdomain, t.address, t.lat, t.lng, t.created_at";

#[derive(Clone, Default)]
pub struct TenantRepository;

impl TenantRepository {
    pub fn new() -> Self {
        Self
    }

    /// Verifica se um utilizador tem vínculo ativo com a loja.
    pub async fn check_user_tenancy<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
        tenant_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM tenant_members
                WHERE user_id = $1 AND tenant_id = $2 AND is_active = true
            )
            "#,
        )
        .bind(user_id)
        .bind(tenant_id)
        .fetch_one(executor)
        .await?;

        Ok(exists)
    }

    pub async fn find_id_by_subdomain<'e, E>(
        &self,
        executor: E,
        subdomain: &str,
    ) -> Result<Option<Uuid>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id = sqlx::query_scalar("SELECT id FROM tenants WHERE subdomain = $1")
            .bind(subdomain)
            .fetch_optional(executor)
            .await?;
        Ok(id)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, tenant_id: Uuid) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(&format!("SELECT {TENANT_COLUMNS} FROM tenants t WHERE t.id = $1"))
            .bind(tenant_id)
            .fetch_optional(executor)
            .await?
            .ok_or(AppError::TenantNotFound)
    }

    pub async fn create_tenant<'e, E>(
        &self,
        executor: E,
        name: &str,
        subdomain: &str,
        address: Option<&str>,
        location: Option<(f64, f64)>,
    ) -> Result<Tenant, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Tenant>(
            r#"
            INSERT INTO tenants AS t (name, subdomain, address, lat, lng)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING t.id, t.name, t.subdomain, t.address, t.lat, t.lng, t.created_at
            "#,
        )
        .bind(name)
        .bind(subdomain)
        .bind(address)
        .bind(location.map(|(lat, _)| lat))
        .bind(location.map(|(_, lng)| lng))
        .fetch_one(executor)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    return AppError::SubdomainAlreadyExists(subdomain.to_string());
                }
            }
            e.into()
        })
    }

    pub async fn add_member_to_tenant<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        user_id: Uuid,
        role_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            INSERT INTO tenant_members (tenant_id, user_id, role_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (tenant_id, user_id)
            DO UPDATE SET role_id = EXCLUDED.role_id, is_active = true
            "#,
        )
        .bind(tenant_id)
        .bind(user_id)
        .bind(role_id)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn get_tenants_for_user<'e, E>(
        &self,
        executor: E,
        user_id: Uuid,
    ) -> Result<Vec<TenantMembership>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, TenantMembership>(&format!(
            r#"
            SELECT {TENANT_COLUMNS}, r.name AS role_name
            FROM tenants t
            JOIN tenant_members tm ON tm.tenant_id = t.id
            JOIN roles r ON r.id = tm.role_id
            WHERE tm.user_id = $1 AND tm.is_active = true
            ORDER BY t.name
            "#
        ))
        .bind(user_id)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }

    /// Membros ativos da loja que têm a permissão de entregador.
    pub async fn list_members_with_permission<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        slug: &str,
    ) -> Result<Vec<Motoboy>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let rows = sqlx::query_as::<_, Motoboy>(
            r#"
            SELECT u.id AS user_id, u.username, u.email
            FROM tenant_members tm
            JOIN users u ON u.id = tm.user_id
            JOIN role_permissions rp ON rp.role_id = tm.role_id
            JOIN permissions p ON p.id = rp.permission_id
            WHERE tm.tenant_id = $1 AND tm.is_active = true AND p.slug = $2
            ORDER BY u.username
            "#,
        )
        .bind(tenant_id)
        .bind(slug)
        .fetch_all(executor)
        .await?;
        Ok(rows)
    }
}
