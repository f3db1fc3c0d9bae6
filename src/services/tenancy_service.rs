// src/services/tenancy_service.rs

use std::sync::Arc;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CashierRepository, RbacRepository, TenantRepository, UserRepository},
    models::{
        auth::User,
        tenancy::{AddMemberPayload, CreateTenantPayload, Tenant, TenantMembership},
    },
    services::geo::Geocoder,
};

#[derive(Clone)]
pub struct TenantService {
    tenant_repo: TenantRepository,
    rbac_repo: RbacRepository,
    user_repo: UserRepository,
    cashier_repo: CashierRepository,
    geocoder: Arc<dyn Geocoder>,
    pool: PgPool,
}

impl TenantService {
    pub fn new(
        tenant_repo: TenantRepository,
        rbac_repo: RbacRepository,
        user_repo: UserRepository,
        cashier_repo: CashierRepository,
        geocoder: Arc<dyn Geocoder>,
        pool: PgPool,
    ) -> Self {
        Self {
            tenant_repo,
            rbac_repo,
            user_repo,
            cashier_repo,
            geocoder,
            pool,
        }
    }

    /// Coordenadas do depósito: as informadas ou, na falta, as do geocodificador.
    /// Endereço que não geocodifica não impede a criação da loja.
    async fn resolve_depot(&self, payload: &CreateTenantPayload) -> Option<(f64, f64)> {
        if let Some(depot) = payload.lat.zip(payload.lng) {
            return Some(depot);
        }
        let address = payload.address.as_deref().map(str::trim).filter(|a| !a.is_empty())?;

        match self.geocoder.geocode(address).await {
            Ok(Some(point)) if !point.is_null_island() => Some((point.lat, point.lon)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("Depósito sem coordenadas, geocodificação falhou: {}", e);
                None
            }
        }
    }

    /// Cria a loja e, na mesma transação, o cargo "Dono" com todas as
    /// permissões, o vínculo do criador e a linha da taxa de entrega.
    pub async fn create_tenant_with_owner(
        &self,
        payload: &CreateTenantPayload,
        owner: &User,
    ) -> Result<Tenant, AppError> {
        let depot = self.resolve_depot(payload).await;

        let mut tx = self.pool.begin().await?;

        let tenant = self
            .tenant_repo
            .create_tenant(
                &mut *tx,
                &payload.name,
                &payload.subdomain,
                payload.address.as_deref(),
                depot,
            )
            .await?;

        let owner_role = self
            .rbac_repo
            .create_role(&mut *tx, tenant.id, "Dono", Some("Acesso total (gerado automaticamente)"))
            .await?;

        let all_perm_ids: Vec<Uuid> = self
            .rbac_repo
            .list_all_permissions(&mut *tx)
            .await?
            .iter()
            .map(|p| p.id)
            .collect();
        if !all_perm_ids.is_empty() {
            self.rbac_repo
                .assign_permissions(&mut *tx, owner_role.id, &all_perm_ids)
                .await?;
        }

        self.tenant_repo
            .add_member_to_tenant(&mut *tx, tenant.id, owner.id, owner_role.id)
            .await?;

        self.cashier_repo.ensure_delivery_fee(&mut *tx, tenant.id).await?;

        tx.commit().await?;

        tracing::info!(tenant_id = %tenant.id, owner = %owner.id, "Loja criada");
        Ok(tenant)
    }

    pub async fn list_my_tenants(&self, user: &User) -> Result<Vec<TenantMembership>, AppError> {
        self.tenant_repo.get_tenants_for_user(&self.pool, user.id).await
    }

    /// Vincula um usuário já cadastrado à loja com um dos cargos dela.
    pub async fn add_member(&self, tenant_id: Uuid, payload: &AddMemberPayload) -> Result<(), AppError> {
        let user = self
            .user_repo
            .find_by_email(&payload.email)
            .await?
            .ok_or(AppError::UserNotFound)?;

        let roles = self.rbac_repo.list_roles(tenant_id).await?;
        if !roles.iter().any(|r| r.id == payload.role_id) {
            return Err(AppError::RoleNotFound);
        }

        self.tenant_repo
            .add_member_to_tenant(&self.pool, tenant_id, user.id, payload.role_id)
            .await
    }
}
