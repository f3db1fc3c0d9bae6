// src/middleware/rbac.rs

use std::marker::PhantomData;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
};

/// 1. O Trait que define o que é uma Permissão
pub trait PermissionDef: Send + Sync + 'static {
    fn slug() -> &'static str;
}

/// 2. O Extractor (Guardião). Falta de permissão nunca vira no-op: responde FORBIDDEN.
pub struct RequirePermission<T>(pub PhantomData<T>);

impl<T, S> FromRequestParts<S> for RequirePermission<T>
where
    T: PermissionDef,
    S: Send + Sync,
    AppState: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let Ok(locale) = Locale::from_request_parts(parts, state).await;
        let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

        let user = parts
            .extensions
            .get::<AuthenticatedUser>()
            .ok_or(AppError::InvalidToken)
            .map_err(to_api)?;

        let tenant = parts
            .extensions
            .get::<TenantContext>()
            .ok_or(AppError::TenantNotFound)
            .map_err(to_api)?;

        let required_perm = T::slug();

        let has_permission = app_state
            .rbac_repo
            .user_has_permission(&app_state.db_pool, user.0.id, tenant.0, required_perm)
            .await
            .map_err(to_api)?;

        if !has_permission {
            return Err(to_api(AppError::PermissionDenied(required_perm.to_string())));
        }

        Ok(RequirePermission(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS PERMISSÕES (TIPOS)
// ---

pub struct PermReceberFiado;
impl PermissionDef for PermReceberFiado {
    fn slug() -> &'static str { "receber_fiado" }
}

pub struct PermEditarProdutos;
impl PermissionDef for PermEditarProdutos {
    fn slug() -> &'static str { "editar_produtos" }
}

pub struct PermEditarEstoque;
impl PermissionDef for PermEditarEstoque {
    fn slug() -> &'static str { "editar_estoque" }
}

pub struct PermVerRelatorios;
impl PermissionDef for PermVerRelatorios {
    fn slug() -> &'static str { "ver_relatorios" }
}

// Não guarda rota: marca quem pode ser escalado para entregas.
pub struct PermMotoboy;
impl PermissionDef for PermMotoboy {
    fn slug() -> &'static str { "motoboy" }
}

pub struct PermEditarCaixas;
impl PermissionDef for PermEditarCaixas {
    fn slug() -> &'static str { "editar_caixas" }
}

pub struct PermEditarClientes;
impl PermissionDef for PermEditarClientes {
    fn slug() -> &'static str { "editar_clientes" }
}

pub struct PermAtualizarPedidos;
impl PermissionDef for PermAtualizarPedidos {
    fn slug() -> &'static str { "atualizar_pedidos" }
}

// Cargos e membros da loja
pub struct PermGerenciarEquipe;
impl PermissionDef for PermGerenciarEquipe {
    fn slug() -> &'static str { "gerenciar_equipe" }
}
