// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};

use crate::{
    common::{
        error::{ApiError, AppError},
        i18n::I18nStore,
    },
    config::AppState,
    middleware::{
        i18n::Locale,
        tenancy::{resolve_tenant, TenantContext},
    },
    models::auth::User,
};

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

// Recebe só os cabeçalhos: o corpo da requisição não é `Sync`.
async fn authenticate(app_state: &AppState, headers: &HeaderMap) -> Result<User, AppError> {
    let bearer = headers
        .typed_get::<Authorization<Bearer>>()
        .ok_or(AppError::InvalidToken)?;

    app_state.auth_service.validate_token(bearer.token()).await
}

/// Exige um token válido. Rotas do próprio usuário (/api/users, /api/tenants).
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user = authenticate(&app_state, request.headers())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Token válido + loja resolvida + vínculo ativo do usuário com a loja.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let to_api = |e: AppError| e.to_api_error(&locale, &app_state.i18n_store);

    let user = authenticate(&app_state, request.headers()).await.map_err(to_api)?;
    let tenant_id = resolve_tenant(&app_state, request.headers())
        .await
        .map_err(to_api)?;

    let is_member = app_state
        .tenant_repo
        .check_user_tenancy(&app_state.db_pool, user.id, tenant_id)
        .await
        .map_err(to_api)?;

    if !is_member {
        tracing::warn!(user_id = %user.id, tenant_id = %tenant_id, "Acesso negado à loja");
        return Err(to_api(AppError::TenantAccessDenied));
    }

    request.extensions_mut().insert(AuthenticatedUser(user));
    request.extensions_mut().insert(TenantContext(tenant_id));
    Ok(next.run(request).await)
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthenticatedUser>() {
            Some(user) => Ok(user.clone()),
            None => {
                let Ok(locale) = Locale::from_request_parts(parts, state).await;
                Err(AppError::InvalidToken.to_api_error(&locale, I18nStore::global()))
            }
        }
    }
}
