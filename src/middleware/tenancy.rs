// src/middleware/tenancy.rs

use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use uuid::Uuid;

use crate::{common::error::AppError, config::AppState, middleware::i18n::Locale};

// O nome do nosso cabeçalho HTTP customizado
const TENANT_ID_HEADER: &str = "x-tenant-id";

// A loja da requisição. Inserida nos extensions pelo `tenant_guard`.
#[derive(Debug, Clone, Copy)]
pub struct TenantContext(pub Uuid);

/// Onde procurar a loja: cabeçalho explícito ou subdomínio do Host.
#[derive(Debug, PartialEq, Eq)]
pub enum TenantHint {
    Id(Uuid),
    Subdomain(String),
}

/// Lê o `x-tenant-id`; na falta dele, usa o primeiro rótulo do Host
/// (`central.distribuidora.app` -> `central`).
pub fn tenant_hint(headers: &HeaderMap) -> Result<TenantHint, AppError> {
    if let Some(value) = headers.get(TENANT_ID_HEADER) {
        let id = value
            .to_str()
            .ok()
            .and_then(|s| Uuid::parse_str(s.trim()).ok())
            .ok_or(AppError::TenantNotFound)?;
        return Ok(TenantHint::Id(id));
    }

    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TenantNotFound)?;
    let hostname = host.split(':').next().unwrap_or(host);

    // IPs e "localhost" não têm subdomínio
    let labels: Vec<&str> = hostname.split('.').collect();
    if labels.len() < 3 || hostname.parse::<std::net::IpAddr>().is_ok() {
        return Err(AppError::TenantNotFound);
    }

    Ok(TenantHint::Subdomain(labels[0].to_lowercase()))
}

pub async fn resolve_tenant(app_state: &AppState, headers: &HeaderMap) -> Result<Uuid, AppError> {
    match tenant_hint(headers)? {
        TenantHint::Id(id) => Ok(id),
        TenantHint::Subdomain(subdomain) => app_state
            .tenant_repo
            .find_id_by_subdomain(&app_state.db_pool, &subdomain)
            .await?
            .ok_or(AppError::TenantNotFound),
    }
}

impl<S> FromRequestParts<S> for TenantContext
where
    S: Send + Sync,
{
    type Rejection = crate::common::error::ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<TenantContext>() {
            Some(ctx) => Ok(*ctx),
            None => {
                let Ok(locale) = Locale::from_request_parts(parts, state).await;
                Err(AppError::TenantNotFound
                    .to_api_error(&locale, crate::common::i18n::I18nStore::global()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (k, v) in pairs {
            map.insert(*k, HeaderValue::from_static(v));
        }
        map
    }

    #[test]
    fn explicit_header_wins_over_host() {
        let id = Uuid::new_v4();
        let mut map = headers(&[("host", "central.distribuidora.app")]);
        map.insert(TENANT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        assert_eq!(tenant_hint(&map).unwrap(), TenantHint::Id(id));
    }

    #[test]
    fn subdomain_is_taken_from_host() {
        let map = headers(&[("host", "Central.distribuidora.app:3000")]);
        assert_eq!(tenant_hint(&map).unwrap(), TenantHint::Subdomain("central".into()));
    }

    #[test]
    fn bare_host_has_no_tenant() {
        assert!(tenant_hint(&headers(&[("host", "localhost:3000")])).is_err());
        assert!(tenant_hint(&headers(&[("host", "127.0.0.1")])).is_err());
    }

    #[test]
    fn malformed_header_is_rejected() {
        let map = headers(&[("x-tenant-id", "nao-e-uuid")]);
        assert!(matches!(tenant_hint(&map), Err(AppError::TenantNotFound)));
    }
}
