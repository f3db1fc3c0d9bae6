// src/handlers/logs.rs

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};

use crate::{
    common::{db_utils::get_rls_connection, error::ApiError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermVerRelatorios, RequirePermission},
        tenancy::TenantContext,
    },
    models::logs::{LogEntry, LogQuery},
};

// GET /api/logs?orderId=&customerId=&logType=&limit=
#[utoipa::path(
    get,
    path = "/api/logs",
    tag = "Logs",
    params(
        LogQuery,
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    responses((status = 200, description = "Registros de auditoria, mais recentes primeiro", body = Vec<LogEntry>)),
    security(("api_jwt" = []))
)]
pub async fn list_logs(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermVerRelatorios>,
    Query(query): Query<LogQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let logs = app_state
        .audit_service
        .list(&mut *rls_conn, tenant.0, &query)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(logs))
}
