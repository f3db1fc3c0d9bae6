// src/handlers/cashiers.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermEditarCaixas, RequirePermission},
        tenancy::TenantContext,
    },
    models::cashier::{
        Cashier, CashierPatch, CashierTransaction, CreateCashierPayload, DeliveryFee,
        InsertTransactionsPayload, UpdateDeliveryFeePayload,
    },
};

// POST /api/cashiers
#[utoipa::path(
    post,
    path = "/api/cashiers",
    tag = "Cashiers",
    request_body = CreateCashierPayload,
    responses((status = 201, description = "Caixa criado com saldo zero", body = Cashier)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_cashier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarCaixas>,
    Json(payload): Json<CreateCashierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cashier = app_state
        .cashier_service
        .create(&mut *rls_conn, tenant.0, &payload.name)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(cashier)))
}

// GET /api/cashiers
#[utoipa::path(
    get,
    path = "/api/cashiers",
    tag = "Cashiers",
    responses((status = 200, description = "Caixas da loja", body = Vec<Cashier>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_cashiers(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cashiers = app_state
        .cashier_service
        .list(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cashiers))
}

// GET /api/cashiers/{cashier_id}
#[utoipa::path(
    get,
    path = "/api/cashiers/{cashier_id}",
    tag = "Cashiers",
    responses(
        (status = 200, description = "Caixa", body = Cashier),
        (status = 404, description = "Caixa não encontrado")
    ),
    params(
        ("cashier_id" = Uuid, Path, description = "ID do Caixa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_cashier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(cashier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cashier = app_state
        .cashier_service
        .get(&mut *rls_conn, tenant.0, cashier_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cashier))
}

// PATCH /api/cashiers/{cashier_id}
#[utoipa::path(
    patch,
    path = "/api/cashiers/{cashier_id}",
    tag = "Cashiers",
    request_body = CashierPatch,
    responses((status = 200, description = "Caixa renomeado", body = Cashier)),
    params(
        ("cashier_id" = Uuid, Path, description = "ID do Caixa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_cashier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarCaixas>,
    Path(cashier_id): Path<Uuid>,
    Json(payload): Json<CashierPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let cashier = app_state
        .cashier_service
        .update(&mut *rls_conn, tenant.0, cashier_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(cashier))
}

// DELETE /api/cashiers/{cashier_id}
#[utoipa::path(
    delete,
    path = "/api/cashiers/{cashier_id}",
    tag = "Cashiers",
    responses(
        (status = 204, description = "Caixa removido"),
        (status = 409, description = "Caixa com saldo ou movimentações")
    ),
    params(
        ("cashier_id" = Uuid, Path, description = "ID do Caixa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_cashier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarCaixas>,
    Path(cashier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .cashier_service
        .delete(&mut *rls_conn, tenant.0, cashier_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/cashiers/{cashier_id}/transactions
#[utoipa::path(
    get,
    path = "/api/cashiers/{cashier_id}/transactions",
    tag = "Cashiers",
    responses((status = 200, description = "Movimentações do caixa", body = Vec<CashierTransaction>)),
    params(
        ("cashier_id" = Uuid, Path, description = "ID do Caixa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(cashier_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let transactions = app_state
        .cashier_service
        .list_transactions(&mut *rls_conn, tenant.0, cashier_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(transactions))
}

// POST /api/cashiers/{cashier_id}/transactions
#[utoipa::path(
    post,
    path = "/api/cashiers/{cashier_id}/transactions",
    tag = "Cashiers",
    request_body = InsertTransactionsPayload,
    responses((status = 201, description = "Movimentações gravadas e saldo atualizado", body = Vec<CashierTransaction>)),
    params(
        ("cashier_id" = Uuid, Path, description = "ID do Caixa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn insert_transactions(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarCaixas>,
    Path(cashier_id): Path<Uuid>,
    Json(payload): Json<InsertTransactionsPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let rows = app_state
        .cashier_service
        .insert_transactions(&mut *rls_conn, tenant.0, cashier_id, &payload.transactions, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(rows)))
}

// =============================================================================
//  TAXA DE ENTREGA
// =============================================================================

// GET /api/delivery/fee
#[utoipa::path(
    get,
    path = "/api/delivery/fee",
    tag = "Delivery",
    responses((status = 200, description = "Taxa por km da loja", body = DeliveryFee)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_delivery_fee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let fee = app_state
        .cashier_service
        .get_delivery_fee(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(fee))
}

// PUT /api/delivery/fee
#[utoipa::path(
    put,
    path = "/api/delivery/fee",
    tag = "Delivery",
    request_body = UpdateDeliveryFeePayload,
    responses((status = 200, description = "Taxa atualizada", body = DeliveryFee)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn update_delivery_fee(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarCaixas>,
    Json(payload): Json<UpdateDeliveryFeePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let fee = app_state
        .cashier_service
        .update_delivery_fee(&mut *rls_conn, tenant.0, payload.taxa_por_km, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(fee))
}
