// src/handlers/payments.rs

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
        rbac::{PermReceberFiado, RequirePermission},
        tenancy::TenantContext,
    },
    models::payment::{OrderPayment, PaymentPatch, PendingFiado, ReceivePaymentPayload},
};

// POST /api/orders/{order_id}/payments ("receber fiado")
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/payments",
    tag = "Payments",
    request_body = ReceivePaymentPayload,
    responses(
        (status = 201, description = "Pagamento registrado", body = OrderPayment),
        (status = 400, description = "Pedido cancelado"),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn receive_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermReceberFiado>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<ReceivePaymentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let payment = app_state
        .payment_service
        .receive_payment(&mut *rls_conn, tenant.0, order_id, &payload, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(payment)))
}

// GET /api/orders/{order_id}/payments
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}/payments",
    tag = "Payments",
    responses((status = 200, description = "Pagamentos do pedido", body = Vec<OrderPayment>)),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_order_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let payments = app_state
        .payment_service
        .payments_for_order(&mut *rls_conn, tenant.0, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(payments))
}

// PATCH /api/payments/{payment_id}
#[utoipa::path(
    patch,
    path = "/api/payments/{payment_id}",
    tag = "Payments",
    request_body = PaymentPatch,
    responses(
        (status = 200, description = "Pagamento atualizado; pedido e caixa ajustados", body = OrderPayment),
        (status = 404, description = "Pagamento não encontrado")
    ),
    params(
        ("payment_id" = Uuid, Path, description = "ID do Pagamento"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermReceberFiado>,
    Path(payment_id): Path<Uuid>,
    Json(payload): Json<PaymentPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let payment = app_state
        .payment_service
        .update_payment(&mut *rls_conn, tenant.0, payment_id, &payload, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(payment))
}

// GET /api/payments/pending-fiado
#[utoipa::path(
    get,
    path = "/api/payments/pending-fiado",
    tag = "Payments",
    responses((status = 200, description = "Fiados em aberto com o saldo devedor", body = Vec<PendingFiado>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_pending_fiado(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let pending = app_state
        .payment_service
        .pending_fiado(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pending))
}
