// src/handlers/customers.rs

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
        rbac::{PermEditarClientes, RequirePermission},
        tenancy::TenantContext,
    },
    models::{
        customer::{
            Address, AddressPatch, CreditSnapshot, Customer, CustomerPatch, CustomerWithAddresses,
            NewAddress, NewCustomer,
        },
        order::OrderSummary,
    },
};

// POST /api/customers
#[utoipa::path(
    post,
    path = "/api/customers",
    tag = "Customers",
    request_body = NewCustomer,
    responses((status = 201, description = "Cliente criado", body = Customer)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarClientes>,
    Json(payload): Json<NewCustomer>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .customer_service
        .create(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// GET /api/customers
#[utoipa::path(
    get,
    path = "/api/customers",
    tag = "Customers",
    responses((status = 200, description = "Clientes com endereços e crédito usado", body = Vec<CustomerWithAddresses>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customers = app_state
        .customer_service
        .list(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customers))
}

// GET /api/customers/{customer_id}
#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}",
    tag = "Customers",
    responses(
        (status = 200, description = "Cliente", body = CustomerWithAddresses),
        (status = 400, description = "Cliente não encontrado")
    ),
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .customer_service
        .get(&mut *rls_conn, tenant.0, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// PATCH /api/customers/{customer_id}
#[utoipa::path(
    patch,
    path = "/api/customers/{customer_id}",
    tag = "Customers",
    request_body = CustomerPatch,
    responses((status = 200, description = "Cliente atualizado", body = Customer)),
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarClientes>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<CustomerPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let customer = app_state
        .customer_service
        .update(&mut *rls_conn, tenant.0, customer_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(customer))
}

// DELETE /api/customers/{customer_id}
#[utoipa::path(
    delete,
    path = "/api/customers/{customer_id}",
    tag = "Customers",
    responses(
        (status = 204, description = "Cliente removido"),
        (status = 409, description = "Cliente possui pedidos")
    ),
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarClientes>,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    app_state
        .customer_service
        .delete(&mut *rls_conn, tenant.0, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// GET /api/customers/{customer_id}/used-credit
#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}/used-credit",
    tag = "Customers",
    responses((status = 200, description = "Limite, crédito usado e fiados vencidos", body = CreditSnapshot)),
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_used_credit(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let snapshot = app_state
        .customer_service
        .credit(&mut *rls_conn, tenant.0, customer_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(snapshot))
}

// GET /api/customers/{customer_id}/orders/not-paid
#[utoipa::path(
    get,
    path = "/api/customers/{customer_id}/orders/not-paid",
    tag = "Customers",
    responses((status = 200, description = "Pedidos do cliente com saldo em aberto", body = Vec<OrderSummary>)),
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_not_paid_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .order_service
        .get_not_paid(&mut *rls_conn, tenant.0, Some(customer_id))
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

// =============================================================================
//  ENDEREÇOS
// =============================================================================

// POST /api/customers/{customer_id}/addresses
#[utoipa::path(
    post,
    path = "/api/customers/{customer_id}/addresses",
    tag = "Customers",
    request_body = NewAddress,
    responses((status = 201, description = "Endereço criado", body = Address)),
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_address(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarClientes>,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<NewAddress>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let address = app_state
        .customer_service
        .insert_address(&mut *rls_conn, tenant.0, customer_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(address)))
}

// PATCH /api/customers/{customer_id}/addresses/{address_id}
#[utoipa::path(
    patch,
    path = "/api/customers/{customer_id}/addresses/{address_id}",
    tag = "Customers",
    request_body = AddressPatch,
    responses(
        (status = 200, description = "Endereço atualizado", body = Address),
        (status = 400, description = "Endereço não encontrado")
    ),
    params(
        ("customer_id" = Uuid, Path, description = "ID do Cliente"),
        ("address_id" = Uuid, Path, description = "ID do Endereço"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_address(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarClientes>,
    Path((customer_id, address_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<AddressPatch>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let address = app_state
        .customer_service
        .update_address(&mut *rls_conn, tenant.0, customer_id, address_id, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(address))
}
