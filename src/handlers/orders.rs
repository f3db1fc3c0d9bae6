// src/handlers/orders.rs

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
        rbac::{PermAtualizarPedidos, PermReceberFiado, RequirePermission},
        tenancy::TenantContext,
    },
    models::order::{
        CreateFiadoOrderPayload, CreatePaidOrderPayload, CreateWaitingOrderPayload, CreatedOrder, Order,
        OrderDetail, OrderSummary, OrderUpdate, UpdateCourierPayload, UpdateExpireDatePayload,
        UpdateStatusPayload,
    },
};

// =============================================================================
//  CRIAÇÃO
// =============================================================================

// POST /api/orders/fiado
#[utoipa::path(
    post,
    path = "/api/orders/fiado",
    tag = "Orders",
    request_body = CreateFiadoOrderPayload,
    responses(
        (status = 201, description = "Pedido fiado criado", body = CreatedOrder),
        (status = 400, description = "Cliente sem crédito ou com fiados vencidos"),
        (status = 403, description = "Sem permissão para vender fiado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_fiado_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermReceberFiado>,
    Json(payload): Json<CreateFiadoOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .order_service
        .create_fiado_order(&mut *rls_conn, tenant.0, &payload, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// POST /api/orders/paid
#[utoipa::path(
    post,
    path = "/api/orders/paid",
    tag = "Orders",
    request_body = CreatePaidOrderPayload,
    responses(
        (status = 201, description = "Pedido pago criado", body = CreatedOrder),
        (status = 400, description = "Pagamentos não cobrem o total")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_paid_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreatePaidOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .order_service
        .create_paid_order(&mut *rls_conn, tenant.0, &payload, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// POST /api/orders/waiting
#[utoipa::path(
    post,
    path = "/api/orders/waiting",
    tag = "Orders",
    request_body = CreateFiadoOrderPayload,
    responses(
        (status = 201, description = "Pedido de entrega em espera criado", body = CreatedOrder),
        (status = 400, description = "Sem motoboy selecionado")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn create_waiting_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<CreateWaitingOrderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let created = app_state
        .order_service
        .create_waiting_order(&mut *rls_conn, tenant.0, &payload, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(created)))
}

// =============================================================================
//  CICLO DE VIDA
// =============================================================================

// PUT /api/orders/{order_id}
#[utoipa::path(
    put,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    request_body = OrderUpdate,
    responses(
        (status = 200, description = "Pedido e itens substituídos", body = CreatedOrder),
        (status = 400, description = "Pedido cancelado ou encerrado")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAtualizarPedidos>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<OrderUpdate>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let updated = app_state
        .order_service
        .update_order(&mut *rls_conn, tenant.0, order_id, &payload, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(updated))
}

// PATCH /api/orders/{order_id}/status
#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/status",
    tag = "Orders",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status atualizado", body = Order),
        (status = 400, description = "Transição não permitida")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAtualizarPedidos>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .update_status(&mut *rls_conn, tenant.0, order_id, payload.status, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// PATCH /api/orders/{order_id}/expire-date
#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/expire-date",
    tag = "Orders",
    request_body = UpdateExpireDatePayload,
    responses(
        (status = 200, description = "Vencimento atualizado", body = Order),
        (status = 400, description = "Pedido não é fiado")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_expire_date(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAtualizarPedidos>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateExpireDatePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .update_expire_date(&mut *rls_conn, tenant.0, order_id, payload.expire_at, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// PATCH /api/orders/{order_id}/courier
#[utoipa::path(
    patch,
    path = "/api/orders/{order_id}/courier",
    tag = "Orders",
    request_body = UpdateCourierPayload,
    responses(
        (status = 200, description = "Motoboy atualizado", body = Order),
        (status = 400, description = "Motoboy inválido")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_courier(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAtualizarPedidos>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<UpdateCourierPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .update_courier(&mut *rls_conn, tenant.0, order_id, payload.motoboy_id, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// POST /api/orders/{order_id}/cancel
#[utoipa::path(
    post,
    path = "/api/orders/{order_id}/cancel",
    tag = "Orders",
    responses(
        (status = 200, description = "Pedido cancelado; estoque e caixa estornados", body = Order),
        (status = 400, description = "Pedido já cancelado ou encerrado")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermAtualizarPedidos>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let order = app_state
        .order_service
        .cancel_order(&mut *rls_conn, tenant.0, order_id, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(order))
}

// =============================================================================
//  CONSULTAS
// =============================================================================

// GET /api/orders/{order_id}
#[utoipa::path(
    get,
    path = "/api/orders/{order_id}",
    tag = "Orders",
    responses(
        (status = 200, description = "Pedido com itens e pagamentos", body = OrderDetail),
        (status = 404, description = "Pedido não encontrado")
    ),
    params(
        ("order_id" = Uuid, Path, description = "ID do Pedido"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_order(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let detail = app_state
        .order_service
        .get_by_id(&mut *rls_conn, tenant.0, order_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(detail))
}

// GET /api/orders/current
#[utoipa::path(
    get,
    path = "/api/orders/current",
    tag = "Orders",
    responses((status = 200, description = "Pedidos em andamento", body = Vec<OrderSummary>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_current_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .order_service
        .get_current(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

// GET /api/orders
#[utoipa::path(
    get,
    path = "/api/orders",
    tag = "Orders",
    responses((status = 200, description = "Todos os pedidos", body = Vec<OrderSummary>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_all_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .order_service
        .get_all(&mut *rls_conn, tenant.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

// GET /api/orders/not-paid
#[utoipa::path(
    get,
    path = "/api/orders/not-paid",
    tag = "Orders",
    responses((status = 200, description = "Pedidos com saldo em aberto", body = Vec<OrderSummary>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn get_not_paid_orders(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let orders = app_state
        .order_service
        .get_not_paid(&mut *rls_conn, tenant.0, None)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(orders))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request},
    };
    use tower::ServiceExt;

    use super::*;
    use crate::{
        common::test_support::TestStore,
        models::{rbac::CreateRolePayload, tenancy::AddMemberPayload},
    };

    fn fiado_request(store: &TestStore, token: &str, body: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/orders/fiado")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header("x-tenant-id", store.tenant_id.to_string())
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn fiado_sale_requires_receber_fiado() {
        let Some(store) = TestStore::new().await else {
            return;
        };
        let customer = store.customer(100).await;
        let (_, product) = store.product(10, 5).await;
        let body = serde_json::json!({
            "orderItems": [{ "productId": product.id, "quantity": 2, "price": 5 }],
            "orderInfo": { "customerId": customer.id, "total": 10, "orderType": "BALCAO" }
        });

        // Membro da loja, mas com um cargo sem permissões
        let role = store
            .state
            .rbac_service
            .create_role(
                store.tenant_id,
                CreateRolePayload {
                    name: "Estagiário".into(),
                    description: None,
                    permissions: vec![],
                },
            )
            .await
            .unwrap();
        let clerk = store.user("estagiario").await;
        store
            .state
            .tenant_service
            .add_member(
                store.tenant_id,
                &AddMemberPayload {
                    email: clerk.email.clone(),
                    role_id: role.role.id,
                },
            )
            .await
            .unwrap();

        let app = crate::router(store.state.clone());
        let denied = app
            .clone()
            .oneshot(fiado_request(&store, &store.token(&clerk), &body))
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::FORBIDDEN);

        let open = store
            .state
            .order_service
            .get_not_paid(store.pool(), store.tenant_id, Some(customer.id))
            .await
            .unwrap();
        assert!(open.is_empty());

        let created = app
            .oneshot(fiado_request(&store, &store.token(&store.owner), &body))
            .await
            .unwrap();
        assert_eq!(created.status(), StatusCode::CREATED);
    }
}
