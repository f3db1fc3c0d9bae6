// src/handlers/delivery.rs

use axum::{extract::State, response::IntoResponse, Json};
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale, tenancy::TenantContext},
    models::delivery::{DeliveryDistancePayload, DeliveryQuote},
};

// POST /api/delivery/distance
#[utoipa::path(
    post,
    path = "/api/delivery/distance",
    tag = "Delivery",
    request_body = DeliveryDistancePayload,
    responses(
        (status = 200, description = "Distância do depósito e taxa calculada", body = DeliveryQuote),
        (status = 400, description = "Endereço não encontrado ou loja sem depósito"),
        (status = 502, description = "Geocodificador indisponível")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn calculate_distance(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Json(payload): Json<DeliveryDistancePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let quote = app_state
        .delivery_service
        .distance(&mut *rls_conn, tenant.0, &payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(quote))
}
