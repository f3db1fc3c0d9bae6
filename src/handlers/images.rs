// src/handlers/images.rs

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermEditarProdutos, RequirePermission},
        tenancy::TenantContext,
    },
    models::image::{ImageUploadForm, UploadedImage},
};

/// Lê os campos `name` (texto) e `image` (arquivo) do formulário.
async fn read_upload(multipart: &mut Multipart) -> Result<(String, Vec<u8>), AppError> {
    let mut name: Option<String> = None;
    let mut data: Option<Vec<u8>> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::InvalidMultipart(e.to_string()))?
    {
        match field.name() {
            Some("name") => {
                name = Some(field.text().await.map_err(|e| AppError::InvalidMultipart(e.to_string()))?);
            }
            Some("image") => {
                // Sem campo `name`, vale o nome do arquivo
                if name.is_none() {
                    name = field.file_name().map(str::to_string);
                }
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::InvalidMultipart(e.to_string()))?;
                data = Some(bytes.to_vec());
            }
            _ => {}
        }
    }

    let data = data.ok_or_else(|| AppError::InvalidMultipart("campo 'image' ausente".into()))?;
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| AppError::InvalidMultipart("campo 'name' ausente".into()))?;

    Ok((name, data))
}

// POST /api/images
#[utoipa::path(
    post,
    path = "/api/images",
    tag = "Images",
    request_body(content = ImageUploadForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Imagem gravada", body = UploadedImage),
        (status = 400, description = "Formulário inválido")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Loja")),
    security(("api_jwt" = []))
)]
pub async fn upload_image(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    _guard: RequirePermission<PermEditarProdutos>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let (name, data) = read_upload(&mut multipart)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let img_id = app_state
        .image_service
        .upload(&mut *rls_conn, tenant.0, &name, &data, &user.0)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(UploadedImage { img_id })))
}

// GET /api/images/{image_id}
#[utoipa::path(
    get,
    path = "/api/images/{image_id}",
    tag = "Images",
    responses(
        (status = 200, description = "Bytes da imagem", content_type = "image/jpeg", body = Vec<u8>),
        (status = 404, description = "Imagem não encontrada")
    ),
    params(
        ("image_id" = Uuid, Path, description = "ID da Imagem"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Loja")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_image(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    tenant: TenantContext,
    Path(image_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &tenant, &user)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let image = app_state
        .image_service
        .get(&mut *rls_conn, tenant.0, image_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(([(header::CONTENT_TYPE, "image/jpeg")], image.data))
}
