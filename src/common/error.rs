// src/common/error.rs

use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::common::i18n::I18nStore;
use crate::middleware::i18n::Locale;
use crate::models::order::OrderStatus;

// O erro de domínio. Os services só conhecem este tipo; a tradução para HTTP
// acontece em `to_api_error`, já no idioma do cliente.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // --- Autenticação / Tenancy ---
    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Loja não encontrada")]
    TenantNotFound,

    #[error("Usuário não pertence à loja")]
    TenantAccessDenied,

    #[error("Subdomínio já está em uso: {0}")]
    SubdomainAlreadyExists(String),

    #[error("Permissão necessária: {0}")]
    PermissionDenied(String),

    #[error("Permissão inexistente: {0}")]
    PermissionNotFound(String),

    #[error("Cargo não encontrado")]
    RoleNotFound,

    // --- Clientes ---
    #[error("Cliente não encontrado")]
    CustomerNotFound,

    #[error("Endereço não encontrado")]
    AddressNotFound,

    #[error("Cliente possui pedidos vinculados")]
    CustomerHasOrders,

    // --- Admissão de pedidos ---
    #[error("Cliente possui pedidos fiados pendentes e expirados")]
    PendingExpiredFiado,

    #[error("Cliente não possui crédito suficiente")]
    InsufficientCredit,

    #[error("Valor pago é menor que o total da compra")]
    InsufficientPayment,

    #[error("Pagamento em dinheiro sem caixa")]
    CashWithoutCashier,

    #[error("Sem motoboy selecionado")]
    NoCourierSelected,

    #[error("Motoboy não encontrado")]
    CourierNotFound,

    #[error("Produto não encontrado")]
    ProductNotFound,

    // --- Ciclo de vida ---
    #[error("Pedido não encontrado")]
    OrderNotFound,

    #[error("Pedido cancelado")]
    OrderCanceled,

    #[error("Pedido encerrado")]
    OrderClosed,

    #[error("Pedido não é fiado")]
    NotFiadoOrder,

    #[error("Transição de status inválida: {from} -> {to}")]
    IllegalTransition { from: OrderStatus, to: OrderStatus },

    // --- Pagamentos / Caixa ---
    #[error("Pagamento não encontrado")]
    PaymentNotFound,

    #[error("Caixa não encontrado")]
    CashierNotFound,

    #[error("Caixa possui saldo ou movimentações")]
    CashierNotEmpty,

    // --- Estoque / Imagens ---
    #[error("SKU não encontrado")]
    SkuNotFound,

    #[error("Imagem não encontrada")]
    ImageNotFound,

    #[error("Formulário inválido: {0}")]
    InvalidMultipart(String),

    // --- Geocodificação ---
    #[error("Endereço não encontrado para calcular taxa de entrega")]
    AddressNotGeocoded,

    #[error("Erro ao geocodificar endereço")]
    GeocodingFailed,

    #[error("Loja sem localização cadastrada")]
    DepotLocationMissing,

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    // --- Infraestrutura ---
    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Erro no serviço de geocodificação: {0}")]
    GeocoderUnavailable(#[from] reqwest::Error),
}

// A resposta que o cliente recebe.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub key: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, key: &'static str, error: impl Into<String>) -> Self {
        Self {
            status,
            key,
            error: error.into(),
            details: None,
        }
    }

    /// Código categórico (BAD_REQUEST, UNAUTHORIZED, ...) derivado do status.
    pub fn code(&self) -> &'static str {
        status_code_name(self.status)
    }
}

fn status_code_name(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "BAD_REQUEST",
        StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
        StatusCode::FORBIDDEN => "FORBIDDEN",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::CONFLICT => "CONFLICT",
        StatusCode::BAD_GATEWAY => "BAD_GATEWAY",
        _ => "INTERNAL_SERVER_ERROR",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "code": self.code(),
            "key": self.key,
            "error": self.error,
            "details": self.details,
        }));
        (self.status, body).into_response()
    }
}

impl AppError {
    /// Status HTTP + chave de tradução de cada variante.
    pub fn descriptor(&self) -> (StatusCode, &'static str) {
        use AppError::*;
        match self {
            ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            EmailAlreadyExists => (StatusCode::CONFLICT, "email_already_exists"),
            InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token"),
            UserNotFound => (StatusCode::NOT_FOUND, "user_not_found"),
            TenantNotFound => (StatusCode::BAD_REQUEST, "tenant_not_found"),
            TenantAccessDenied => (StatusCode::FORBIDDEN, "tenant_access_denied"),
            SubdomainAlreadyExists(_) => (StatusCode::CONFLICT, "subdomain_already_exists"),
            PermissionDenied(_) => (StatusCode::FORBIDDEN, "permission_denied"),
            PermissionNotFound(_) => (StatusCode::BAD_REQUEST, "permission_not_found"),
            RoleNotFound => (StatusCode::BAD_REQUEST, "role_not_found"),
            CustomerNotFound => (StatusCode::BAD_REQUEST, "customer_not_found"),
            AddressNotFound => (StatusCode::BAD_REQUEST, "address_not_found"),
            CustomerHasOrders => (StatusCode::CONFLICT, "customer_has_orders"),
            PendingExpiredFiado => (StatusCode::BAD_REQUEST, "pending_expired_fiado"),
            InsufficientCredit => (StatusCode::BAD_REQUEST, "insufficient_credit"),
            InsufficientPayment => (StatusCode::BAD_REQUEST, "insufficient_payment"),
            CashWithoutCashier => (StatusCode::BAD_REQUEST, "cash_without_cashier"),
            NoCourierSelected => (StatusCode::BAD_REQUEST, "no_courier_selected"),
            CourierNotFound => (StatusCode::BAD_REQUEST, "courier_not_found"),
            ProductNotFound => (StatusCode::BAD_REQUEST, "product_not_found"),
            OrderNotFound => (StatusCode::NOT_FOUND, "order_not_found"),
            OrderCanceled => (StatusCode::BAD_REQUEST, "order_canceled"),
            OrderClosed => (StatusCode::BAD_REQUEST, "order_closed"),
            NotFiadoOrder => (StatusCode::BAD_REQUEST, "not_fiado_order"),
            IllegalTransition { .. } => (StatusCode::BAD_REQUEST, "illegal_transition"),
            PaymentNotFound => (StatusCode::NOT_FOUND, "payment_not_found"),
            CashierNotFound => (StatusCode::NOT_FOUND, "cashier_not_found"),
            CashierNotEmpty => (StatusCode::CONFLICT, "cashier_not_empty"),
            SkuNotFound => (StatusCode::NOT_FOUND, "sku_not_found"),
            ImageNotFound => (StatusCode::NOT_FOUND, "image_not_found"),
            InvalidMultipart(_) => (StatusCode::BAD_REQUEST, "invalid_form_data"),
            AddressNotGeocoded => (StatusCode::BAD_REQUEST, "address_not_geocoded"),
            GeocodingFailed => (StatusCode::BAD_REQUEST, "geocoding_failed"),
            DepotLocationMissing => (StatusCode::BAD_REQUEST, "depot_location_missing"),
            UniqueConstraintViolation(_) => (StatusCode::CONFLICT, "unique_violation"),
            GeocoderUnavailable(_) => (StatusCode::BAD_GATEWAY, "geocoder_unavailable"),
            DatabaseError(_) | InternalServerError(_) | BcryptError(_) | JwtError(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error")
            }
        }
    }

    /// Converte o erro de domínio na resposta HTTP, traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let (status, key) = self.descriptor();

        if status == StatusCode::INTERNAL_SERVER_ERROR || status == StatusCode::BAD_GATEWAY {
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let params: Vec<(&str, String)> = match self {
            AppError::IllegalTransition { from, to } => {
                vec![("from", from.to_string()), ("to", to.to_string())]
            }
            AppError::PermissionDenied(slug) | AppError::PermissionNotFound(slug) => {
                vec![("permission", slug.clone())]
            }
            AppError::SubdomainAlreadyExists(subdomain) => vec![("subdomain", subdomain.clone())],
            AppError::InvalidMultipart(reason) => vec![("reason", reason.clone())],
            AppError::UniqueConstraintViolation(what) => vec![("constraint", what.clone())],
            _ => Vec::new(),
        };

        let mut api_error = ApiError::new(status, key, i18n.translate(&locale.0, key, &params));

        if let AppError::ValidationError(errors) = self {
            let mut details: HashMap<String, Vec<String>> = HashMap::new();
            for (field, field_errors) in errors.field_errors() {
                let messages = field_errors
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                details.insert(field.to_string(), messages);
            }
            api_error.details = Some(json!(details));
        }

        api_error
    }
}

// Handlers sem `Locale` (rotas públicas) respondem no idioma padrão.
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), I18nStore::global()).into_response()
    }
}

/// Traduz violações de chave estrangeira / unicidade em erros de domínio.
pub fn map_constraint(e: sqlx::Error, on_foreign_key: AppError) -> AppError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_foreign_key_violation() {
            return on_foreign_key;
        }
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(
                db_err.constraint().unwrap_or_default().to_string(),
            );
        }
    }
    e.into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[test]
    fn business_rejections_are_bad_request_with_portuguese_message() {
        let store = I18nStore::new();
        let api = AppError::InsufficientCredit.to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.code(), "BAD_REQUEST");
        assert_eq!(api.key, "insufficient_credit");
        assert_eq!(api.error, "Cliente não possui crédito suficiente para esta compra");
    }

    #[test]
    fn illegal_transition_message_names_both_states() {
        let store = I18nStore::new();
        let err = AppError::IllegalTransition {
            from: OrderStatus::Delivered,
            to: OrderStatus::Pending,
        };
        let api = err.to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert!(api.error.contains("DELIVERED"));
        assert!(api.error.contains("PENDING"));
    }

    #[test]
    fn permission_denied_is_forbidden_and_names_the_slug() {
        let store = I18nStore::new();
        let api = AppError::PermissionDenied("receber_fiado".into()).to_api_error(&pt(), &store);

        assert_eq!(api.code(), "FORBIDDEN");
        assert!(api.error.contains("receber_fiado"));
    }

    #[test]
    fn infrastructure_errors_hide_details() {
        let store = I18nStore::new();
        let err = AppError::InternalServerError(anyhow::anyhow!("conexão recusada"));
        let api = err.to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("conexão recusada"));
    }

    #[test]
    fn missing_session_maps_to_unauthorized() {
        let store = I18nStore::new();
        let api = AppError::InvalidToken.to_api_error(&pt(), &store);
        assert_eq!(api.code(), "UNAUTHORIZED");
    }

    #[test]
    fn english_locale_is_honoured() {
        let store = I18nStore::new();
        let api = AppError::NoCourierSelected.to_api_error(&Locale("en".into()), &store);
        assert_eq!(api.error, "No courier selected");
    }
}
