// src/docs.rs

use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::register,
        handlers::auth::login,

        // --- Users ---
        handlers::auth::get_me,

        // --- Tenancy ---
        handlers::tenancy::create_tenant,
        handlers::tenancy::list_my_tenants,
        handlers::tenancy::add_member,
        handlers::tenancy::list_motoboys,

        // --- RBAC ---
        handlers::rbac::create_role,
        handlers::rbac::list_roles,
        handlers::rbac::list_permissions,

        // --- Customers ---
        handlers::customers::create_customer,
        handlers::customers::list_customers,
        handlers::customers::get_customer,
        handlers::customers::update_customer,
        handlers::customers::delete_customer,
        handlers::customers::get_used_credit,
        handlers::customers::get_not_paid_orders,
        handlers::customers::create_address,
        handlers::customers::update_address,

        // --- Orders ---
        handlers::orders::create_fiado_order,
        handlers::orders::create_paid_order,
        handlers::orders::create_waiting_order,
        handlers::orders::update_order,
        handlers::orders::update_status,
        handlers::orders::update_expire_date,
        handlers::orders::update_courier,
        handlers::orders::cancel_order,
        handlers::orders::get_order,
        handlers::orders::get_current_orders,
        handlers::orders::get_all_orders,
        handlers::orders::get_not_paid_orders,

        // --- Payments ---
        handlers::payments::receive_payment,
        handlers::payments::list_order_payments,
        handlers::payments::update_payment,
        handlers::payments::list_pending_fiado,

        // --- Cashiers ---
        handlers::cashiers::create_cashier,
        handlers::cashiers::list_cashiers,
        handlers::cashiers::get_cashier,
        handlers::cashiers::update_cashier,
        handlers::cashiers::delete_cashier,
        handlers::cashiers::list_transactions,
        handlers::cashiers::insert_transactions,

        // --- Delivery ---
        handlers::cashiers::get_delivery_fee,
        handlers::cashiers::update_delivery_fee,
        handlers::delivery::calculate_distance,

        // --- Stock / Products ---
        handlers::stock::list_stock,
        handlers::stock::create_sku,
        handlers::stock::adjust_stock,
        handlers::stock::list_products,
        handlers::stock::create_product,

        // --- Images ---
        handlers::images::upload_image,
        handlers::images::get_image,

        // --- Logs ---
        handlers::logs::list_logs,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::User,
            models::auth::RegisterUserPayload,
            models::auth::LoginUserPayload,
            models::auth::AuthResponse,

            // --- Tenancy ---
            models::tenancy::Tenant,
            models::tenancy::TenantMembership,
            models::tenancy::Motoboy,
            models::tenancy::CreateTenantPayload,
            models::tenancy::AddMemberPayload,

            // --- RBAC ---
            models::rbac::Role,
            models::rbac::Permission,
            models::rbac::CreateRolePayload,
            models::rbac::RoleResponse,

            // --- Customers ---
            models::customer::Customer,
            models::customer::Address,
            models::customer::CustomerWithAddresses,
            models::customer::CreditSnapshot,
            models::customer::NewCustomer,
            models::customer::CustomerPatch,
            models::customer::NewAddress,
            models::customer::AddressPatch,

            // --- Orders ---
            models::order::OrderType,
            models::order::OrderStatus,
            models::order::Order,
            models::order::OrderItem,
            models::order::OrderSummary,
            models::order::OrderDetail,
            models::order::CreatedOrder,
            models::order::NewOrderItem,
            models::order::OrderInfo,
            models::order::CreateFiadoOrderPayload,
            models::order::CreatePaidOrderPayload,
            models::order::UpdateStatusPayload,
            models::order::UpdateExpireDatePayload,
            models::order::UpdateCourierPayload,
            models::order::OrderUpdate,

            // --- Payments ---
            models::payment::PaymentMethod,
            models::payment::OrderPayment,
            models::payment::NewPayment,
            models::payment::ReceivePaymentPayload,
            models::payment::PaymentPatch,
            models::payment::PendingFiado,

            // --- Cashiers ---
            models::cashier::CashierDirection,
            models::cashier::Cashier,
            models::cashier::CashierTransaction,
            models::cashier::NewCashierTransaction,
            models::cashier::InsertTransactionsPayload,
            models::cashier::CreateCashierPayload,
            models::cashier::CashierPatch,
            models::cashier::DeliveryFee,
            models::cashier::UpdateDeliveryFeePayload,

            // --- Delivery ---
            models::delivery::DeliveryDistancePayload,
            models::delivery::DeliveryQuote,

            // --- Stock ---
            models::stock::StockReason,
            models::stock::Sku,
            models::stock::Product,
            models::stock::StockTransaction,
            models::stock::ProductCategory,
            models::stock::StockAdjustPayload,
            models::stock::CreateSkuPayload,
            models::stock::CreateProductPayload,

            // --- Images ---
            models::image::UploadedImage,
            models::image::ImageUploadForm,

            // --- Logs ---
            models::logs::LogType,
            models::logs::LogEntry,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação e Registro"),
        (name = "Users", description = "Dados do Usuário"),
        (name = "Tenancy", description = "Lojas, membros e entregadores"),
        (name = "RBAC", description = "Controle de Acesso (Cargos e Permissões)"),
        (name = "Customers", description = "Clientes, endereços e crédito"),
        (name = "Orders", description = "Pedidos fiados, pagos e de entrega"),
        (name = "Payments", description = "Pagamentos e recebimento de fiado"),
        (name = "Cashiers", description = "Caixas e movimentações"),
        (name = "Delivery", description = "Taxa e distância de entrega"),
        (name = "Stock", description = "Estoque por SKU"),
        (name = "Products", description = "Catálogo de produtos"),
        (name = "Images", description = "Imagens de produtos"),
        (name = "Logs", description = "Trilha de auditoria")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme("api_jwt", SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_group_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/api/orders/fiado",
            "/api/orders/{order_id}/cancel",
            "/api/cashiers/{cashier_id}/transactions",
            "/api/delivery/distance",
            "/api/stock",
            "/api/images/{image_id}",
            "/api/logs",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota sem documentação: {path}");
        }
    }

    #[test]
    fn bearer_scheme_is_registered() {
        let doc = ApiDoc::openapi();
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
