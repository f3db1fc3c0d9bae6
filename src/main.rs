//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, patch, post},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::{auth_guard, tenant_guard};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState::new(config).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    let app = router(app_state);

    let listener = TcpListener::bind(&bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login));

    // Só token
    let user_routes = Router::new()
        .route("/me", get(handlers::auth::get_me))
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    let tenancy_routes = Router::new()
        .route(
            "/",
            post(handlers::tenancy::create_tenant).get(handlers::tenancy::list_my_tenants),
        )
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), auth_guard));

    // Token + vínculo com a loja
    let tenant_admin_routes = Router::new()
        .route("/members", post(handlers::tenancy::add_member))
        .route(
            "/roles",
            post(handlers::rbac::create_role).get(handlers::rbac::list_roles),
        );

    let customer_routes = Router::new()
        .route(
            "/",
            post(handlers::customers::create_customer).get(handlers::customers::list_customers),
        )
        .route(
            "/{customer_id}",
            get(handlers::customers::get_customer)
                .patch(handlers::customers::update_customer)
                .delete(handlers::customers::delete_customer),
        )
        .route("/{customer_id}/used-credit", get(handlers::customers::get_used_credit))
        .route("/{customer_id}/orders/not-paid", get(handlers::customers::get_not_paid_orders))
        .route("/{customer_id}/addresses", post(handlers::customers::create_address))
        .route(
            "/{customer_id}/addresses/{address_id}",
            patch(handlers::customers::update_address),
        );

    let order_routes = Router::new()
        .route("/", get(handlers::orders::get_all_orders))
        .route("/fiado", post(handlers::orders::create_fiado_order))
        .route("/paid", post(handlers::orders::create_paid_order))
        .route("/waiting", post(handlers::orders::create_waiting_order))
        .route("/current", get(handlers::orders::get_current_orders))
        .route("/not-paid", get(handlers::orders::get_not_paid_orders))
        .route(
            "/{order_id}",
            get(handlers::orders::get_order).put(handlers::orders::update_order),
        )
        .route("/{order_id}/status", patch(handlers::orders::update_status))
        .route("/{order_id}/expire-date", patch(handlers::orders::update_expire_date))
        .route("/{order_id}/courier", patch(handlers::orders::update_courier))
        .route("/{order_id}/cancel", post(handlers::orders::cancel_order))
        .route(
            "/{order_id}/payments",
            post(handlers::payments::receive_payment).get(handlers::payments::list_order_payments),
        );

    let payment_routes = Router::new()
        .route("/pending-fiado", get(handlers::payments::list_pending_fiado))
        .route("/{payment_id}", patch(handlers::payments::update_payment));

    let cashier_routes = Router::new()
        .route(
            "/",
            post(handlers::cashiers::create_cashier).get(handlers::cashiers::list_cashiers),
        )
        .route(
            "/{cashier_id}",
            get(handlers::cashiers::get_cashier)
                .patch(handlers::cashiers::update_cashier)
                .delete(handlers::cashiers::delete_cashier),
        )
        .route(
            "/{cashier_id}/transactions",
            get(handlers::cashiers::list_transactions).post(handlers::cashiers::insert_transactions),
        );

    let delivery_routes = Router::new()
        .route("/distance", post(handlers::delivery::calculate_distance))
        .route(
            "/fee",
            get(handlers::cashiers::get_delivery_fee).put(handlers::cashiers::update_delivery_fee),
        );

    let stock_routes = Router::new()
        .route("/", get(handlers::stock::list_stock).post(handlers::stock::create_sku))
        .route("/{sku_id}/adjust", post(handlers::stock::adjust_stock));

    let product_routes = Router::new().route(
        "/",
        get(handlers::stock::list_products).post(handlers::stock::create_product),
    );

    let image_routes = Router::new()
        .route("/", post(handlers::images::upload_image))
        .route("/{image_id}", get(handlers::images::get_image));

    let tenant_scoped = Router::new()
        .nest("/tenants", tenant_admin_routes)
        .route("/motoboys", get(handlers::tenancy::list_motoboys))
        .route("/logs", get(handlers::logs::list_logs))
        .nest("/customers", customer_routes)
        .nest("/orders", order_routes)
        .nest("/payments", payment_routes)
        .nest("/cashiers", cashier_routes)
        .nest("/delivery", delivery_routes)
        .nest("/stock", stock_routes)
        .nest("/products", product_routes)
        .nest("/images", image_routes)
        .layer(axum_middleware::from_fn_with_state(app_state.clone(), tenant_guard));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/permissions", get(handlers::rbac::list_permissions))
        .nest("/api/auth", auth_routes)
        .nest("/api/users", user_routes)
        .nest("/api/tenants", tenancy_routes)
        .nest("/api", tenant_scoped)
        .with_state(app_state)
}
