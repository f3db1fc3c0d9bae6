// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::PgPool;

use crate::{
    common::{db_utils::pool_options, i18n::I18nStore},
    db::{
        CashierRepository, CustomerRepository, ImageRepository, LogRepository, OrderRepository,
        PaymentRepository, RbacRepository, StockRepository, TenantRepository, UserRepository,
    },
    services::{
        audit_service::AuditService,
        auth::AuthService,
        cashier_service::CashierService,
        credit_service::CreditService,
        customer_service::CustomerService,
        delivery_service::DeliveryService,
        geo::{Geocoder, NominatimGeocoder},
        image_service::ImageService,
        order_service::OrderService,
        payment_service::PaymentService,
        rbac_service::RbacService,
        stock_service::StockService,
        tenancy_service::TenantService,
    },
};

/// Configuração lida do ambiente (.env em desenvolvimento).
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub jwt_ttl_days: i64,
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    /// `false` reativa a troca livre de status (comportamento legado).
    pub strict_status_transitions: bool,
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> anyhow::Result<T>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{} inválida ({}): {}", name, raw, e)),
        Err(_) => Ok(default),
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL deve ser definida")?,
            jwt_secret: env::var("JWT_SECRET").context("JWT_SECRET deve ser definido")?,
            bind_addr: var_or("BIND_ADDR", "0.0.0.0:3000"),
            db_max_connections: parse_var("DB_MAX_CONNECTIONS", 5)?,
            db_acquire_timeout: Duration::from_secs(parse_var("DB_ACQUIRE_TIMEOUT_SECS", 3)?),
            jwt_ttl_days: parse_var("JWT_TTL_DAYS", 7)?,
            geocoder_url: var_or("GEOCODER_URL", "https://nominatim.openstreetmap.org/search"),
            geocoder_user_agent: var_or("GEOCODER_USER_AGENT", "distribuidora-backend"),
            strict_status_transitions: parse_var("STRICT_STATUS_TRANSITIONS", true)?,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,

    // Repositórios usados direto pelos middlewares
    pub tenant_repo: TenantRepository,
    pub rbac_repo: RbacRepository,

    pub auth_service: AuthService,
    pub tenant_service: TenantService,
    pub rbac_service: RbacService,
    pub customer_service: CustomerService,
    pub credit_service: CreditService,
    pub order_service: OrderService,
    pub payment_service: PaymentService,
    pub cashier_service: CashierService,
    pub stock_service: StockService,
    pub image_service: ImageService,
    pub delivery_service: DeliveryService,
    pub audit_service: AuditService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let db_pool = pool_options(config.db_max_connections, config.db_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        let geocoder: Arc<dyn Geocoder> = Arc::new(NominatimGeocoder::new(
            &config.geocoder_url,
            &config.geocoder_user_agent,
        )?);

        Ok(Self::assemble(db_pool, config, geocoder))
    }

    // --- Monta o gráfico de dependências ---
    pub fn assemble(db_pool: PgPool, config: Config, geocoder: Arc<dyn Geocoder>) -> Self {
        let user_repo = UserRepository::new(db_pool.clone());
        let tenant_repo = TenantRepository::new();
        let rbac_repo = RbacRepository::new(db_pool.clone());
        let customer_repo = CustomerRepository::new();
        let order_repo = OrderRepository::new();
        let payment_repo = PaymentRepository::new();
        let cashier_repo = CashierRepository::new();
        let stock_repo = StockRepository::new();
        let log_repo = LogRepository::new();
        let image_repo = ImageRepository::new();

        let audit_service = AuditService::new(log_repo);
        let credit_service = CreditService::new(order_repo.clone());
        let cashier_service = CashierService::new(cashier_repo.clone(), audit_service.clone());
        let stock_service = StockService::new(stock_repo, order_repo.clone(), audit_service.clone());
        let payment_service = PaymentService::new(
            payment_repo.clone(),
            order_repo.clone(),
            cashier_service.clone(),
            audit_service.clone(),
        );
        let order_service = OrderService::new(
            order_repo.clone(),
            customer_repo.clone(),
            tenant_repo.clone(),
            rbac_repo.clone(),
            payment_repo,
            credit_service.clone(),
            payment_service.clone(),
            stock_service.clone(),
            cashier_service.clone(),
            audit_service.clone(),
            config.strict_status_transitions,
        );
        let customer_service = CustomerService::new(customer_repo, credit_service.clone());
        let delivery_service =
            DeliveryService::new(tenant_repo.clone(), cashier_repo.clone(), geocoder.clone());
        let image_service = ImageService::new(image_repo, audit_service.clone());
        let auth_service = AuthService::new(
            user_repo.clone(),
            config.jwt_secret.clone(),
            config.jwt_ttl_days,
            db_pool.clone(),
        );
        let tenant_service = TenantService::new(
            tenant_repo.clone(),
            rbac_repo.clone(),
            user_repo,
            cashier_repo,
            geocoder,
            db_pool.clone(),
        );
        let rbac_service = RbacService::new(rbac_repo.clone(), db_pool.clone());

        Self {
            db_pool,
            config: Arc::new(config),
            i18n_store: Arc::new(I18nStore::new()),
            tenant_repo,
            rbac_repo,
            auth_service,
            tenant_service,
            rbac_service,
            customer_service,
            credit_service,
            order_service,
            payment_service,
            cashier_service,
            stock_service,
            image_service,
            delivery_service,
            audit_service,
        }
    }
}
