// src/common/test_support.rs
//
// Loja de teste para os fluxos que só fazem sentido contra o Postgres.
// Lê `DATABASE_URL` do ambiente (ou do .env); sem ela esses testes retornam cedo.
// Cada `TestStore` cria sua própria loja, então os testes não se enxergam.

use std::{sync::Arc, time::Duration};

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::db_utils::pool_options,
    config::{AppState, Config},
    models::{
        auth::User,
        cashier::Cashier,
        customer::{Customer, NewCustomer},
        logs::{LogEntry, LogQuery},
        order::{NewOrderItem, OrderInfo, OrderType},
        stock::{CreateProductPayload, CreateSkuPayload, Product, Sku, StockQuery},
        tenancy::CreateTenantPayload,
    },
    services::{
        auth::issue_token,
        geo::{tests::StubGeocoder, Geocoder},
    },
};

const JWT_SECRET: &str = "segredo-de-teste";

pub(crate) fn database_url() -> Option<String> {
    dotenvy::dotenv().ok();
    match std::env::var("DATABASE_URL") {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!("DATABASE_URL não definida: teste de banco ignorado");
            None
        }
    }
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, &Uuid::new_v4().simple().to_string()[..12])
}

pub(crate) struct TestStore {
    pub state: AppState,
    pub tenant_id: Uuid,
    pub owner: User,
}

impl TestStore {
    pub async fn new() -> Option<Self> {
        let url = database_url()?;
        let pool = pool_options(5, Duration::from_secs(10))
            .connect(&url)
            .await
            .expect("conexão com o banco de teste");
        sqlx::migrate!().run(&pool).await.expect("migrações");

        let config = Config {
            database_url: url,
            jwt_secret: JWT_SECRET.into(),
            bind_addr: "127.0.0.1:0".into(),
            db_max_connections: 5,
            db_acquire_timeout: Duration::from_secs(10),
            jwt_ttl_days: 1,
            geocoder_url: "http://geocoder.invalid".into(),
            geocoder_user_agent: "testes".into(),
            strict_status_transitions: true,
        };
        let geocoder: Arc<dyn Geocoder> = Arc::new(StubGeocoder(None));
        let state = AppState::assemble(pool, config, geocoder);

        let owner = new_user(&state.db_pool, "dono").await;
        let tenant = state
            .tenant_service
            .create_tenant_with_owner(
                &CreateTenantPayload {
                    name: "Distribuidora Teste".into(),
                    subdomain: unique("loja"),
                    address: None,
                    lat: Some(-22.9056),
                    lng: Some(-47.0608),
                },
                &owner,
            )
            .await
            .expect("loja de teste");

        Some(Self {
            state,
            tenant_id: tenant.id,
            owner,
        })
    }

    pub fn pool(&self) -> &PgPool {
        &self.state.db_pool
    }

    pub async fn user(&self, name: &str) -> User {
        new_user(self.pool(), name).await
    }

    pub fn token(&self, user: &User) -> String {
        issue_token(user.id, JWT_SECRET, 1).expect("token")
    }

    pub async fn customer(&self, max_credit: i64) -> Customer {
        self.state
            .customer_service
            .create(
                self.pool(),
                self.tenant_id,
                &NewCustomer {
                    name: unique("cliente"),
                    email: None,
                    phone: None,
                    cellphone: None,
                    cpf_cnpj: None,
                    is_retail: true,
                    max_credit: Decimal::from(max_credit),
                },
            )
            .await
            .expect("cliente")
    }

    /// Produto ligado a um SKU com o estoque inicial informado.
    pub async fn product(&self, stock: i64, price: i64) -> (Sku, Product) {
        let stock_service = &self.state.stock_service;
        let sku = stock_service
            .create_sku(
                self.pool(),
                self.tenant_id,
                &CreateSkuPayload {
                    name: unique("sku"),
                    quantity: Decimal::from(stock),
                    cost_price: Decimal::ONE,
                },
            )
            .await
            .expect("sku");
        let product = stock_service
            .create_product(
                self.pool(),
                self.tenant_id,
                &CreateProductPayload {
                    name: sku.name.clone(),
                    sku_id: Some(sku.id),
                    category: "Bebidas".into(),
                    price: Decimal::from(price),
                    image_id: None,
                },
            )
            .await
            .expect("produto");
        (sku, product)
    }

    pub async fn cashier(&self) -> Cashier {
        self.state
            .cashier_service
            .create(self.pool(), self.tenant_id, &unique("caixa"))
            .await
            .expect("caixa")
    }

    pub async fn sku_quantity(&self, sku_id: Uuid) -> Decimal {
        let mut conn = self.pool().acquire().await.expect("conexão");
        let page = self
            .state
            .stock_service
            .list(&mut conn, self.tenant_id, &StockQuery::default())
            .await
            .expect("estoque");
        page.rows
            .into_iter()
            .find(|s| s.id == sku_id)
            .map(|s| s.quantity)
            .expect("sku da loja")
    }

    pub async fn cashier_balance(&self, cashier_id: Uuid) -> Decimal {
        self.state
            .cashier_service
            .get(self.pool(), self.tenant_id, cashier_id)
            .await
            .expect("caixa")
            .currency
    }

    pub async fn logs(&self, order_id: Option<Uuid>, customer_id: Option<Uuid>) -> Vec<LogEntry> {
        self.state
            .audit_service
            .list(
                self.pool(),
                self.tenant_id,
                &LogQuery {
                    order_id,
                    customer_id,
                    log_type: None,
                    limit: Some(500),
                },
            )
            .await
            .expect("logs")
    }
}

async fn new_user(pool: &PgPool, name: &str) -> User {
    let email = format!("{}@teste.dev", unique(name));
    crate::db::UserRepository::new(pool.clone())
        .create_user(pool, &email, name, "hash-que-nao-e-usado")
        .await
        .expect("usuário")
}

pub(crate) fn item(product: &Product, quantity: i64) -> NewOrderItem {
    NewOrderItem {
        product_id: product.id,
        quantity: Decimal::from(quantity),
        price: product.price,
    }
}

/// Balcão, sem motoboy e sem taxa.
pub(crate) fn counter_info(customer_id: Option<Uuid>, total: i64, cashier_id: Option<Uuid>) -> OrderInfo {
    OrderInfo {
        customer_id,
        address_id: None,
        total: Decimal::from(total),
        observation: String::new(),
        order_type: OrderType::Balcao,
        motoboy_id: None,
        cashier_id,
        taxa_entrega: None,
    }
}
