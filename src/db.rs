pub mod user_repo;
pub use user_repo::UserRepository;
pub mod tenancy_repo;
pub use tenancy_repo::TenantRepository;
pub mod rbac_repo;
pub use rbac_repo::RbacRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod order_repo;
pub use order_repo::OrderRepository;
pub mod payment_repo;
pub use payment_repo::PaymentRepository;
pub mod cashier_repo;
pub use cashier_repo::CashierRepository;
pub mod stock_repo;
pub use stock_repo::StockRepository;
pub mod log_repo;
pub use log_repo::LogRepository;
pub mod image_repo;
pub use image_repo::ImageRepository;
