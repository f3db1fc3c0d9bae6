pub mod admission;
pub mod audit_service;
pub mod auth;
pub mod cashier_service;
pub mod credit_service;
pub mod customer_service;
pub mod delivery_service;
pub mod geo;
pub mod image_service;
pub mod order_service;
pub mod payment_service;
pub mod rbac_service;
pub mod stock_service;
pub mod tenancy_service;
