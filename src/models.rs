pub mod auth;
pub mod cashier;
pub mod customer;
pub mod delivery;
pub mod image;
pub mod logs;
pub mod order;
pub mod payment;
pub mod rbac;
pub mod stock;
pub mod tenancy;
