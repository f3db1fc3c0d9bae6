pub mod auth;
pub mod cashiers;
pub mod customers;
pub mod delivery;
pub mod images;
pub mod logs;
pub mod orders;
pub mod payments;
pub mod rbac;
pub mod stock;
pub mod tenancy;
