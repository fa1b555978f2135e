pub mod analytics_service;
pub mod auth;
pub mod catalog_service;
pub mod customer_service;
pub mod expense_service;
pub mod inventory_service;
pub mod pricing;
pub mod return_service;
pub mod sale_service;
