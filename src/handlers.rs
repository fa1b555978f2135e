pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod customers;
pub mod expenses;
pub mod inventory;
pub mod returns;
pub mod sales;
pub mod settings;
