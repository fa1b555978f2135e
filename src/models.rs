pub mod activity;
pub mod analytics;
pub mod auth;
pub mod catalog;
pub mod customer;
pub mod expense;
pub mod inventory;
pub mod returns;
pub mod sale;
pub mod settings;
