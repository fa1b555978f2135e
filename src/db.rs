pub mod user_repo;
pub use user_repo::UserRepository;
pub mod catalog_repo;
pub use catalog_repo::CatalogRepository;
pub mod inventory_repo;
pub use inventory_repo::InventoryRepository;
pub mod customer_repo;
pub use customer_repo::CustomerRepository;
pub mod sale_repo;
pub use sale_repo::SaleRepository;
pub mod return_repo;
pub use return_repo::ReturnRepository;
pub mod expense_repo;
pub use expense_repo::ExpenseRepository;
pub mod counter_repo;
pub use counter_repo::CounterRepository;
pub mod activity_repo;
pub use activity_repo::ActivityRepository;
pub mod settings_repo;
pub use settings_repo::SettingsRepository;
