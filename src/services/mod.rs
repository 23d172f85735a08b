pub mod balance;
pub mod inventory;
pub mod sales;

pub use balance::BalanceService;
pub use inventory::InventoryService;
pub use sales::SalesService;
