//! Business logic services for the Grain Manager ledger

pub mod bulk_sale;
pub mod dispatch;
pub mod inventory;
pub mod ledger;
pub mod registry;
pub mod reporting;
pub mod settlement;

pub use bulk_sale::BulkSaleService;
pub use dispatch::DispatchService;
pub use inventory::InventoryService;
pub use ledger::LedgerService;
pub use registry::MasterRegistry;
pub use reporting::ReportingService;
pub use settlement::SettlementService;
