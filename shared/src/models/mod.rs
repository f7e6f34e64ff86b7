//! Domain models for the Grain Manager ledger

mod dispatch;
mod inventory;
mod master;
mod payment;
mod transaction;

pub use dispatch::*;
pub use inventory::*;
pub use master::*;
pub use payment::*;
pub use transaction::*;
