//! HTTP handlers for the Grain Manager API

pub mod dispatch;
pub mod health;
pub mod inventory;
pub mod reporting;
pub mod transaction;

pub use dispatch::*;
pub use health::*;
pub use inventory::*;
pub use reporting::*;
pub use transaction::*;
