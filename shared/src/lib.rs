//! Shared types and domain math for the Grain Manager ledger
//!
//! This crate contains the domain models and the pure accounting
//! computations (bulk-sale allocation, settlement arithmetic, inventory
//! projection) shared between the backend service and its test suite.

pub mod allocation;
pub mod models;
pub mod settlement;
pub mod types;
pub mod validation;

pub use models::*;
pub use types::*;
