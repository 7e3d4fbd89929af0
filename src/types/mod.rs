//! Type definitions

pub mod contact;
pub mod expense;
pub mod import;
pub mod import_job;
pub mod inventory;
pub mod messages;
pub mod mileage;
pub mod order;

pub use contact::*;
pub use expense::*;
pub use import::*;
pub use import_job::*;
pub use inventory::*;
pub use messages::*;
pub use mileage::*;
pub use order::*;
