//! Core domain types and simulation logic.

pub mod price;
pub mod ledger;
pub mod schedule;
pub mod bounds;
pub mod periodic;
pub mod escalating;
pub mod threshold;
pub mod returns;
pub mod comparison;
pub mod presets;
pub mod strategy;
pub mod engine;
pub mod config_validation;
pub mod error;
