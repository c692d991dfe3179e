//! Core domain types and decision logic.

pub mod error;
pub mod params;
pub mod lineup;
pub mod holding;
pub mod snapshot;
pub mod budget;
pub mod health;
pub mod harvest;
pub mod actions;
pub mod engine;
pub mod dashboard;
pub mod change_detection;
pub mod config_validation;
