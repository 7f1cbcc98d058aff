//! Core domain types and logic.

pub mod signal;
pub mod request;
pub mod order;
pub mod allocation;
pub mod config_validation;
pub mod error;
