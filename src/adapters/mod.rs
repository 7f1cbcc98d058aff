//! Concrete adapter implementations for ports.

pub mod csv_signal_adapter;
pub mod csv_export;
pub mod file_config_adapter;
pub mod memory_param_store;
#[cfg(feature = "sqlite")]
pub mod sqlite_param_store;
#[cfg(feature = "web")]
pub mod web;
