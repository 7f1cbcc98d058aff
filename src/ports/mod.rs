//! Port traits implemented by adapters.

pub mod config_port;
pub mod signal_port;
pub mod param_store_port;
