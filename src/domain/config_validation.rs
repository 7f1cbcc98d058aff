//! Configuration validation.
//!
//! Validates config fields before signals are loaded or the server starts.

use crate::domain::error::SignalPulseError;
use crate::domain::request::{
    MAX_DELTA, MAX_INVESTABLE_AMOUNT, MAX_LEVERAGE, MIN_DELTA, MIN_LEVERAGE, UniverseSize,
};
use crate::ports::config_port::ConfigPort;

pub const SESSION_SECRET_BYTES: usize = 64;

fn invalid(section: &str, key: &str, reason: impl Into<String>) -> SignalPulseError {
    SignalPulseError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.into(),
    }
}

fn missing(section: &str, key: &str) -> SignalPulseError {
    SignalPulseError::ConfigMissing {
        section: section.to_string(),
        key: key.to_string(),
    }
}

fn require_non_empty(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<String, SignalPulseError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(s),
        _ => Err(missing(section, key)),
    }
}

pub fn validate_signals_config(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    require_non_empty(config, "signals", "dir")?;
    Ok(())
}

pub fn validate_defaults_config(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    validate_investable_amount(config)?;
    validate_delta(config)?;
    validate_leverage(config)?;
    validate_universe_size(config)?;
    Ok(())
}

#[cfg(feature = "web")]
pub fn validate_web_config(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    require_non_empty(config, "auth", "username")?;
    require_non_empty(config, "auth", "password_hash")?;
    validate_session_secret(config)?;
    validate_session_lifetime(config)?;
    validate_listen(config)?;
    Ok(())
}

fn validate_investable_amount(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    let value = config.get_double("defaults", "investable_amount", 0.0);
    if !value.is_finite() || !(0.0..=MAX_INVESTABLE_AMOUNT).contains(&value) {
        return Err(invalid(
            "defaults",
            "investable_amount",
            format!("investable_amount must be between 0 and {MAX_INVESTABLE_AMOUNT}"),
        ));
    }
    Ok(())
}

fn validate_delta(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    let value = config.get_double("defaults", "delta", 0.0);
    if !(MIN_DELTA..=MAX_DELTA).contains(&value) {
        return Err(invalid("defaults", "delta", "delta must be between -1 and 1"));
    }
    Ok(())
}

fn validate_leverage(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    let value = config.get_double("defaults", "leverage", 1.0);
    if !(MIN_LEVERAGE..=MAX_LEVERAGE).contains(&value) {
        return Err(invalid(
            "defaults",
            "leverage",
            "leverage must be between 0 and 5",
        ));
    }
    Ok(())
}

fn validate_universe_size(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    let value = config.get_int(
        "defaults",
        "universe_size",
        i64::from(UniverseSize::DEFAULT.get()),
    );
    if !UniverseSize::is_allowed(value) {
        return Err(invalid(
            "defaults",
            "universe_size",
            "universe_size must be one of 10, 20, 30, 40, 50",
        ));
    }
    Ok(())
}

#[cfg(feature = "web")]
fn validate_session_secret(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    let secret = require_non_empty(config, "auth", "session_secret")?;
    let bytes = hex::decode(secret.trim())
        .map_err(|_| invalid("auth", "session_secret", "session_secret must be hex"))?;
    if bytes.len() != SESSION_SECRET_BYTES {
        return Err(invalid(
            "auth",
            "session_secret",
            format!(
                "session_secret must be {} bytes ({} hex characters)",
                SESSION_SECRET_BYTES,
                SESSION_SECRET_BYTES * 2
            ),
        ));
    }
    Ok(())
}

#[cfg(feature = "web")]
fn validate_session_lifetime(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    let value = config.get_int("auth", "session_lifetime", 86400);
    if value <= 0 {
        return Err(invalid(
            "auth",
            "session_lifetime",
            "session_lifetime must be positive",
        ));
    }
    Ok(())
}

#[cfg(feature = "web")]
fn validate_listen(config: &dyn ConfigPort) -> Result<(), SignalPulseError> {
    if let Some(listen) = config.get_string("web", "listen") {
        listen
            .trim()
            .parse::<std::net::SocketAddr>()
            .map_err(|_| invalid("web", "listen", "listen must be host:port"))?;
    }
    Ok(())
}
