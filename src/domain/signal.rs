//! Signal rows as delivered by the upstream research process.

use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// One ticker's target from the daily signal file.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalRow {
    pub ticker: String,
    /// Signed target notional: positive = long, negative = short.
    pub target_notional: f64,
    pub ref_price: f64,
}

impl SignalRow {
    pub fn new(ticker: impl Into<String>, target_notional: f64, ref_price: f64) -> Self {
        Self {
            ticker: ticker.into(),
            target_notional,
            ref_price,
        }
    }

    pub fn abs_notional(&self) -> f64 {
        self.target_notional.abs()
    }

    pub fn is_long(&self) -> bool {
        self.target_notional > 0.0
    }

    pub fn is_short(&self) -> bool {
        self.target_notional < 0.0
    }

    /// A row is usable when every field carries a real value.
    pub fn is_complete(&self) -> bool {
        !self.ticker.is_empty() && self.target_notional.is_finite() && self.ref_price.is_finite()
    }
}

/// Strip separator characters and uppercase, so `btc_usdt` and `BTC-USDT`
/// both become `BTCUSDT`.
pub fn normalize_ticker(raw: &str) -> String {
    raw.chars()
        .filter(|c| !matches!(c, '_' | '-' | '/') && !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// The parsed contents of one signal file.
#[derive(Debug, Clone)]
pub struct SignalSnapshot {
    pub source: PathBuf,
    pub modified: DateTime<Utc>,
    pub rows: Vec<SignalRow>,
    /// Rows discarded because a required field was missing or unparseable.
    pub dropped: usize,
}

impl SignalSnapshot {
    pub fn file_name(&self) -> String {
        self.source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.source.display().to_string())
    }

    pub fn long_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_long()).count()
    }

    pub fn short_count(&self) -> usize {
        self.rows.iter().filter(|r| r.is_short()).count()
    }
}
