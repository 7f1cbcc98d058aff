//! Allocation parameters supplied by the user.
//!
//! Every field is clamped into its domain by [`AllocationRequest::normalized`]
//! before the engine uses it, so out-of-range input never fails. Text input
//! from forms or the command line goes through the typed parsers at the
//! bottom of this module.

use crate::domain::error::ParamError;

pub const DEFAULT_INVESTABLE_AMOUNT: f64 = 1000.0;
pub const DEFAULT_DELTA: f64 = 0.0;
pub const DEFAULT_LEVERAGE: f64 = 1.0;

/// Upper bound on the investable amount. Keeps gross and every derived
/// size finite at maximum leverage.
pub const MAX_INVESTABLE_AMOUNT: f64 = 1e15;

pub const MIN_DELTA: f64 = -1.0;
pub const MAX_DELTA: f64 = 1.0;
pub const MIN_LEVERAGE: f64 = 0.0;
pub const MAX_LEVERAGE: f64 = 5.0;

/// Number of names in the allocation, split evenly between longs and shorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UniverseSize(u32);

impl UniverseSize {
    pub const ALLOWED: [u32; 5] = [10, 20, 30, 40, 50];
    pub const DEFAULT: UniverseSize = UniverseSize(10);

    /// Resolve any requested size; values outside [`Self::ALLOWED`] fall
    /// back to [`Self::DEFAULT`].
    pub fn resolve(requested: i64) -> Self {
        Self::ALLOWED
            .iter()
            .copied()
            .find(|&n| i64::from(n) == requested)
            .map(UniverseSize)
            .unwrap_or(Self::DEFAULT)
    }

    pub fn is_allowed(requested: i64) -> bool {
        Self::ALLOWED.iter().any(|&n| i64::from(n) == requested)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn per_side(self) -> usize {
        (self.0 / 2) as usize
    }
}

impl Default for UniverseSize {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl std::fmt::Display for UniverseSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AllocationRequest {
    pub investable_amount: f64,
    pub delta: f64,
    pub leverage: f64,
    pub universe_size: UniverseSize,
}

impl Default for AllocationRequest {
    fn default() -> Self {
        Self {
            investable_amount: DEFAULT_INVESTABLE_AMOUNT,
            delta: DEFAULT_DELTA,
            leverage: DEFAULT_LEVERAGE,
            universe_size: UniverseSize::DEFAULT,
        }
    }
}

impl AllocationRequest {
    pub fn new(investable_amount: f64, delta: f64, leverage: f64, universe_size: i64) -> Self {
        Self {
            investable_amount,
            delta,
            leverage,
            universe_size: UniverseSize::resolve(universe_size),
        }
    }

    /// Clamp every field into its domain. NaN amount/leverage become 0,
    /// NaN delta becomes neutral.
    pub fn normalized(&self) -> Self {
        let investable_amount = if self.investable_amount.is_nan() {
            0.0
        } else {
            self.investable_amount.clamp(0.0, MAX_INVESTABLE_AMOUNT)
        };
        let delta = if self.delta.is_nan() {
            DEFAULT_DELTA
        } else {
            self.delta.clamp(MIN_DELTA, MAX_DELTA)
        };
        let leverage = if self.leverage.is_nan() {
            MIN_LEVERAGE
        } else {
            self.leverage.clamp(MIN_LEVERAGE, MAX_LEVERAGE)
        };
        Self {
            investable_amount,
            delta,
            leverage,
            universe_size: self.universe_size,
        }
    }

    /// Gross capital: investable amount times leverage, after clamping.
    pub fn gross(&self) -> f64 {
        let n = self.normalized();
        n.investable_amount * n.leverage
    }
}

fn parse_number(field: &'static str, raw: &str) -> Result<f64, ParamError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParamError::Empty { field });
    }
    let value: f64 = trimmed
        .replace(',', "")
        .parse()
        .map_err(|_| ParamError::NotANumber {
            field,
            value: trimmed.to_string(),
        })?;
    if !value.is_finite() {
        return Err(ParamError::NotFinite { field });
    }
    Ok(value)
}

pub fn parse_investable_amount(raw: &str) -> Result<f64, ParamError> {
    parse_number("investable_amount", raw)
}

pub fn parse_delta(raw: &str) -> Result<f64, ParamError> {
    parse_number("delta", raw)
}

pub fn parse_leverage(raw: &str) -> Result<f64, ParamError> {
    parse_number("leverage", raw)
}

/// Parse a universe size. Any integral number parses; unsupported sizes are
/// resolved to the default by [`UniverseSize::resolve`], not rejected.
pub fn parse_universe_size(raw: &str) -> Result<UniverseSize, ParamError> {
    let value = parse_number("universe_size", raw)?;
    if value.fract() != 0.0 {
        return Ok(UniverseSize::DEFAULT);
    }
    Ok(UniverseSize::resolve(value as i64))
}

/// Result of reading a request from text fields: the request plus one error
/// per field that had to fall back to its default.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedRequest {
    pub request: AllocationRequest,
    pub errors: Vec<ParamError>,
}

/// Parse four text fields into a request, substituting the matching field of
/// `fallback` for each one that fails.
pub fn parse_request(
    investable_amount: &str,
    delta: &str,
    leverage: &str,
    universe_size: &str,
    fallback: &AllocationRequest,
) -> ParsedRequest {
    let mut errors = Vec::new();

    let investable_amount = parse_investable_amount(investable_amount).unwrap_or_else(|e| {
        errors.push(e);
        fallback.investable_amount
    });
    let delta = parse_delta(delta).unwrap_or_else(|e| {
        errors.push(e);
        fallback.delta
    });
    let leverage = parse_leverage(leverage).unwrap_or_else(|e| {
        errors.push(e);
        fallback.leverage
    });
    let universe_size = parse_universe_size(universe_size).unwrap_or_else(|e| {
        errors.push(e);
        fallback.universe_size
    });

    ParsedRequest {
        request: AllocationRequest {
            investable_amount,
            delta,
            leverage,
            universe_size,
        }
        .normalized(),
        errors,
    }
}
