//! Domain error types.

/// A form or CLI value that could not be turned into a number.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParamError {
    #[error("{field} is empty")]
    Empty { field: &'static str },

    #[error("{field} is not a number: {value:?}")]
    NotANumber { field: &'static str, value: String },

    #[error("{field} must be a finite number")]
    NotFinite { field: &'static str },
}

impl ParamError {
    pub fn field(&self) -> &'static str {
        match self {
            ParamError::Empty { field }
            | ParamError::NotANumber { field, .. }
            | ParamError::NotFinite { field } => field,
        }
    }
}

/// Top-level error type for signalpulse.
#[derive(Debug, thiserror::Error)]
pub enum SignalPulseError {
    #[error("database error: {reason}")]
    Database { reason: String },

    #[error("database query error: {reason}")]
    DatabaseQuery { reason: String },

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no signal files found in {dir}")]
    NoSignalFiles { dir: String },

    #[error("failed to parse signal file {file}: {reason}")]
    SignalParse { file: String, reason: String },

    #[error(transparent)]
    InvalidParameter(#[from] ParamError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SignalPulseError> for std::process::ExitCode {
    fn from(err: &SignalPulseError) -> Self {
        let code: u8 = match err {
            SignalPulseError::Io(_) => 1,
            SignalPulseError::ConfigParse { .. }
            | SignalPulseError::ConfigMissing { .. }
            | SignalPulseError::ConfigInvalid { .. } => 2,
            SignalPulseError::Database { .. } | SignalPulseError::DatabaseQuery { .. } => 3,
            SignalPulseError::InvalidParameter(_) => 4,
            SignalPulseError::NoSignalFiles { .. } | SignalPulseError::SignalParse { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
