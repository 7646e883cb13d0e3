//! Engine error taxonomy.
//!
//! Integrity errors abort a whole per-instrument computation. Arithmetic
//! degeneracies never reach this type: the math library resolves them to 0.

/// Top-level error type for tickscore.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("position series for {key} has {actual} entries, expected {expected}")]
    PositionLengthMismatch {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("unknown indicator key: {key}")]
    UnknownIndicator { key: String },

    #[error("unknown strategy key: {key}")]
    UnknownStrategy { key: String },

    #[error("bars are not strictly ascending by time_key at index {index}")]
    UnorderedBars { index: usize },

    #[error("invalid parameter {param} for {key}: {reason}")]
    InvalidParam {
        key: String,
        param: String,
        reason: String,
    },

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

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no data for {symbol}")]
    NoData { symbol: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for errors that mean the inputs or registry are inconsistent,
    /// as opposed to "nothing to compute" or an environment failure.
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            EngineError::PositionLengthMismatch { .. }
                | EngineError::UnknownIndicator { .. }
                | EngineError::UnknownStrategy { .. }
                | EngineError::UnorderedBars { .. }
        )
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. }
            | EngineError::InvalidParam { .. } => 2,
            EngineError::Data { .. } => 3,
            EngineError::PositionLengthMismatch { .. }
            | EngineError::UnknownIndicator { .. }
            | EngineError::UnknownStrategy { .. }
            | EngineError::UnorderedBars { .. } => 4,
            EngineError::NoData { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
