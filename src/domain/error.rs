//! Domain error types.

/// Top-level error type for bandsweep.
#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("configuration error: {reason}")]
    Configuration { reason: String },

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

    #[error("csv error: {reason}")]
    Csv { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl SweepError {
    pub fn data(reason: impl Into<String>) -> Self {
        SweepError::Data {
            reason: reason.into(),
        }
    }

    pub fn configuration(reason: impl Into<String>) -> Self {
        SweepError::Configuration {
            reason: reason.into(),
        }
    }
}

impl From<csv::Error> for SweepError {
    fn from(err: csv::Error) -> Self {
        SweepError::Csv {
            reason: err.to_string(),
        }
    }
}

impl From<&SweepError> for std::process::ExitCode {
    fn from(err: &SweepError) -> Self {
        let code: u8 = match err {
            SweepError::Io(_) => 1,
            SweepError::Configuration { .. }
            | SweepError::ConfigParse { .. }
            | SweepError::ConfigMissing { .. }
            | SweepError::ConfigInvalid { .. } => 2,
            SweepError::Data { .. } => 3,
            SweepError::Csv { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}
