//! Domain error types.

/// Top-level error type for glidepath.
#[derive(Debug, thiserror::Error)]
pub enum GlidepathError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("invalid lineup: {reason}")]
    LineupInvalid { reason: String },

    #[error("input error in {file}: {reason}")]
    Input { file: String, reason: String },

    #[error("output error in {file}: {reason}")]
    Output { file: String, reason: String },

    #[error("another run holds the lock at {path} (remove it if no run is active)")]
    RunLocked { path: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&GlidepathError> for std::process::ExitCode {
    fn from(err: &GlidepathError) -> Self {
        let code: u8 = match err {
            GlidepathError::Io(_) => 1,
            GlidepathError::ConfigParse { .. }
            | GlidepathError::ConfigInvalid { .. }
            | GlidepathError::LineupInvalid { .. } => 2,
            GlidepathError::Input { .. } => 3,
            GlidepathError::Output { .. } => 4,
            GlidepathError::RunLocked { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
