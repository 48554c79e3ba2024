use std::process::ExitCode;

/// Errors that cause chat-bubbles to exit with a specific code.
#[derive(Debug, thiserror::Error)]
pub enum ExitError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("settings not saved: {message}")]
    SaveRejected { message: String },

    #[error("invalid input: {0}")]
    Input(String),
}

impl ExitError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            ExitError::Config(_) => ExitCode::from(2),
            ExitError::Storage(_) => ExitCode::from(3),
            ExitError::SaveRejected { .. } => ExitCode::from(4),
            ExitError::Input(_) => ExitCode::from(5),
        }
    }
}

impl From<crate::storage::StorageError> for ExitError {
    fn from(err: crate::storage::StorageError) -> Self {
        ExitError::Storage(err.to_string())
    }
}

impl From<crate::settings::SettingsError> for ExitError {
    fn from(err: crate::settings::SettingsError) -> Self {
        ExitError::Input(err.to_string())
    }
}
