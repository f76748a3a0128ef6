use crate::config::ConfigError;
use crate::jobs::JobError;
use crate::notices::NoticeError;
use crate::otp::OtpError;
use crate::profile::ProfileError;
use crate::reference::ReferenceImportError;
use crate::storage::StoreError;
use crate::telemetry::TelemetryError;
use crate::workflow::WorkflowError;
use std::fmt;

/// Failures that end the process: bootstrap, serving, and the CLI maintenance commands.
#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Storage(StoreError),
    Import(ReferenceImportError),
    /// A portal operation driven from the CLI was refused.
    Workflow(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::Import(err) => write!(f, "import error: {}", err),
            AppError::Workflow(err) => write!(f, "workflow error: {}", err),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::Import(err) => Some(err),
            AppError::Workflow(err) => Some(&**err),
        }
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<StoreError> for AppError {
    fn from(value: StoreError) -> Self {
        Self::Storage(value)
    }
}

impl From<ReferenceImportError> for AppError {
    fn from(value: ReferenceImportError) -> Self {
        Self::Import(value)
    }
}

impl From<WorkflowError> for AppError {
    fn from(value: WorkflowError) -> Self {
        Self::Workflow(Box::new(value))
    }
}

impl From<ProfileError> for AppError {
    fn from(value: ProfileError) -> Self {
        Self::Workflow(Box::new(value))
    }
}

impl From<JobError> for AppError {
    fn from(value: JobError) -> Self {
        Self::Workflow(Box::new(value))
    }
}

impl From<NoticeError> for AppError {
    fn from(value: NoticeError) -> Self {
        Self::Workflow(Box::new(value))
    }
}

impl From<OtpError> for AppError {
    fn from(value: OtpError) -> Self {
        Self::Workflow(Box::new(value))
    }
}
