use thiserror::Error;

/// Failure taxonomy shared by every provisioning component.
///
/// Each variant maps to a stable process exit code so calling scripts can
/// branch on the kind of failure without parsing diagnostics.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProvisionError {
    /// A required command or input file is missing before anything was mutated.
    #[error("{0}")]
    Prerequisite(String),

    #[error("unsupported distribution (id: '{id}', categories: '{categories}')")]
    UnsupportedDistribution { id: String, categories: String },

    #[error("command not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Permission(String),

    /// Failed external command, parse failure or unexpected missing field.
    #[error("{0}")]
    Generic(String),
}

pub type ProvisionResult<T> = std::result::Result<T, ProvisionError>;

/// Exit status used when a configuration-level programming error aborts the process.
pub const FATAL_EXIT_CODE: i32 = 70;

impl ProvisionError {
    pub fn exit_code(&self) -> i32 {
        match self {
            ProvisionError::Generic(_) => 1,
            ProvisionError::Prerequisite(_) => 2,
            ProvisionError::UnsupportedDistribution { .. } => 3,
            ProvisionError::NotFound(_) => 4,
            ProvisionError::Permission(_) => 5,
        }
    }

    pub fn generic(message: impl Into<String>) -> Self {
        ProvisionError::Generic(message.into())
    }

    pub fn prerequisite(message: impl Into<String>) -> Self {
        ProvisionError::Prerequisite(message.into())
    }
}
