// Engine error kinds.
//
// Every asynchronous operation reports failure through one of these
// variants; the wizard never retries, it stores the error and moves the
// session to the terminal page.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("ANTHROPIC_API_KEY environment variable not set")]
    CredentialMissing,

    #[error("failed to {action} {path}: {source}")]
    Io {
        action: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {what}: {reason}")]
    Parse { what: String, reason: String },

    #[error("plan service request failed: {0}")]
    PlanService(String),

    #[error("unsupported migration path: {source_format} to {target_format}")]
    UnsupportedPath {
        source_format: String,
        target_format: String,
    },

    #[error("migration cancelled by user")]
    Cancelled,
}

impl MigrationError {
    pub fn read_failure(path: &str, source: std::io::Error) -> Self {
        MigrationError::Io {
            action: "read",
            path: path.to_string(),
            source,
        }
    }

    pub fn write_failure(path: &str, source: std::io::Error) -> Self {
        MigrationError::Io {
            action: "write",
            path: path.to_string(),
            source,
        }
    }

    pub fn parse_failure(what: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        MigrationError::Parse {
            what: what.into(),
            reason: reason.to_string(),
        }
    }
}
