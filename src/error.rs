use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlotrunError {
    #[error("IO operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Required program not found on PATH: {program}")]
    CommandNotFound { program: String },

    #[error("Pipeline run exited with status {status}")]
    EngineFailed { status: i32 },

    #[error("Pipeline run was terminated by a signal")]
    EngineTerminated,

    #[error("Job submission failed: {message}")]
    SubmitFailed { message: String },

    #[error("SQLite operation failed: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Invalid list entry '{line}': {reason}")]
    InvalidListEntry { line: String, reason: String },

    #[error("Input list has no database paths: {path}")]
    EmptyList { path: String },

    #[error("Input directory does not exist or is not a directory: {path}")]
    InvalidInputDir { path: String },

    #[error("Invalid database filename pattern: {pattern}")]
    InvalidPattern { pattern: String },

    #[error("Operation was cancelled by user")]
    Cancelled,
}

pub trait UserFriendlyError {
    fn user_message(&self) -> String;
    fn suggestion(&self) -> Option<String>;
}

impl UserFriendlyError for PlotrunError {
    fn user_message(&self) -> String {
        match self {
            PlotrunError::Config { message } => {
                format!("Configuration error: {}", message)
            }
            PlotrunError::CommandNotFound { program } => {
                format!("Required program not found on PATH: {}", program)
            }
            PlotrunError::EngineFailed { status } => {
                format!("Pipeline run exited with status {}", status)
            }
            PlotrunError::EngineTerminated => {
                "Pipeline run was terminated by a signal".to_string()
            }
            PlotrunError::SubmitFailed { message } => {
                format!("Job submission failed: {}", message)
            }
            PlotrunError::InvalidListEntry { line, reason } => {
                format!("Invalid list entry '{}': {}", line, reason)
            }
            PlotrunError::EmptyList { path } => {
                format!("Input list has no database paths: {}", path)
            }
            PlotrunError::InvalidInputDir { path } => {
                format!(
                    "Input directory does not exist or is not a directory: {}",
                    path
                )
            }
            PlotrunError::InvalidPattern { pattern } => {
                format!("Invalid database filename pattern: {}", pattern)
            }
            PlotrunError::Cancelled => "Operation was cancelled by user".to_string(),
            _ => self.to_string(),
        }
    }

    fn suggestion(&self) -> Option<String> {
        match self {
            PlotrunError::Config { .. } => Some(
                "Check your configuration file syntax and ensure all required fields are present.".to_string()
            ),
            PlotrunError::CommandNotFound { program } => Some(format!(
                "Ensure '{}' is installed and on PATH. On the cluster this usually means running inside a job where the environment modules are loaded.",
                program
            )),
            PlotrunError::EngineFailed { .. } => Some(
                "Inspect the Nextflow log (.nextflow.log) and the scheduler's job output for the failing pipeline stage. Re-launching keeps the -resume behaviour, so completed stages are not recomputed.".to_string()
            ),
            PlotrunError::SubmitFailed { .. } => Some(
                "Check that sbatch is available and that the requested resources are valid for your cluster partition.".to_string()
            ),
            PlotrunError::InvalidListEntry { .. } => Some(
                "List files must contain one absolute SQLite path per line. Regenerate the list with 'plotrun list-dbs'.".to_string()
            ),
            PlotrunError::EmptyList { .. } => Some(
                "Regenerate the list with 'plotrun list-dbs' and verify the scanned directory contains QTS*.sqlite files.".to_string()
            ),
            PlotrunError::InvalidInputDir { .. } => Some(
                "Verify the directory path and that it is reachable from this host.".to_string()
            ),
            PlotrunError::InvalidPattern { .. } => Some(
                "The pattern must be a valid regular expression matched against file names, e.g. '^QTS.*\\.sqlite$'.".to_string()
            ),
            _ => None,
        }
    }
}

impl From<toml::de::Error> for PlotrunError {
    fn from(error: toml::de::Error) -> Self {
        PlotrunError::Config {
            message: error.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PlotrunError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_friendly_messages() {
        let error = PlotrunError::CommandNotFound {
            program: "sbatch".to_string(),
        };
        assert!(error.user_message().contains("sbatch"));
        assert!(error.suggestion().is_some());
    }

    #[test]
    fn test_engine_failed_message() {
        let error = PlotrunError::EngineFailed { status: 137 };
        assert!(error.user_message().contains("137"));
        assert!(error.suggestion().unwrap().contains("-resume"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let toml_error = toml::from_str::<toml::Value>("not [ valid").unwrap_err();
        let error = PlotrunError::from(toml_error);
        assert!(matches!(error, PlotrunError::Config { .. }));
    }
}
