use crate::core::error::HarnessError;
use apiharness_lib::error::ConfigError;

/// Process exit codes of the harness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    /// At least one case failed, or an unexpected error.
    Failure = 1,
    /// Bad command line.
    Usage = 2,
    /// Configuration could not be resolved.
    Config = 3,
    /// Missing or unreadable files.
    File = 4,
}

impl ExitCode {
    pub fn code(&self) -> i32 {
        *self as i32
    }
}

impl From<&HarnessError> for ExitCode {
    fn from(error: &HarnessError) -> Self {
        match error {
            HarnessError::Io(_) | HarnessError::Suite(_) | HarnessError::ProjectExists(_) => {
                ExitCode::File
            }
            HarnessError::Config(ConfigError::Read { .. } | ConfigError::Write { .. }) => {
                ExitCode::File
            }
            HarnessError::Config(_) => ExitCode::Config,
            HarnessError::Usage(err) if !err.use_stderr() => ExitCode::Success,
            HarnessError::Usage(_) => ExitCode::Usage,
            HarnessError::Client(_) | HarnessError::Hook(_) | HarnessError::CasesFailed { .. } => {
                ExitCode::Failure
            }
        }
    }
}
