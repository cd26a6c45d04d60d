use apiharness_lib::error::{ClientError, ConfigError, HookError, SuiteError};
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum HarnessError {
    Io(io::Error),
    Config(ConfigError),
    Suite(SuiteError),
    Client(ClientError),
    Hook(HookError),
    Usage(clap::Error),
    ProjectExists(String),
    CasesFailed { failed: usize, total: usize },
}

impl fmt::Display for HarnessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HarnessError::Io(err) => write!(f, "IO error: {err}"),
            HarnessError::Config(err) => write!(f, "{err}"),
            HarnessError::Suite(err) => write!(f, "{err}"),
            HarnessError::Client(err) => write!(f, "{err}"),
            HarnessError::Hook(err) => write!(f, "{err}"),
            HarnessError::Usage(err) => write!(f, "{err}"),
            HarnessError::ProjectExists(path) => write!(f, "Directory {path} already exists"),
            HarnessError::CasesFailed { failed, total } => {
                write!(f, "{failed} of {total} case(s) failed")
            }
        }
    }
}

impl std::error::Error for HarnessError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HarnessError::Io(err) => Some(err),
            HarnessError::Config(err) => Some(err),
            HarnessError::Suite(err) => Some(err),
            HarnessError::Client(err) => Some(err),
            HarnessError::Hook(err) => Some(err),
            HarnessError::Usage(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for HarnessError {
    fn from(err: io::Error) -> Self {
        HarnessError::Io(err)
    }
}

impl From<ConfigError> for HarnessError {
    fn from(err: ConfigError) -> Self {
        HarnessError::Config(err)
    }
}

impl From<SuiteError> for HarnessError {
    fn from(err: SuiteError) -> Self {
        HarnessError::Suite(err)
    }
}

impl From<ClientError> for HarnessError {
    fn from(err: ClientError) -> Self {
        match err {
            ClientError::Config(err) => HarnessError::Config(err),
            other => HarnessError::Client(other),
        }
    }
}

impl From<HookError> for HarnessError {
    fn from(err: HookError) -> Self {
        HarnessError::Hook(err)
    }
}

impl From<clap::Error> for HarnessError {
    fn from(err: clap::Error) -> Self {
        HarnessError::Usage(err)
    }
}
