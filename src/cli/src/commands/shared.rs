use crate::commands::validators;
use crate::core::formatter::OutputFormat;
use clap::Args;
use std::path::PathBuf;

pub const DEFAULT_ENVIRONMENT: &str = "local";

#[derive(Debug, Args)]
pub struct OutputArgs {
    #[arg(
        short = 'o',
        long = "output",
        help = "Output format: text or json",
        default_value_t = OutputFormat::Text,
        value_enum,
        ignore_case = true
    )]
    pub output: OutputFormat,
}

#[derive(Debug, Args)]
pub struct ConfigDirArgs {
    #[arg(
        short = 'c',
        long = "config-dir",
        default_value = "config",
        help = "Directory holding config.yml and env_<name>.yml files"
    )]
    pub config_dir: PathBuf,
}

#[derive(Debug, Args)]
pub struct EnvArgs {
    #[arg(
        short = 'e',
        long = "env",
        alias = "environment",
        help = "Environment name (selects env_<name>.yml)",
        value_parser = validators::validate_env_name
    )]
    pub environment: Option<String>,
}

impl EnvArgs {
    pub fn name(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }
}
