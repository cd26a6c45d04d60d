mod env_vars;
mod loader;
mod merge;
mod resolved;
mod settings;

pub use env_vars::{collect_overrides, EnvOverride, ENV_PREFIX};
pub use loader::ConfigLoader;
pub use merge::merge;
pub use resolved::ResolvedConfig;
pub use settings::{defaults, HttpSettings, LoggingSettings, ReportSettings, TestSettings};
