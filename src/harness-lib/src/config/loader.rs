use super::env_vars::{collect_overrides, read_dotenv, EnvOverride};
use super::merge::{merge, merge_at_path, value_at};
use super::resolved::ResolvedConfig;
use super::settings::defaults;
use crate::error::ConfigError;
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};

const BASE_FILE_NAMES: &[&str] = &["config.yml", "config.yaml"];
const DOTENV_FILE_NAME: &str = ".env";

/// Resolves configuration for one environment from a configuration directory.
///
/// Precedence, lowest first: built-in defaults, `config.yml`, `env_<name>.yml`,
/// `.env` overrides, process environment overrides.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    dir: PathBuf,
    env_vars: Option<Vec<(String, String)>>,
    use_dotenv: bool,
}

impl ConfigLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            env_vars: None,
            use_dotenv: true,
        }
    }

    /// Replaces the process environment as the override source.
    pub fn with_env_vars<I>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        self.env_vars = Some(vars.into_iter().collect());
        self
    }

    pub fn without_dotenv(mut self) -> Self {
        self.use_dotenv = false;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Names of the environments that have an `env_<name>.yml` file, sorted.
    pub fn list_environments(&self) -> Result<Vec<String>, ConfigError> {
        if !self.dir.is_dir() {
            return Err(ConfigError::NotFound(self.dir.clone()));
        }
        let entries = fs::read_dir(&self.dir).map_err(|source| ConfigError::Read {
            path: self.dir.clone(),
            source,
        })?;

        let mut names = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name().to_string_lossy().to_string();
            let stem = file_name
                .strip_suffix(".yml")
                .or_else(|| file_name.strip_suffix(".yaml"));
            if let Some(name) = stem.and_then(|s| s.strip_prefix("env_")) {
                if !name.is_empty() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();
        names.dedup();
        Ok(names)
    }

    pub fn resolve(&self, environment: &str) -> Result<ResolvedConfig, ConfigError> {
        validate_environment_name(environment)?;

        let mut tree = defaults();

        if let Some(base_file) = self.find_file(BASE_FILE_NAMES) {
            log::debug!("Loading base configuration from {}", base_file.display());
            merge(&mut tree, read_mapping(&base_file)?);
        }

        let env_names = [
            format!("env_{environment}.yml"),
            format!("env_{environment}.yaml"),
        ];
        let env_file = self
            .find_file(&env_names[..])
            .ok_or_else(|| ConfigError::NotFound(self.dir.join(&env_names[0])))?;
        log::debug!(
            "Loading environment '{environment}' configuration from {}",
            env_file.display()
        );
        merge(&mut tree, read_mapping(&env_file)?);

        let dotenv_path = self.dir.join(DOTENV_FILE_NAME);
        if self.use_dotenv && dotenv_path.is_file() {
            apply_overrides(&mut tree, collect_overrides(read_dotenv(&dotenv_path)?));
        }

        let overrides = match &self.env_vars {
            Some(vars) => collect_overrides(vars.iter().cloned()),
            None => collect_overrides(std::env::vars()),
        };
        apply_overrides(&mut tree, overrides);

        Ok(ResolvedConfig::new(environment, tree))
    }

    fn find_file<S: AsRef<str>>(&self, names: &[S]) -> Option<PathBuf> {
        names
            .iter()
            .map(|name| self.dir.join(name.as_ref()))
            .find(|path| path.is_file())
    }
}

fn apply_overrides(tree: &mut Value, overrides: Vec<EnvOverride>) {
    for item in overrides {
        log::debug!(
            "Configuration override {} from {}",
            item.dotted_path(),
            item.key
        );
        let value = item.value_over(value_at(tree, &item.path));
        merge_at_path(tree, &item.path, value);
    }
}

fn read_mapping(path: &Path) -> Result<Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let value: Value = serde_yaml::from_str(&content).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    match value {
        Value::Object(_) => Ok(value),
        Value::Null => Ok(Value::Object(Map::new())),
        _ => Err(ConfigError::NotAMapping(path.to_path_buf())),
    }
}

fn validate_environment_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            path: "environment".to_string(),
            message: format!("'{name}' is not a valid environment name"),
        })
    }
}
