use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref ENV_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
    static ref PROJECT_NAME_REGEX: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_.-]*$").unwrap();
}

/// Environment names select `env_<name>.yml`, so they stay file-name safe.
pub fn validate_env_name(name: &str) -> Result<String, String> {
    if name.len() > 50 {
        return Err("Environment name must be 50 characters or less".to_string());
    }
    if !ENV_NAME_REGEX.is_match(name) {
        return Err("Environment name must match pattern: ^[A-Za-z0-9_-]+$".to_string());
    }
    Ok(name.to_string())
}

pub fn validate_project_name(name: &str) -> Result<String, String> {
    if name.len() > 64 {
        return Err("Project name must be 64 characters or less".to_string());
    }
    if !PROJECT_NAME_REGEX.is_match(name) {
        return Err("Project name must match pattern: ^[A-Za-z_][A-Za-z0-9_.-]*$".to_string());
    }
    Ok(name.to_string())
}
