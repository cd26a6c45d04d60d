use apiharness_lib::config::{ConfigLoader, ResolvedConfig};
use apiharness_lib::error::ConfigError;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

fn config_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    write(
        dir.path(),
        "config.yml",
        r#"
common:
  username: [base_user]
  password: [base_pass]
http:
  timeout: 10
  default: http://base.local
logging:
  level: info
"#,
    );
    write(
        dir.path(),
        "env_test.yml",
        r#"
common:
  username: [test_user, second_user]
http:
  timeout: 20
  factory: http://factory.test
auth:
  factory:
    type: basic
    username: u
    password: p
"#,
    );
    dir
}

fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

#[test]
fn test_precedence_defaults_base_env_file_and_variables() {
    let dir = config_dir();
    let config = ConfigLoader::new(dir.path())
        .with_env_vars(vars(&[("API_TEST__HTTP__RETRY_COUNT", "3")]))
        .resolve("test")
        .unwrap();

    assert_eq!(config.environment(), "test");
    // env file wins over base file
    assert_eq!(config.get_u64("http.timeout"), Some(20));
    // sequences replace instead of merging
    assert_eq!(
        config.get("common.username"),
        Some(&json!(["test_user", "second_user"]))
    );
    // base file keys survive the merge
    assert_eq!(config.get_str("common.password.0"), Some("base_pass"));
    // defaults fill the gaps
    assert_eq!(config.get_bool("http.verify_ssl"), Some(true));
    assert_eq!(config.get_u64("logging.body_limit"), Some(2048));
    // variables win over everything
    assert_eq!(config.http_settings().unwrap().retry_count, 3);
}

#[test]
fn test_dotenv_applies_before_process_variables() {
    let dir = config_dir();
    write(
        dir.path(),
        ".env",
        "API_TEST__HTTP__TIMEOUT=30\nAPI_TEST__LOGGING__LEVEL=debug\n",
    );

    let config = ConfigLoader::new(dir.path())
        .with_env_vars(vars(&[("api_test__http__timeout", "40")]))
        .resolve("test")
        .unwrap();

    assert_eq!(config.get_u64("http.timeout"), Some(40));
    assert_eq!(config.get_str("logging.level"), Some("debug"));

    let without = ConfigLoader::new(dir.path())
        .without_dotenv()
        .with_env_vars(Vec::new())
        .resolve("test")
        .unwrap();
    assert_eq!(without.get_str("logging.level"), Some("info"));
}

#[test]
fn test_override_order_does_not_matter() {
    let dir = config_dir();
    let pairs = [
        ("API_TEST__HTTP", r#"{"timeout": 1, "extra": true}"#),
        ("API_TEST__HTTP__TIMEOUT", "5"),
        ("API_TEST__COMMON__USERNAME", r#"["env_user"]"#),
    ];
    let mut reversed = pairs;
    reversed.reverse();

    let forward = ConfigLoader::new(dir.path())
        .with_env_vars(vars(&pairs))
        .resolve("test")
        .unwrap();
    let backward = ConfigLoader::new(dir.path())
        .with_env_vars(vars(&reversed))
        .resolve("test")
        .unwrap();

    assert_eq!(forward, backward);
    assert_eq!(forward.get_u64("http.timeout"), Some(5));
    assert_eq!(forward.get_str("common.username.0"), Some("env_user"));
    // a mapping override merges into the section
    assert_eq!(forward.get_str("http.default"), Some("http://base.local"));
    assert_eq!(forward.get_str("http.factory"), Some("http://factory.test"));
    assert_eq!(forward.get_bool("http.extra"), Some(true));
    assert_eq!(forward.get_bool("http.verify_ssl"), Some(true));
}

#[test]
fn test_numeric_looking_override_keeps_string_setting() {
    let dir = config_dir();
    let config = ConfigLoader::new(dir.path())
        .with_env_vars(vars(&[
            ("API_TEST__AUTH__FACTORY__PASSWORD", "123456"),
            ("API_TEST__AUTH__FACTORY__USERNAME", "null"),
            ("API_TEST__HTTP__RETRY_COUNT", "2"),
        ]))
        .resolve("test")
        .unwrap();

    assert_eq!(config.get("auth.factory.password"), Some(&json!("123456")));
    assert_eq!(config.get("auth.factory.username"), Some(&json!("null")));
    assert_eq!(config.get("http.retry_count"), Some(&json!(2)));
}

#[test]
fn test_resolution_is_deterministic_and_round_trips() {
    let dir = config_dir();
    let loader = ConfigLoader::new(dir.path()).with_env_vars(vars(&[(
        "API_TEST__REDIS__PORT",
        "6379",
    )]));

    let first = loader.resolve("test").unwrap();
    let second = loader.resolve("test").unwrap();
    assert_eq!(first, second);

    let reload_dir = tempfile::tempdir().unwrap();
    first
        .write_to(&reload_dir.path().join("config.yml"))
        .unwrap();
    write(reload_dir.path(), "env_test.yml", "{}\n");

    let reloaded = ConfigLoader::new(reload_dir.path())
        .with_env_vars(Vec::new())
        .resolve("test")
        .unwrap();
    assert_eq!(reloaded.tree(), first.tree());
}

#[test]
fn test_missing_environment_file() {
    let dir = config_dir();
    let err = ConfigLoader::new(dir.path())
        .with_env_vars(Vec::new())
        .resolve("prod")
        .unwrap_err();
    assert!(matches!(err, ConfigError::NotFound(path) if path.ends_with("env_prod.yml")));
}

#[test]
fn test_malformed_and_non_mapping_files() {
    let dir = config_dir();
    write(dir.path(), "env_broken.yml", "http: [unclosed");
    write(dir.path(), "env_list.yml", "- a\n- b\n");
    let loader = ConfigLoader::new(dir.path()).with_env_vars(Vec::new());

    assert!(matches!(
        loader.resolve("broken").unwrap_err(),
        ConfigError::Parse { .. }
    ));
    assert!(matches!(
        loader.resolve("list").unwrap_err(),
        ConfigError::NotAMapping(_)
    ));
}

#[test]
fn test_list_environments_and_accessors() {
    let dir = config_dir();
    write(dir.path(), "env_pre.yaml", "http: {}\n");
    let loader = ConfigLoader::new(dir.path()).with_env_vars(Vec::new());
    assert_eq!(loader.list_environments().unwrap(), vec!["pre", "test"]);

    let config: ResolvedConfig = loader.resolve("test").unwrap();
    assert_eq!(config.service_base_url("factory").unwrap(), "http://factory.test");
    assert_eq!(config.service_base_url("manager").unwrap(), "http://base.local");
    assert!(config.require("common", &["username", "password"]).is_ok());
    assert!(matches!(
        config.require("db", &["host"]).unwrap_err(),
        ConfigError::MissingKeys { keys, .. } if keys == vec!["host".to_string()]
    ));
}
