use crate::assertion::ValidationRule;
use crate::auth::deserialize_header_map;
use crate::client::ApiRequest;
use crate::error::SuiteError;
use crate::http::HttpMethod;
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One YAML case file: every case targets the same service.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseSuite {
    /// File stem, filled in by [`load_suites`].
    #[serde(skip)]
    pub name: String,
    pub service: String,
    #[serde(default)]
    pub cases: Vec<CaseSpec>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CaseSpec {
    pub name: String,
    #[serde(default)]
    pub skip: bool,
    pub request: RequestSpec,
    #[serde(default)]
    pub expect: Expectation,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RequestSpec {
    #[serde(default = "default_method")]
    pub method: HttpMethod,
    pub path: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
    #[serde(default)]
    pub body: Option<Value>,
    #[serde(default, deserialize_with = "deserialize_header_map")]
    pub headers: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Expectation {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub rules: Vec<ValidationRule>,
}

fn default_method() -> HttpMethod {
    HttpMethod::GET
}

impl CaseSpec {
    pub fn to_request(&self) -> ApiRequest {
        let mut request = ApiRequest::new(self.request.method, self.request.path.as_str())
            .label(self.name.as_str());
        for (name, value) in &self.request.params {
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            request = request.query(name.as_str(), text);
        }
        for (name, value) in &self.request.headers {
            request = request.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &self.request.body {
            request = request.json(body.clone());
        }
        request
    }
}

/// Loads one suite file, or every `*.yml`/`*.yaml` file of a directory in name order.
pub fn load_suites(path: &Path) -> Result<Vec<CaseSuite>, SuiteError> {
    if !path.exists() {
        return Err(SuiteError::NotFound(path.to_path_buf()));
    }

    let files = if path.is_dir() {
        suite_files(path)?
    } else {
        vec![path.to_path_buf()]
    };

    files.iter().map(|file| load_suite(file)).collect()
}

fn suite_files(dir: &Path) -> Result<Vec<PathBuf>, SuiteError> {
    let entries = std::fs::read_dir(dir).map_err(|source| SuiteError::Read {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.is_file())
        .filter(|p| {
            p.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml")
        })
        .collect();
    files.sort();
    Ok(files)
}

fn load_suite(file: &Path) -> Result<CaseSuite, SuiteError> {
    let content = std::fs::read_to_string(file).map_err(|source| SuiteError::Read {
        path: file.to_path_buf(),
        source,
    })?;
    let mut suite: CaseSuite =
        serde_yaml::from_str(&content).map_err(|source| SuiteError::Parse {
            path: file.to_path_buf(),
            source,
        })?;
    suite.name = file
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(suite)
}
