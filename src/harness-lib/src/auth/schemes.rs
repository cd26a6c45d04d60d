use super::spec::{scalar_to_string, AuthSpec, BearerSpec};
use crate::config::ResolvedConfig;
use crate::error::AuthError;
use crate::http::HeaderSet;
use serde_json::{Map, Value};
use std::collections::HashMap;

const TYPE_FIELD: &str = "type";

/// Builds an [`AuthSpec`] from the fields of `auth.<service>` (without `type`).
pub type SchemeParser = fn(service: &str, fields: &Map<String, Value>) -> Result<AuthSpec, AuthError>;

/// Registration table from the `type` name in `auth.<service>` to a parser.
///
/// Parsers always produce one of the closed [`AuthSpec`] variants, so registering a
/// new name adds a configuration shape, never a new way of sending credentials.
#[derive(Clone)]
pub struct AuthSchemes {
    parsers: HashMap<String, SchemeParser>,
}

impl Default for AuthSchemes {
    fn default() -> Self {
        let mut schemes = Self {
            parsers: HashMap::new(),
        };
        schemes.register("bearer", parse_bearer);
        schemes.register("basic", parse_basic);
        schemes.register("api_key", parse_api_key);
        schemes.register("custom", parse_custom);
        schemes
    }
}

impl AuthSchemes {
    pub fn register(&mut self, name: &str, parser: SchemeParser) {
        self.parsers.insert(name.to_lowercase(), parser);
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        names.sort();
        names
    }

    /// Parses one `auth.<service>` mapping. `type` defaults to `bearer`.
    pub fn parse(&self, service: &str, value: &Value) -> Result<AuthSpec, AuthError> {
        let map = value.as_object().ok_or_else(|| AuthError::InvalidSpec {
            service: service.to_string(),
            message: "expected a mapping".to_string(),
        })?;

        let kind = match map.get(TYPE_FIELD) {
            None => "bearer".to_string(),
            Some(Value::String(kind)) => kind.to_lowercase(),
            Some(_) => {
                return Err(AuthError::InvalidSpec {
                    service: service.to_string(),
                    message: format!("'{TYPE_FIELD}' must be a string"),
                })
            }
        };

        let parser = self
            .parsers
            .get(&kind)
            .ok_or_else(|| AuthError::UnknownScheme {
                service: service.to_string(),
                kind: kind.clone(),
            })?;

        let mut fields = map.clone();
        fields.remove(TYPE_FIELD);
        parser(service, &fields)
    }

    /// The spec configured under `auth.<service>`, if any.
    pub fn spec_for(
        &self,
        config: &ResolvedConfig,
        service: &str,
    ) -> Result<Option<AuthSpec>, AuthError> {
        match config.section("auth").and_then(|auth| auth.get(service)) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => self.parse(service, value).map(Some),
        }
    }
}

fn parse_bearer(service: &str, fields: &Map<String, Value>) -> Result<AuthSpec, AuthError> {
    let spec: BearerSpec = serde_json::from_value(Value::Object(fields.clone()))
        .map_err(|e| invalid(service, e.to_string()))?;

    if spec.token.as_deref().is_some_and(|t| t.trim().is_empty()) {
        return Err(invalid(service, "bearer 'token' is empty".to_string()));
    }
    if spec.token.is_none() && spec.login.is_none() {
        return Err(invalid(
            service,
            "bearer auth needs either 'token' or 'login'".to_string(),
        ));
    }
    Ok(AuthSpec::Bearer(spec))
}

fn parse_basic(service: &str, fields: &Map<String, Value>) -> Result<AuthSpec, AuthError> {
    Ok(AuthSpec::Basic {
        username: required_string(service, fields, "username")?,
        password: required_string(service, fields, "password")?,
    })
}

fn parse_api_key(service: &str, fields: &Map<String, Value>) -> Result<AuthSpec, AuthError> {
    let header = match fields.get("header") {
        Some(_) => required_string(service, fields, "header")?,
        None => "X-API-Key".to_string(),
    };
    Ok(AuthSpec::ApiKey {
        header,
        value: required_string(service, fields, "value")?,
    })
}

fn parse_custom(service: &str, fields: &Map<String, Value>) -> Result<AuthSpec, AuthError> {
    let raw = fields
        .get("headers")
        .and_then(Value::as_object)
        .ok_or_else(|| invalid(service, "custom auth needs a 'headers' mapping".to_string()))?;

    let mut headers = HeaderSet::new();
    for (name, value) in raw {
        let text = scalar_to_string(value)
            .ok_or_else(|| invalid(service, format!("header '{name}' must be a scalar")))?;
        headers.set(name.as_str(), text);
    }
    Ok(AuthSpec::Custom { headers })
}

fn required_string(
    service: &str,
    fields: &Map<String, Value>,
    field: &str,
) -> Result<String, AuthError> {
    match fields.get(field).and_then(scalar_to_string) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        Some(_) => Err(invalid(service, format!("'{field}' is empty"))),
        None => Err(invalid(service, format!("missing required field '{field}'"))),
    }
}

fn invalid(service: &str, message: String) -> AuthError {
    AuthError::InvalidSpec {
        service: service.to_string(),
        message,
    }
}
