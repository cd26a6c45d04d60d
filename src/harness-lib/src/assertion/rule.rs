use super::operator::Operator;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One declarative check against a response.
///
/// In YAML a rule is either a mapping (`{path, op, value, description}`) or a
/// sequence (`[path, op, value, description]`, trailing entries optional).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawRule")]
pub struct ValidationRule {
    pub path: String,
    pub op: Operator,
    #[serde(rename = "value")]
    pub expected: Value,
    pub description: String,
}

impl ValidationRule {
    pub fn new(path: impl Into<String>, op: Operator, expected: Value) -> Self {
        let path = path.into();
        let description = default_description(&path, op, &expected);
        Self {
            path,
            op,
            expected,
            description,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

fn default_description(path: &str, op: Operator, expected: &Value) -> String {
    match op {
        Operator::IsNull | Operator::IsNotNull => format!("{path} {op}"),
        _ => format!("{path} {op} {expected}"),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawRule {
    Mapping {
        path: String,
        op: Operator,
        #[serde(default)]
        value: Value,
        #[serde(default)]
        description: Option<String>,
    },
    Sequence(Vec<Value>),
}

impl TryFrom<RawRule> for ValidationRule {
    type Error = String;

    fn try_from(raw: RawRule) -> Result<Self, Self::Error> {
        let (path, op, value, description) = match raw {
            RawRule::Mapping {
                path,
                op,
                value,
                description,
            } => (path, op, value, description),
            RawRule::Sequence(items) => {
                if !(2..=4).contains(&items.len()) {
                    return Err(format!(
                        "rule sequence needs 2 to 4 entries [path, op, value, description], got {}",
                        items.len()
                    ));
                }
                let mut items = items.into_iter();
                let path = match items.next() {
                    Some(Value::String(path)) => path,
                    _ => return Err("rule path must be a string".to_string()),
                };
                let op = match items.next() {
                    Some(Value::String(op)) => op.parse::<Operator>()?,
                    _ => return Err("rule operator must be a string".to_string()),
                };
                let value = items.next().unwrap_or(Value::Null);
                let description = match items.next() {
                    Some(Value::String(text)) => Some(text),
                    Some(other) => Some(other.to_string()),
                    None => None,
                };
                (path, op, value, description)
            }
        };

        let rule = ValidationRule::new(path, op, value);
        Ok(match description {
            Some(text) if !text.is_empty() => rule.with_description(text),
            _ => rule,
        })
    }
}
