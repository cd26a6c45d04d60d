use clap::ValueEnum;
use serde::Serialize;
use serde_json::Value;
use std::fmt::Write;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Text => write!(f, "text"),
            OutputFormat::Json => write!(f, "json"),
        }
    }
}

/// Renders a JSON value as indented `key: value` text. Nulls render as `~`.
fn render_value(out: &mut String, value: &Value, indent: usize) {
    let pad = " ".repeat(indent);
    match value {
        Value::Array(items) => {
            for item in items {
                if is_nested(item) {
                    let _ = writeln!(out, "{pad}-");
                    render_value(out, item, indent + 2);
                } else {
                    let _ = writeln!(out, "{pad}- {}", scalar(item));
                }
            }
        }
        Value::Object(map) => {
            for (key, item) in map {
                if is_nested(item) {
                    let _ = writeln!(out, "{pad}{key}:");
                    render_value(out, item, indent + 2);
                } else {
                    let _ = writeln!(out, "{pad}{key}: {}", scalar(item));
                }
            }
        }
        other => {
            for line in scalar(other).lines() {
                let _ = writeln!(out, "{pad}{line}");
            }
        }
    }
}

fn is_nested(value: &Value) -> bool {
    match value {
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
        _ => false,
    }
}

fn scalar(value: &Value) -> String {
    match value {
        Value::Null => "~".to_string(),
        Value::String(s) => s.clone(),
        Value::Array(_) => "[]".to_string(),
        Value::Object(_) => "{}".to_string(),
        other => other.to_string(),
    }
}

pub struct Formatter {
    engine: OutputFormat,
}

impl Formatter {
    pub fn new(engine: OutputFormat) -> Self {
        Self { engine }
    }

    pub fn format<T: Serialize + ?Sized>(&self, model: &T) -> String {
        let value = serde_json::to_value(model).unwrap_or(Value::Null);
        match self.engine {
            OutputFormat::Text => {
                let mut out = String::new();
                render_value(&mut out, &value, 0);
                out
            }
            OutputFormat::Json => {
                let mut out = serde_json::to_string_pretty(&value).unwrap_or_default();
                out.push('\n');
                out
            }
        }
    }
}

pub fn get_formatter(output_format: &OutputFormat) -> Formatter {
    Formatter::new(*output_format)
}
