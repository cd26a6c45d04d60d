mod operator;
pub mod path;
mod rule;

pub use operator::Operator;
pub use rule::ValidationRule;

use crate::client::ResponseRecord;
use crate::error::ValidationFailure;
use serde_json::Value;

const STATUS_CODE_PATH: &str = "status_code";
const HEADER_PREFIX: &str = "header.";

#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub rule: ValidationRule,
    pub passed: bool,
    /// `None` when the path matched nothing.
    pub actual: Option<Value>,
    pub message: String,
}

impl RuleOutcome {
    fn new(rule: &ValidationRule, actual: Option<Value>, result: Result<bool, String>) -> Self {
        let shown = actual
            .as_ref()
            .map_or_else(|| "<absent>".to_string(), Value::to_string);
        let (passed, message) = match result {
            Ok(true) => (true, format!("{}: ok (actual {shown})", rule.description)),
            Ok(false) => (
                false,
                format!(
                    "{}: expected {} {}, actual {shown}",
                    rule.description, rule.op, rule.expected
                ),
            ),
            Err(reason) => (false, format!("{}: {reason}", rule.description)),
        };
        Self {
            rule: rule.clone(),
            passed,
            actual,
            message,
        }
    }
}

/// Evaluates every rule against `document`. Never stops at the first failure.
pub fn evaluate(document: &Value, rules: &[ValidationRule]) -> Vec<RuleOutcome> {
    rules
        .iter()
        .map(|rule| match path::extract(document, &rule.path) {
            Ok(actual) => {
                let result = rule.op.apply(actual.as_ref(), &rule.expected);
                RuleOutcome::new(rule, actual, result)
            }
            Err(reason) => RuleOutcome::new(rule, None, Err(reason)),
        })
        .collect()
}

/// Like [`evaluate`], plus the paths `status_code` and `header.<name>`.
/// A body that is not JSON makes every JSONPath rule see an absent value.
pub fn evaluate_response(response: &ResponseRecord, rules: &[ValidationRule]) -> Vec<RuleOutcome> {
    let document = response.json();
    rules
        .iter()
        .map(|rule| {
            let actual = if rule.path == STATUS_CODE_PATH {
                Ok(Some(Value::from(response.status)))
            } else if let Some(name) = rule.path.strip_prefix(HEADER_PREFIX) {
                Ok(response.header(name).map(Value::from))
            } else {
                match &document {
                    Some(document) => path::extract(document, &rule.path),
                    None => Ok(None),
                }
            };

            match actual {
                Ok(actual) => {
                    let result = rule.op.apply(actual.as_ref(), &rule.expected);
                    RuleOutcome::new(rule, actual, result)
                }
                Err(reason) => RuleOutcome::new(rule, None, Err(reason)),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AssertionReport {
    pub outcomes: Vec<RuleOutcome>,
}

impl AssertionReport {
    pub fn new(outcomes: Vec<RuleOutcome>) -> Self {
        Self { outcomes }
    }

    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn passed_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed).count()
    }

    pub fn failures(&self) -> impl Iterator<Item = &RuleOutcome> {
        self.outcomes.iter().filter(|o| !o.passed)
    }

    pub fn into_result(self) -> Result<(), ValidationFailure> {
        let failures: Vec<String> = self.failures().map(|o| o.message.clone()).collect();
        if failures.is_empty() {
            Ok(())
        } else {
            Err(ValidationFailure { failures })
        }
    }
}
