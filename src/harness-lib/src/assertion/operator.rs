use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    RegexMatch,
    In,
    NotIn,
    IsNull,
    IsNotNull,
    LengthEq,
    LengthGt,
    LengthLt,
}

const ALL: [Operator; 18] = [
    Operator::Eq,
    Operator::Ne,
    Operator::Gt,
    Operator::Ge,
    Operator::Lt,
    Operator::Le,
    Operator::Contains,
    Operator::NotContains,
    Operator::StartsWith,
    Operator::EndsWith,
    Operator::RegexMatch,
    Operator::In,
    Operator::NotIn,
    Operator::IsNull,
    Operator::IsNotNull,
    Operator::LengthEq,
    Operator::LengthGt,
    Operator::LengthLt,
];

impl Operator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operator::Eq => "eq",
            Operator::Ne => "ne",
            Operator::Gt => "gt",
            Operator::Ge => "ge",
            Operator::Lt => "lt",
            Operator::Le => "le",
            Operator::Contains => "contains",
            Operator::NotContains => "not_contains",
            Operator::StartsWith => "starts_with",
            Operator::EndsWith => "ends_with",
            Operator::RegexMatch => "regex_match",
            Operator::In => "in",
            Operator::NotIn => "not_in",
            Operator::IsNull => "is_null",
            Operator::IsNotNull => "is_not_null",
            Operator::LengthEq => "length_eq",
            Operator::LengthGt => "length_gt",
            Operator::LengthLt => "length_lt",
        }
    }

    /// Applies the operator. `actual` is `None` when the path matched nothing;
    /// only `is_null` passes then. `Err` carries why the comparison could not be made.
    pub fn apply(&self, actual: Option<&Value>, expected: &Value) -> Result<bool, String> {
        let Some(actual) = actual else {
            return Ok(matches!(self, Operator::IsNull));
        };

        match self {
            Operator::Eq => Ok(values_equal(actual, expected)),
            Operator::Ne => Ok(!values_equal(actual, expected)),
            Operator::Gt => compare(actual, expected).map(|o| o == Ordering::Greater),
            Operator::Ge => compare(actual, expected).map(|o| o != Ordering::Less),
            Operator::Lt => compare(actual, expected).map(|o| o == Ordering::Less),
            Operator::Le => compare(actual, expected).map(|o| o != Ordering::Greater),
            Operator::Contains => Ok(contains(actual, expected)),
            Operator::NotContains => Ok(!contains(actual, expected)),
            Operator::StartsWith => Ok(text(actual).starts_with(&text(expected))),
            Operator::EndsWith => Ok(text(actual).ends_with(&text(expected))),
            Operator::RegexMatch => regex_match(actual, expected),
            Operator::In => member_of(actual, expected),
            Operator::NotIn => member_of(actual, expected).map(|found| !found),
            Operator::IsNull => Ok(actual.is_null()),
            Operator::IsNotNull => Ok(!actual.is_null()),
            Operator::LengthEq => length_cmp(actual, expected).map(|o| o == Ordering::Equal),
            Operator::LengthGt => length_cmp(actual, expected).map(|o| o == Ordering::Greater),
            Operator::LengthLt => length_cmp(actual, expected).map(|o| o == Ordering::Less),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Operator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        ALL.iter()
            .copied()
            .find(|op| op.as_str() == name)
            .ok_or_else(|| format!("unknown operator '{s}'"))
    }
}

/// Numbers compare by value, so `200` equals `200.0`.
fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => number_cmp(x, y) == Some(Ordering::Equal),
        (Value::Array(xs), Value::Array(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| values_equal(x, y))
        }
        _ => a == b,
    }
}

fn compare(actual: &Value, expected: &Value) -> Result<Ordering, String> {
    match (actual, expected) {
        (Value::Number(a), Value::Number(b)) => {
            number_cmp(a, b).ok_or_else(|| "numbers are not comparable".to_string())
        }
        (Value::String(a), Value::String(b)) => Ok(a.cmp(b)),
        _ => Err(format!(
            "cannot order {} against {}",
            type_name(actual),
            type_name(expected)
        )),
    }
}

/// Integers compare exactly; anything involving a float goes through `f64`.
fn number_cmp(a: &Number, b: &Number) -> Option<Ordering> {
    match (integer(a), integer(b)) {
        (Some(a), Some(b)) => Some(a.cmp(&b)),
        _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
    }
}

fn integer(n: &Number) -> Option<i128> {
    n.as_i64()
        .map(i128::from)
        .or_else(|| n.as_u64().map(i128::from))
}

fn contains(actual: &Value, expected: &Value) -> bool {
    match actual {
        Value::Array(items) => items.iter().any(|item| values_equal(item, expected)),
        Value::Object(map) => map.contains_key(&text(expected)),
        other => text(other).contains(&text(expected)),
    }
}

fn member_of(actual: &Value, expected: &Value) -> Result<bool, String> {
    match expected {
        Value::Array(items) => Ok(items.iter().any(|item| values_equal(actual, item))),
        Value::String(haystack) => Ok(haystack.contains(&text(actual))),
        other => Err(format!("expected a list, got {}", type_name(other))),
    }
}

/// Anchored at the start of the value, not at the end.
fn regex_match(actual: &Value, expected: &Value) -> Result<bool, String> {
    let pattern = text(expected);
    let regex =
        Regex::new(&format!("^(?:{pattern})")).map_err(|e| format!("invalid regex '{pattern}': {e}"))?;
    Ok(regex.is_match(&text(actual)))
}

fn length_cmp(actual: &Value, expected: &Value) -> Result<Ordering, String> {
    let length = match actual {
        Value::String(s) => s.chars().count(),
        Value::Array(items) => items.len(),
        Value::Object(map) => map.len(),
        other => return Err(format!("{} has no length", type_name(other))),
    };
    let wanted = expected
        .as_u64()
        .ok_or_else(|| format!("expected length must be a non-negative integer, got {expected}"))?;
    Ok((length as u64).cmp(&wanted))
}

fn text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn check(op: Operator, actual: Value, expected: Value) -> bool {
        op.apply(Some(&actual), &expected).unwrap()
    }

    #[test]
    fn test_parse_names() {
        for op in ALL {
            assert_eq!(op.as_str().parse::<Operator>().unwrap(), op);
        }
        assert_eq!("EQ".parse::<Operator>().unwrap(), Operator::Eq);
        assert!("approx".parse::<Operator>().is_err());
    }

    #[test]
    fn test_serde_names_match_as_str() {
        let op: Operator = serde_json::from_value(json!("not_contains")).unwrap();
        assert_eq!(op, Operator::NotContains);
        assert_eq!(serde_json::to_value(Operator::LengthGt).unwrap(), json!("length_gt"));
    }

    #[test]
    fn test_equality_is_numeric() {
        assert!(check(Operator::Eq, json!(200), json!(200.0)));
        assert!(check(Operator::Eq, json!("a"), json!("a")));
        assert!(!check(Operator::Eq, json!("1"), json!(1)));
        assert!(check(Operator::Ne, json!(1), json!(2)));
        assert!(check(Operator::Eq, json!([1, 2]), json!([1.0, 2])));
    }

    #[test]
    fn test_large_integers_compare_exactly() {
        let id = json!(1234567890123456789_i64);
        let next = json!(1234567890123456788_i64);
        assert!(!check(Operator::Eq, id.clone(), next.clone()));
        assert!(check(Operator::Ne, id.clone(), next.clone()));
        assert!(check(Operator::Gt, id.clone(), next));
        assert!(check(Operator::Eq, json!(u64::MAX), json!(u64::MAX)));
        assert!(check(Operator::Lt, json!(-1), json!(u64::MAX)));
        assert!(check(Operator::In, id.clone(), json!([1, 1234567890123456789_i64])));
        assert!(!check(Operator::In, id, json!([1234567890123456788_i64])));
    }

    #[test]
    fn test_ordering() {
        assert!(check(Operator::Gt, json!(3), json!(2)));
        assert!(check(Operator::Ge, json!(2), json!(2)));
        assert!(check(Operator::Lt, json!(1.5), json!(2)));
        assert!(check(Operator::Le, json!("a"), json!("b")));
        assert!(Operator::Gt.apply(Some(&json!("3")), &json!(2)).is_err());
    }

    #[test]
    fn test_contains() {
        assert!(check(Operator::Contains, json!("hello world"), json!("world")));
        assert!(check(Operator::Contains, json!([1, 2, 3]), json!(2)));
        assert!(check(Operator::Contains, json!({"id": 1}), json!("id")));
        assert!(check(Operator::NotContains, json!("hello"), json!("bye")));
        assert!(check(Operator::Contains, json!(12345), json!("234")));
    }

    #[test]
    fn test_prefix_suffix_and_regex() {
        assert!(check(Operator::StartsWith, json!("SCH-001"), json!("SCH")));
        assert!(check(Operator::EndsWith, json!("report.pdf"), json!(".pdf")));
        assert!(check(Operator::RegexMatch, json!("abc123"), json!("[a-z]+\\d")));
        assert!(!check(Operator::RegexMatch, json!("x-abc"), json!("abc")));
        assert!(Operator::RegexMatch
            .apply(Some(&json!("x")), &json!("("))
            .is_err());
    }

    #[test]
    fn test_membership() {
        assert!(check(Operator::In, json!(2), json!([1, 2, 3])));
        assert!(check(Operator::NotIn, json!(5), json!([1, 2, 3])));
        assert!(check(Operator::In, json!("b"), json!("abc")));
        assert!(Operator::In.apply(Some(&json!(1)), &json!(1)).is_err());
    }

    #[test]
    fn test_nulls_and_lengths() {
        assert!(check(Operator::IsNull, json!(null), json!(null)));
        assert!(check(Operator::IsNotNull, json!(0), json!(null)));
        assert!(check(Operator::LengthEq, json!([1, 2]), json!(2)));
        assert!(check(Operator::LengthGt, json!("héllo"), json!(4)));
        assert!(check(Operator::LengthLt, json!({}), json!(1)));
        assert!(Operator::LengthEq.apply(Some(&json!(5)), &json!(1)).is_err());
    }

    #[test]
    fn test_absent_value_only_satisfies_is_null() {
        for op in ALL {
            let passed = op.apply(None, &json!(null)).unwrap();
            assert_eq!(passed, op == Operator::IsNull, "operator {op}");
        }
    }
}
