//! Named query scopes requested through `scopes=`.
//!
//! The value is either JSON or a flat comma-separated list of names:
//! - `{"active":[],"byMonth":[3]}` — scope name → argument list
//! - `["active","verified"]` — names without arguments
//! - `active,verified` — not JSON, so comma-split
//!
//! Valid JSON that is neither an object nor an array yields no scopes.

use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::query::options::OptionValue;

/// One scope invocation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Scope {
    pub name: String,
    pub args: Vec<Value>,
}

impl Scope {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            name: name.into(),
            args,
        }
    }
}

/// Ordered scope invocations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ScopeSpec(Vec<Scope>);

impl ScopeSpec {
    pub fn new(scopes: Vec<Scope>) -> Self {
        Self(scopes)
    }

    /// Interpret an option value. Structured lists are taken as plain names.
    pub fn from_value(value: &OptionValue) -> Self {
        match value {
            OptionValue::Text(text) => Self::parse(text),
            OptionValue::List(names) => Self(names.iter().map(Scope::new).collect()),
        }
    }

    /// Decode JSON first, fall back to a comma-split only when decoding fails.
    pub fn parse(raw: &str) -> Self {
        match serde_json::from_str::<Value>(raw) {
            Ok(Value::Object(map)) => Self(
                map.into_iter()
                    .map(|(name, args)| Scope::with_args(name, into_args(args)))
                    .collect(),
            ),
            Ok(Value::Array(items)) => Self(items.into_iter().flat_map(array_entry).collect()),
            Ok(other) => {
                debug!(payload = %other, "scopes payload is a JSON scalar; no scopes applied");
                Self::default()
            }
            Err(_) => Self(
                raw.split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .map(Scope::new)
                    .collect(),
            ),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Scope> {
        self.0.iter()
    }

    pub fn names(&self) -> Vec<&str> {
        self.0.iter().map(|s| s.name.as_str()).collect()
    }
}

impl IntoIterator for ScopeSpec {
    type Item = Scope;
    type IntoIter = std::vec::IntoIter<Scope>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

fn into_args(value: Value) -> Vec<Value> {
    match value {
        Value::Array(args) => args,
        Value::Null => Vec::new(),
        single => vec![single],
    }
}

fn array_entry(item: Value) -> Vec<Scope> {
    match item {
        Value::String(name) => vec![Scope::new(name)],
        Value::Object(map) => map
            .into_iter()
            .map(|(name, args)| Scope::with_args(name, into_args(args)))
            .collect(),
        other => {
            debug!(entry = %other, "skipping scopes array entry that is not a name");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_object_with_args() {
        let spec = ScopeSpec::parse(r#"{"active":[],"byMonth":[3]}"#);
        assert_eq!(
            spec,
            ScopeSpec::new(vec![
                Scope::new("active"),
                Scope::with_args("byMonth", vec![json!(3)]),
            ])
        );
    }

    #[test]
    fn test_invalid_json_falls_back_to_names() {
        let spec = ScopeSpec::parse("active,verified");
        assert_eq!(spec.names(), vec!["active", "verified"]);
        assert!(spec.iter().all(|s| s.args.is_empty()));
    }

    #[test]
    fn test_json_scalar_is_empty() {
        assert!(ScopeSpec::parse("42").is_empty());
        assert!(ScopeSpec::parse("true").is_empty());
        assert!(ScopeSpec::parse(r#""active""#).is_empty());
    }

    #[test]
    fn test_json_array_of_names_and_objects() {
        let spec = ScopeSpec::parse(r#"["active", {"olderThan": 30}, 7]"#);
        assert_eq!(spec.names(), vec!["active", "olderThan"]);
        assert_eq!(spec.iter().nth(1).unwrap().args, vec![json!(30)]);
    }

    #[test]
    fn test_null_args_mean_none() {
        let spec = ScopeSpec::parse(r#"{"published": null}"#);
        assert_eq!(spec, ScopeSpec::new(vec![Scope::new("published")]));
    }

    #[test]
    fn test_empty_and_list_values() {
        assert!(ScopeSpec::parse("").is_empty());
        let value = OptionValue::List(vec!["active".into(), "{\"x\":1}".into()]);
        assert_eq!(ScopeSpec::from_value(&value).names(), vec!["active", "{\"x\":1}"]);
    }
}
