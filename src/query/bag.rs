//! Raw query-parameter bag.

use std::collections::BTreeMap;

use crate::query::options::OptionValue;

/// Flat key → value bag of an inbound request's query parameters.
///
/// Keys written as `key[]` accumulate into [`OptionValue::List`] under `key`.
/// A repeated plain key keeps its last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryBag {
    entries: BTreeMap<String, OptionValue>,
}

impl QueryBag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a percent-encoded query string, with or without a leading `?`.
    pub fn parse(query_string: &str) -> Self {
        let raw = query_string.strip_prefix('?').unwrap_or(query_string);
        url::form_urlencoded::parse(raw.as_bytes())
            .filter(|(key, _)| !key.is_empty())
            .fold(Self::new(), |mut bag, (key, value)| {
                match key.strip_suffix("[]").map(str::to_string) {
                    Some(list_key) => bag.push(&list_key, value.into_owned()),
                    None => bag.insert(key.into_owned(), value.into_owned()),
                }
                bag
            })
    }

    /// Set a plain value, replacing anything already stored under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), OptionValue::Text(value.into()));
    }

    /// Append to the list stored under `key`.
    pub fn push(&mut self, key: &str, value: String) {
        match self.entries.get_mut(key) {
            Some(OptionValue::List(items)) => items.push(value),
            _ => {
                self.entries
                    .insert(key.to_string(), OptionValue::List(vec![value]));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.entries.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &OptionValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl<K, V> FromIterator<(K, V)> for QueryBag
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut bag = Self::new();
        for (key, value) in iter {
            bag.insert(key, value);
        }
        bag
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decodes_values() {
        let bag = QueryBag::parse("?with=posts%2Ccomments&sort=age%7Cdesc&q=a+b");
        assert_eq!(bag.get("with"), Some(&OptionValue::from("posts,comments")));
        assert_eq!(bag.get("sort"), Some(&OptionValue::from("age|desc")));
        assert_eq!(bag.get("q"), Some(&OptionValue::from("a b")));
    }

    #[test]
    fn test_parse_bracket_keys_into_lists() {
        let bag = QueryBag::parse("with[]=posts&with[]=tags&with%5B%5D=author");
        assert_eq!(
            bag.get("with"),
            Some(&OptionValue::List(vec![
                "posts".into(),
                "tags".into(),
                "author".into()
            ]))
        );
    }

    #[test]
    fn test_parse_last_plain_value_wins() {
        let bag = QueryBag::parse("groupBy=a&groupBy=b&=orphan");
        assert_eq!(bag.get("groupBy"), Some(&OptionValue::from("b")));
        assert_eq!(bag.len(), 1);
    }

    #[test]
    fn test_key_without_value_is_empty_text() {
        let bag = QueryBag::parse("exclude");
        assert_eq!(bag.get("exclude"), Some(&OptionValue::from("")));
    }

    #[test]
    fn test_from_iterator() {
        let bag: QueryBag = [("with", "a"), ("count", "b")].into_iter().collect();
        assert!(bag.contains("with"));
        assert_eq!(bag.iter().count(), 2);
    }
}
