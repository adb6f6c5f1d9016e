//! Typed view over the seven recognized query-string options.

use std::borrow::Cow;
use std::fmt;

use serde::Serialize;

use crate::query::bag::QueryBag;
use crate::query::error::QueryError;

/// The recognized option names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryField {
    With,
    Scopes,
    Count,
    OrderBy,
    GroupBy,
    Paginate,
    Exclude,
}

impl QueryField {
    pub const ALL: [QueryField; 7] = [
        QueryField::With,
        QueryField::Scopes,
        QueryField::Count,
        QueryField::OrderBy,
        QueryField::GroupBy,
        QueryField::Paginate,
        QueryField::Exclude,
    ];

    /// Key as it appears in the query string.
    pub fn key(&self) -> &'static str {
        match self {
            QueryField::With => "with",
            QueryField::Scopes => "scopes",
            QueryField::Count => "count",
            QueryField::OrderBy => "orderBy",
            QueryField::GroupBy => "groupBy",
            QueryField::Paginate => "paginate",
            QueryField::Exclude => "exclude",
        }
    }
}

impl fmt::Display for QueryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl std::str::FromStr for QueryField {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        QueryField::ALL
            .into_iter()
            .find(|field| field.key() == s)
            .ok_or_else(|| QueryError::UnknownOption(s.to_string()))
    }
}

/// A single option value.
///
/// `Text` is the raw string, possibly empty. `List` is what a structured
/// source such as `with[]=a&with[]=b` already delivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum OptionValue {
    Text(String),
    List(Vec<String>),
}

impl OptionValue {
    /// Comma-split the text, trimming each token. A list comes back unchanged.
    pub fn as_list(&self) -> Vec<String> {
        match self {
            OptionValue::Text(text) => text.split(',').map(|t| t.trim().to_string()).collect(),
            OptionValue::List(items) => items.clone(),
        }
    }

    /// The value as one string; lists are joined with commas.
    pub fn as_text(&self) -> Cow<'_, str> {
        match self {
            OptionValue::Text(text) => Cow::Borrowed(text),
            OptionValue::List(items) => Cow::Owned(items.join(",")),
        }
    }

    /// Check if the value carries nothing: empty text or an empty list.
    pub fn is_blank(&self) -> bool {
        match self {
            OptionValue::Text(text) => text.is_empty(),
            OptionValue::List(items) => items.is_empty(),
        }
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

impl From<Vec<String>> for OptionValue {
    fn from(items: Vec<String>) -> Self {
        OptionValue::List(items)
    }
}

/// Query-shaping options of one request.
///
/// Absent options are `None`; an explicitly empty option is
/// `Some(OptionValue::Text(""))`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    with: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    scopes: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    count: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_by: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    group_by: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    paginate: Option<OptionValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    exclude: Option<OptionValue>,
}

impl QueryOptions {
    /// Pick the recognized keys out of a bag. Other keys are ignored.
    pub fn from_bag(bag: &QueryBag) -> Self {
        QueryField::ALL
            .into_iter()
            .fold(Self::default(), |options, field| match bag.get(field.key()) {
                Some(value) => options.set(field, value.clone()),
                None => options,
            })
    }

    /// Parse a raw query string.
    pub fn parse(query_string: &str) -> Self {
        Self::from_bag(&QueryBag::parse(query_string))
    }

    /// Return a copy with `field` set.
    pub fn set(mut self, field: QueryField, value: impl Into<OptionValue>) -> Self {
        *self.slot_mut(field) = Some(value.into());
        self
    }

    pub fn get(&self, field: QueryField) -> Option<&OptionValue> {
        match field {
            QueryField::With => self.with.as_ref(),
            QueryField::Scopes => self.scopes.as_ref(),
            QueryField::Count => self.count.as_ref(),
            QueryField::OrderBy => self.order_by.as_ref(),
            QueryField::GroupBy => self.group_by.as_ref(),
            QueryField::Paginate => self.paginate.as_ref(),
            QueryField::Exclude => self.exclude.as_ref(),
        }
    }

    /// Check if `field` was supplied, even as an empty string.
    pub fn has(&self, field: QueryField) -> bool {
        self.get(field).is_some()
    }

    /// Token list for `field`; empty when the field is absent.
    ///
    /// Text values are comma-split with surrounding whitespace trimmed from
    /// each token, so `"a, b"` yields `["a", "b"]`. Empty tokens are kept.
    pub fn as_list(&self, field: QueryField) -> Vec<String> {
        self.get(field).map(OptionValue::as_list).unwrap_or_default()
    }

    /// Text of `field`, lists joined with commas.
    pub fn text(&self, field: QueryField) -> Option<Cow<'_, str>> {
        self.get(field).map(OptionValue::as_text)
    }

    /// Check if no option was supplied.
    pub fn is_empty(&self) -> bool {
        QueryField::ALL.iter().all(|field| !self.has(*field))
    }

    fn slot_mut(&mut self, field: QueryField) -> &mut Option<OptionValue> {
        match field {
            QueryField::With => &mut self.with,
            QueryField::Scopes => &mut self.scopes,
            QueryField::Count => &mut self.count,
            QueryField::OrderBy => &mut self.order_by,
            QueryField::GroupBy => &mut self.group_by,
            QueryField::Paginate => &mut self.paginate,
            QueryField::Exclude => &mut self.exclude,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_as_list_splits_in_order() {
        let options = QueryOptions::default().set(QueryField::With, "a,b,c");
        assert_eq!(options.as_list(QueryField::With), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_as_list_keeps_structured_list() {
        let list = vec!["posts.author".to_string(), "tags,x".to_string()];
        let options = QueryOptions::default().set(QueryField::With, list.clone());
        assert_eq!(options.as_list(QueryField::With), list);
    }

    #[test]
    fn test_as_list_trims_tokens() {
        let options = QueryOptions::default().set(QueryField::Count, " posts , tags,");
        assert_eq!(options.as_list(QueryField::Count), vec!["posts", "tags", ""]);
    }

    #[test]
    fn test_blank_values() {
        assert!(OptionValue::from("").is_blank());
        assert!(OptionValue::List(Vec::new()).is_blank());
        assert!(!OptionValue::from(" ").is_blank());
        assert!(!OptionValue::from("id|asc").is_blank());
    }

    #[test]
    fn test_has_distinguishes_absent_from_empty() {
        let options = QueryOptions::parse("groupBy=&with=posts");
        assert!(options.has(QueryField::GroupBy));
        assert_eq!(options.text(QueryField::GroupBy).as_deref(), Some(""));
        assert!(!options.has(QueryField::Count));
        assert!(options.as_list(QueryField::Count).is_empty());
    }

    #[test]
    fn test_from_bag_ignores_unknown_keys() {
        let options = QueryOptions::parse("foo=bar&sort=id|asc&count=comments");
        assert_eq!(
            options,
            QueryOptions::default().set(QueryField::Count, "comments")
        );
        assert!(QueryOptions::parse("foo=bar").is_empty());
    }

    #[test]
    fn test_field_keys_round_trip() {
        for field in QueryField::ALL {
            assert_eq!(field.key().parse::<QueryField>().unwrap(), field);
        }
        assert_eq!(
            "order_by".parse::<QueryField>(),
            Err(QueryError::UnknownOption("order_by".into()))
        );
    }

    #[test]
    fn test_serializes_present_fields_only() {
        let options = QueryOptions::parse("orderBy=name|asc&with[]=a&with[]=b");
        let json = serde_json::to_value(&options).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"with": ["a", "b"], "orderBy": "name|asc"})
        );
    }
}
