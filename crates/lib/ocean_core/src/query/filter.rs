//! Domain filter construction from optional query parameters.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use super::Document;

/// A document field as seen by filters and sorts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue<'a> {
    Text(&'a str),
    List(&'a [String]),
    Flag(bool),
    Number(i64),
    Time(DateTime<Utc>),
    Missing,
}

/// How a query parameter is turned into a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Exact match. On list fields, membership.
    Equals,
    /// `"true"` matches `true`; any other value matches `false`.
    Flag,
    /// Case-insensitive free-text search across the given fields.
    Search(&'static [&'static str]),
}

/// An allow-listed query parameter and the document field it targets.
#[derive(Debug, Clone, Copy)]
pub struct FilterField {
    pub param: &'static str,
    pub field: &'static str,
    pub kind: FieldKind,
}

impl FilterField {
    pub const fn equals(param: &'static str, field: &'static str) -> Self {
        Self {
            param,
            field,
            kind: FieldKind::Equals,
        }
    }

    pub const fn flag(param: &'static str, field: &'static str) -> Self {
        Self {
            param,
            field,
            kind: FieldKind::Flag,
        }
    }

    pub const fn search(param: &'static str, fields: &'static [&'static str]) -> Self {
        Self {
            param,
            field: param,
            kind: FieldKind::Search(fields),
        }
    }
}

/// A single store-agnostic condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Equals {
        field: &'static str,
        value: String,
    },
    Flag {
        field: &'static str,
        value: bool,
    },
    /// Matches when any term occurs in any of the fields.
    Search {
        fields: &'static [&'static str],
        terms: Vec<String>,
    },
}

impl Predicate {
    fn matches<D: Document + ?Sized>(&self, doc: &D) -> bool {
        match self {
            Predicate::Equals { field, value } => match doc.field(field) {
                FieldValue::Text(s) => s == value,
                FieldValue::List(items) => items.iter().any(|i| i == value),
                FieldValue::Number(n) => n.to_string() == *value,
                FieldValue::Flag(b) => b.to_string() == *value,
                FieldValue::Time(_) | FieldValue::Missing => false,
            },
            Predicate::Flag { field, value } => {
                matches!(doc.field(field), FieldValue::Flag(b) if b == *value)
            }
            Predicate::Search { fields, terms } => fields.iter().any(|f| match doc.field(f) {
                FieldValue::Text(s) => contains_any(s, terms),
                FieldValue::List(items) => items.iter().any(|i| contains_any(i, terms)),
                _ => false,
            }),
        }
    }
}

fn contains_any(haystack: &str, terms: &[String]) -> bool {
    let haystack = haystack.to_lowercase();
    terms.iter().any(|t| haystack.contains(t.as_str()))
}

/// Conjunction of predicates. An empty filter matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    predicates: Vec<Predicate>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a predicate (builder style).
    pub fn with(mut self, predicate: Predicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    /// Shorthand for an equality predicate.
    pub fn eq(self, field: &'static str, value: impl Into<String>) -> Self {
        self.with(Predicate::Equals {
            field,
            value: value.into(),
        })
    }

    /// Shorthand for a boolean predicate.
    pub fn flag(self, field: &'static str, value: bool) -> Self {
        self.with(Predicate::Flag { field, value })
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Evaluate against an in-memory document.
    pub fn matches<D: Document + ?Sized>(&self, doc: &D) -> bool {
        self.predicates.iter().all(|p| p.matches(doc))
    }
}

/// Build a filter from raw query parameters.
///
/// Only allow-listed parameters are considered. Absent or blank values add
/// nothing; parameters not in `allowed` are ignored.
pub fn build_filter(params: &HashMap<String, String>, allowed: &[FilterField]) -> Filter {
    let mut filter = Filter::new();
    for spec in allowed {
        let Some(raw) = params.get(spec.param) else {
            continue;
        };
        let value = raw.trim();
        if value.is_empty() {
            continue;
        }
        let predicate = match spec.kind {
            FieldKind::Equals => Predicate::Equals {
                field: spec.field,
                value: value.to_string(),
            },
            FieldKind::Flag => Predicate::Flag {
                field: spec.field,
                value: value == "true",
            },
            FieldKind::Search(fields) => {
                let terms: Vec<String> = value.split_whitespace().map(str::to_lowercase).collect();
                Predicate::Search { fields, terms }
            }
        };
        filter = filter.with(predicate);
    }
    filter
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Doc {
        id: String,
        title: String,
        tags: Vec<String>,
        published: bool,
    }

    impl Document for Doc {
        fn id(&self) -> &str {
            &self.id
        }

        fn field(&self, name: &str) -> FieldValue<'_> {
            match name {
                "title" => FieldValue::Text(&self.title),
                "tags" => FieldValue::List(&self.tags),
                "isPublished" => FieldValue::Flag(self.published),
                _ => FieldValue::Missing,
            }
        }
    }

    const ALLOWED: &[FilterField] = &[
        FilterField::equals("tag", "tags"),
        FilterField::equals("title", "title"),
        FilterField::flag("isPublished", "isPublished"),
        FilterField::search("query", &["title", "tags"]),
    ];

    fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn doc() -> Doc {
        Doc {
            id: "1".into(),
            title: "Ocean Currents".into(),
            tags: vec!["physics".into(), "waves".into()],
            published: true,
        }
    }

    #[test]
    fn absent_and_blank_params_add_nothing() {
        let f = build_filter(&params(&[("title", "  ")]), ALLOWED);
        assert!(f.is_empty());
    }

    #[test]
    fn unknown_params_are_ignored() {
        let f = build_filter(&params(&[("$where", "1"), ("password", "x")]), ALLOWED);
        assert!(f.is_empty());
    }

    #[test]
    fn equality_on_list_field_is_membership() {
        let f = build_filter(&params(&[("tag", "waves")]), ALLOWED);
        assert!(f.matches(&doc()));
        let f = build_filter(&params(&[("tag", "tides")]), ALLOWED);
        assert!(!f.matches(&doc()));
    }

    #[test]
    fn flag_params_parse_true_only() {
        let f = build_filter(&params(&[("isPublished", "true")]), ALLOWED);
        assert!(f.matches(&doc()));
        let f = build_filter(&params(&[("isPublished", "yes")]), ALLOWED);
        assert_eq!(
            f.predicates(),
            &[Predicate::Flag {
                field: "isPublished",
                value: false
            }]
        );
        assert!(!f.matches(&doc()));
    }

    #[test]
    fn search_matches_any_term_case_insensitively() {
        let f = build_filter(&params(&[("query", "CURRENTS lava")]), ALLOWED);
        assert!(f.matches(&doc()));
        let f = build_filter(&params(&[("query", "WAV")]), ALLOWED);
        assert!(f.matches(&doc()));
        let f = build_filter(&params(&[("query", "volcano")]), ALLOWED);
        assert!(!f.matches(&doc()));
    }

    #[test]
    fn predicates_combine_as_conjunction() {
        let f = build_filter(&params(&[("tag", "waves"), ("title", "Reefs")]), ALLOWED);
        assert_eq!(f.predicates().len(), 2);
        assert!(!f.matches(&doc()));
    }
}
