//! Named sort orders with allow-list fallback.

use std::cmp::Ordering;

use super::{Document, FieldValue};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

/// Order by a single document field; ties break on id ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortOrder {
    pub field: &'static str,
    pub direction: Direction,
}

impl SortOrder {
    pub const fn asc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Asc,
        }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self {
            field,
            direction: Direction::Desc,
        }
    }

    /// Newest first by `createdAt`.
    pub const fn newest() -> Self {
        Self::desc("createdAt")
    }

    /// Compare two in-memory documents under this order.
    pub fn compare<D: Document + ?Sized>(&self, a: &D, b: &D) -> Ordering {
        let primary = compare_values(a.field(self.field), b.field(self.field));
        let primary = match self.direction {
            Direction::Asc => primary,
            Direction::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id().cmp(b.id()))
    }
}

/// A client-facing sort key.
#[derive(Debug, Clone, Copy)]
pub struct SortOption {
    pub key: &'static str,
    pub order: SortOrder,
}

impl SortOption {
    pub const fn new(key: &'static str, order: SortOrder) -> Self {
        Self { key, order }
    }
}

/// Resolve a requested sort key against an allow-list.
///
/// Unknown or missing keys yield `default` instead of an error.
pub fn resolve_sort(requested: Option<&str>, allowed: &[SortOption], default: SortOrder) -> SortOrder {
    requested
        .and_then(|key| allowed.iter().find(|o| o.key == key))
        .map(|o| o.order)
        .unwrap_or(default)
}

fn rank(v: &FieldValue<'_>) -> u8 {
    match v {
        FieldValue::Missing => 0,
        FieldValue::Flag(_) => 1,
        FieldValue::Number(_) => 2,
        FieldValue::Time(_) => 3,
        FieldValue::Text(_) => 4,
        FieldValue::List(_) => 5,
    }
}

fn compare_values(a: FieldValue<'_>, b: FieldValue<'_>) -> Ordering {
    match (a, b) {
        (FieldValue::Text(x), FieldValue::Text(y)) => x.cmp(y),
        (FieldValue::Number(x), FieldValue::Number(y)) => x.cmp(&y),
        (FieldValue::Time(x), FieldValue::Time(y)) => x.cmp(&y),
        (FieldValue::Flag(x), FieldValue::Flag(y)) => x.cmp(&y),
        (FieldValue::List(x), FieldValue::List(y)) => x.len().cmp(&y.len()),
        (x, y) => rank(&x).cmp(&rank(&y)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OPTIONS: &[SortOption] = &[
        SortOption::new("newest", SortOrder::desc("createdAt")),
        SortOption::new("oldest", SortOrder::asc("createdAt")),
        SortOption::new("popular", SortOrder::desc("views")),
    ];

    struct Doc(&'static str, i64);

    impl Document for Doc {
        fn id(&self) -> &str {
            self.0
        }

        fn field(&self, name: &str) -> FieldValue<'_> {
            match name {
                "views" => FieldValue::Number(self.1),
                _ => FieldValue::Missing,
            }
        }
    }

    #[test]
    fn known_key_resolves() {
        let order = resolve_sort(Some("popular"), OPTIONS, SortOrder::newest());
        assert_eq!(order, SortOrder::desc("views"));
    }

    #[test]
    fn unknown_or_missing_key_falls_back() {
        assert_eq!(resolve_sort(Some("random"), OPTIONS, SortOrder::newest()), SortOrder::newest());
        assert_eq!(resolve_sort(None, OPTIONS, SortOrder::newest()), SortOrder::newest());
    }

    #[test]
    fn descending_sort_breaks_ties_by_id() {
        let mut docs = vec![Doc("b", 1), Doc("c", 5), Doc("a", 1)];
        let order = SortOrder::desc("views");
        docs.sort_by(|x, y| order.compare(x, y));
        let ids: Vec<_> = docs.iter().map(|d| d.0).collect();
        assert_eq!(ids, vec!["c", "a", "b"]);
    }
}
