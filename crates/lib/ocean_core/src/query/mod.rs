//! Pagination, filtering and sorting for list endpoints.
//!
//! Everything here is pure: untrusted query parameters go in, bounded
//! values and store-agnostic predicates come out. The storage adapters
//! interpret [`Filter`] and [`SortOrder`] against their own representation.

pub mod filter;
pub mod pagination;
pub mod sort;

pub use filter::{FieldKind, FieldValue, Filter, FilterField, Predicate, build_filter};
pub use pagination::{Paginated, Pagination, PaginationMeta, build_response, normalize_pagination};
pub use sort::{Direction, SortOption, SortOrder, resolve_sort};

/// A document that list queries can filter and sort.
///
/// Field names are the camelCase names exposed over the API.
pub trait Document {
    /// Stable identifier, used as the final sort tie-breaker.
    fn id(&self) -> &str;

    /// Look up a named field.
    fn field(&self, name: &str) -> FieldValue<'_>;
}

/// Filter, ordering and window for a single list call.
#[derive(Debug, Clone)]
pub struct ListQuery {
    pub filter: Filter,
    pub sort: SortOrder,
    pub pagination: Pagination,
}

impl ListQuery {
    pub fn new(filter: Filter, sort: SortOrder, pagination: Pagination) -> Self {
        Self {
            filter,
            sort,
            pagination,
        }
    }
}

/// One window of a list result plus the unpaginated match count.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: u64,
}

impl<T> Page<T> {
    /// Convert items while keeping the total.
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
        }
    }
}
