//! Page/limit normalization and the paginated response shape.
//!
//! Untrusted values never fail: anything unparseable falls back to the
//! defaults and everything else is clamped into range.

use serde::Serialize;

/// Page used when none (or an unusable one) is given.
pub const DEFAULT_PAGE: u64 = 1;

/// Limit used when none (or zero, or garbage) is given.
pub const DEFAULT_LIMIT: u64 = 10;

/// Hard upper bound on page size.
pub const MAX_LIMIT: u64 = 100;

/// Normalized pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    /// 1-based page number, always >= 1.
    pub page: u64,
    /// Page size, always in `1..=MAX_LIMIT`.
    pub limit: u64,
    /// Number of items to skip: `(page - 1) * limit`.
    pub skip: u64,
}

impl Pagination {
    /// A fixed first-page window, for internal "latest N" queries.
    pub fn first(limit: u64) -> Self {
        let limit = limit.clamp(1, MAX_LIMIT);
        Self {
            page: 1,
            limit,
            skip: 0,
        }
    }
}

/// Parse the leading integer of a string the way lenient web frameworks do:
/// optional whitespace, optional sign, then digits. Trailing junk is ignored
/// (`"12abc"` is 12, `"2.9"` is 2). Returns `None` when no digits lead.
fn parse_leading_int(raw: &str) -> Option<i64> {
    let s = raw.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .bytes()
        .position(|b| !b.is_ascii_digit())
        .unwrap_or(digits.len());
    if end == 0 {
        return None;
    }
    let magnitude = digits[..end]
        .bytes()
        .fold(0i64, |acc, b| acc.saturating_mul(10).saturating_add(i64::from(b - b'0')));
    Some(if negative { -magnitude } else { magnitude })
}

/// Normalize raw `page` / `limit` query values.
///
/// - `page = max(1, int(page) or 1)`
/// - `limit = clamp(int(limit) or 10, 1, 100)` where a parsed zero counts as absent
/// - `skip = (page - 1) * limit`
pub fn normalize_pagination(page: Option<&str>, limit: Option<&str>) -> Pagination {
    let page = match page.and_then(parse_leading_int) {
        Some(p) if p >= 1 => p as u64,
        _ => DEFAULT_PAGE,
    };
    let limit = match limit.and_then(parse_leading_int) {
        None | Some(0) => DEFAULT_LIMIT,
        Some(l) if l < 1 => 1,
        Some(l) => (l as u64).min(MAX_LIMIT),
    };
    Pagination {
        page,
        limit,
        skip: (page - 1).saturating_mul(limit),
    }
}

/// Pagination block of a list response.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaginationMeta {
    pub page: u64,
    pub limit: u64,
    pub total: u64,
    pub pages: u64,
}

/// `{data, pagination}` list response body.
#[derive(Debug, Clone, Serialize)]
pub struct Paginated<T> {
    pub data: Vec<T>,
    pub pagination: PaginationMeta,
}

/// Wrap one page of items with its pagination metadata.
pub fn build_response<T>(items: Vec<T>, page: u64, limit: u64, total: u64) -> Paginated<T> {
    let limit = limit.max(1);
    Paginated {
        data: items,
        pagination: PaginationMeta {
            page,
            limit,
            total,
            pages: total.div_ceil(limit),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(page: &str, limit: &str) -> Pagination {
        normalize_pagination(Some(page), Some(limit))
    }

    #[test]
    fn missing_values_use_defaults() {
        let p = normalize_pagination(None, None);
        assert_eq!(p, Pagination { page: 1, limit: 10, skip: 0 });
    }

    #[test]
    fn page_zero_and_oversized_limit_are_clamped() {
        let p = norm("0", "500");
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 100);
        assert_eq!(p.skip, 0);
    }

    #[test]
    fn negative_values_fall_back_or_clamp() {
        let p = norm("-4", "-5");
        assert_eq!(p.page, 1);
        assert_eq!(p.limit, 1);
    }

    #[test]
    fn zero_limit_means_default() {
        assert_eq!(norm("1", "0").limit, 10);
    }

    #[test]
    fn non_numeric_values_fall_back() {
        let p = norm("abc", "lots");
        assert_eq!(p, Pagination { page: 1, limit: 10, skip: 0 });
    }

    #[test]
    fn floats_and_trailing_junk_truncate() {
        let p = norm("3.9", "25px");
        assert_eq!(p.page, 3);
        assert_eq!(p.limit, 25);
        assert_eq!(p.skip, 50);
    }

    #[test]
    fn whitespace_and_plus_sign_are_accepted() {
        let p = norm("  +2", " 7");
        assert_eq!(p.page, 2);
        assert_eq!(p.limit, 7);
        assert_eq!(p.skip, 7);
    }

    #[test]
    fn huge_page_saturates_instead_of_overflowing() {
        let p = norm("99999999999999999999999", "100");
        assert!(p.page >= 1);
        assert_eq!(p.limit, 100);
        assert_eq!(p.skip, (p.page - 1).saturating_mul(100));
    }

    #[test]
    fn bounds_hold_for_a_spread_of_inputs() {
        let inputs = [
            "", "0", "1", "-1", "2.5", "1e3", "NaN", "100", "101", "9999", " 42 ", "x1",
        ];
        for page in inputs {
            for limit in inputs {
                let p = norm(page, limit);
                assert!(p.page >= 1, "page {page:?} -> {}", p.page);
                assert!((1..=MAX_LIMIT).contains(&p.limit), "limit {limit:?} -> {}", p.limit);
                assert_eq!(p.skip, (p.page - 1) * p.limit);
            }
        }
    }

    #[test]
    fn build_response_computes_page_count() {
        let r = build_response(vec![1, 2, 3], 1, 3, 10);
        assert_eq!(r.pagination.pages, 4);
        assert_eq!(r.pagination.total, 10);
        assert_eq!(r.data, vec![1, 2, 3]);

        let empty = build_response(Vec::<u8>::new(), 1, 10, 0);
        assert_eq!(empty.pagination.pages, 0);
    }
}
