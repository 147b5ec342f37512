//! Orchestration between handlers and the store.
//!
//! Services are free functions over explicit collaborators (`&dyn Store`,
//! [`ocean_core::auth::jwt::TokenService`], `&dyn Mailer`) so they can be
//! driven without an HTTP layer.

pub mod admin;
pub mod auth;
pub mod collections;
pub mod events;
pub mod resources;

use std::collections::HashMap;

use ocean_core::models::UserSummary;
use ocean_core::query::{Pagination, normalize_pagination};
use ocean_core::store::Store;

use crate::error::AppResult;

/// Normalized `page` / `limit` from raw query parameters.
pub(crate) fn pagination(params: &HashMap<String, String>) -> Pagination {
    normalize_pagination(
        params.get("page").map(String::as_str),
        params.get("limit").map(String::as_str),
    )
}

/// Summaries for a set of user ids. Ids that no longer resolve are skipped.
pub(crate) async fn summaries(
    store: &dyn Store,
    ids: &[&str],
) -> AppResult<HashMap<String, UserSummary>> {
    let mut found = HashMap::new();
    for &id in ids {
        if found.contains_key(id) {
            continue;
        }
        if let Some(identity) = store.find_user_by_id(id).await? {
            found.insert(id.to_string(), identity.summary());
        }
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pagination_reads_page_and_limit() {
        let params = HashMap::from([
            ("page".to_string(), "3".to_string()),
            ("limit".to_string(), "500".to_string()),
        ]);
        let p = pagination(&params);
        assert_eq!((p.page, p.limit, p.skip), (3, 100, 200));
        let p = pagination(&HashMap::new());
        assert_eq!((p.page, p.limit, p.skip), (1, 10, 0));
    }
}
