//! Identifier generation.
//!
//! Every stored document gets a UUIDv7 so that ids sort by creation time,
//! which keeps the in-memory store's tie-breaking stable.

use uuid::Uuid;

/// Generate a new UUIDv7 (timestamp-sortable).
pub fn uuidv7() -> Uuid {
    Uuid::now_v7()
}

/// Generate a new document id in its string form.
pub fn new_id() -> String {
    uuidv7().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uuidv7_is_valid() {
        let id = uuidv7();
        assert_eq!(id.get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn new_ids_are_unique_and_parseable() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
        assert!(Uuid::parse_str(&a).is_ok());
    }
}
