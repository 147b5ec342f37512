//! User accounts and roles.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{UnknownVariant, UserSummary};
use crate::query::{Document, FieldValue, FilterField, SortOption, SortOrder};

/// Account role. Serialized exactly as named (`"Admin"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Admin,
    Educator,
    User,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Admin, Role::Educator, Role::User];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "Admin",
            Role::Educator => "Educator",
            Role::User => "User",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|r| r.as_str() == s)
            .ok_or_else(|| UnknownVariant::new("role", s))
    }
}

/// A stored account. The password hash never serializes.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(skip)]
    pub password_hash: String,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Identity {
    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Fields for a new account. Stores assign id and timestamps.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Partial update; `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct IdentityPatch {
    pub name: Option<String>,
    pub password_hash: Option<String>,
    pub role: Option<Role>,
    pub is_active: Option<bool>,
}

/// Lowercase and trim an email for lookup and storage.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Query parameters accepted by the admin user listing.
pub const USER_FILTERS: &[FilterField] = &[
    FilterField::equals("role", "role"),
    FilterField::flag("isActive", "isActive"),
];

pub const USER_SORTS: &[SortOption] = &[
    SortOption::new("newest", SortOrder::desc("createdAt")),
    SortOption::new("oldest", SortOrder::asc("createdAt")),
];

impl Document for Identity {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "name" => FieldValue::Text(&self.name),
            "email" => FieldValue::Text(&self.email),
            "role" => FieldValue::Text(self.role.as_str()),
            "isActive" => FieldValue::Flag(self.is_active),
            "createdAt" => FieldValue::Time(self.created_at),
            "updatedAt" => FieldValue::Time(self.updated_at),
            _ => FieldValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_round_trips_through_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), role);
        }
        assert!("admin".parse::<Role>().is_err());
    }

    #[test]
    fn normalize_email_lowercases_and_trims() {
        assert_eq!(normalize_email("  A@X.Com "), "a@x.com");
    }

    #[test]
    fn serialized_identity_omits_password_hash() {
        let now = Utc::now();
        let identity = Identity {
            id: "u1".into(),
            name: "A".into(),
            email: "a@x.com".into(),
            password_hash: "$2b$10$secret".into(),
            role: Role::User,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        let json = serde_json::to_value(&identity).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert_eq!(json["role"], "User");
        assert_eq!(json["isActive"], true);
    }
}
