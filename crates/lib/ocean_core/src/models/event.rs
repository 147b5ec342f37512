//! Community events with registration.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::query::{Document, FieldValue, FilterField, SortOption, SortOrder};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
    pub location: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub live_stream_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_image: Option<String>,
    pub created_by: String,
    pub registered_users: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_participants: Option<u32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn is_full(&self) -> bool {
        self.max_participants
            .is_some_and(|max| self.registered_users.len() >= max as usize)
    }
}

#[derive(Debug, Clone, Default)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub external_link: Option<String>,
    pub live_stream_link: Option<String>,
    pub event_image: Option<String>,
    pub max_participants: Option<u32>,
}

impl EventPatch {
    pub fn apply(self, e: &mut Event) {
        if let Some(v) = self.title {
            e.title = v;
        }
        if let Some(v) = self.description {
            e.description = v;
        }
        if let Some(v) = self.start_date {
            e.start_date = v;
        }
        if let Some(v) = self.end_date {
            e.end_date = Some(v);
        }
        if let Some(v) = self.location {
            e.location = v;
        }
        if let Some(v) = self.external_link {
            e.external_link = Some(v);
        }
        if let Some(v) = self.live_stream_link {
            e.live_stream_link = Some(v);
        }
        if let Some(v) = self.event_image {
            e.event_image = Some(v);
        }
        if let Some(v) = self.max_participants {
            e.max_participants = Some(v);
        }
    }
}

/// Result of a conditional registration.
#[derive(Debug, Clone)]
pub enum Registration {
    Registered(Event),
    AlreadyRegistered,
    Full,
    EventMissing,
}

pub const EVENT_FILTERS: &[FilterField] = &[FilterField::equals("location", "location")];

pub const EVENT_SORTS: &[SortOption] = &[
    SortOption::new("newest", SortOrder::desc("createdAt")),
    SortOption::new("oldest", SortOrder::asc("createdAt")),
    SortOption::new("upcoming", SortOrder::asc("startDate")),
];

impl Document for Event {
    fn id(&self) -> &str {
        &self.id
    }

    fn field(&self, name: &str) -> FieldValue<'_> {
        match name {
            "title" => FieldValue::Text(&self.title),
            "location" => FieldValue::Text(&self.location),
            "createdBy" => FieldValue::Text(&self.created_by),
            "registeredUsers" => FieldValue::List(&self.registered_users),
            "startDate" => FieldValue::Time(self.start_date),
            "createdAt" => FieldValue::Time(self.created_at),
            "updatedAt" => FieldValue::Time(self.updated_at),
            _ => FieldValue::Missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(max: Option<u32>, registered: usize) -> Event {
        let now = Utc::now();
        Event {
            id: "e1".into(),
            title: "Reef walk".into(),
            description: "Low tide reef walk".into(),
            start_date: now,
            end_date: None,
            location: "Cairns".into(),
            external_link: None,
            live_stream_link: None,
            event_image: None,
            created_by: "u1".into(),
            registered_users: (0..registered).map(|i| format!("u{i}")).collect(),
            max_participants: max,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn unlimited_event_is_never_full() {
        assert!(!event(None, 500).is_full());
    }

    #[test]
    fn event_is_full_at_capacity() {
        assert!(!event(Some(2), 1).is_full());
        assert!(event(Some(2), 2).is_full());
    }
}
