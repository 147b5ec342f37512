//! Event payloads and views.

use ocean_core::models::UserSummary;
use ocean_core::models::event::{Event, EventPatch};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::parse_date;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventRequest {
    #[serde(default)]
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[serde(default)]
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: String,
    #[serde(default)]
    #[validate(custom(function = "crate::validation::iso_date"))]
    pub start_date: String,
    #[validate(custom(function = "crate::validation::iso_date"))]
    pub end_date: Option<String>,
    #[serde(default)]
    #[validate(length(min = 2, max = 200, message = "Location must be between 2 and 200 characters"))]
    pub location: String,
    #[validate(url(message = "External link must be a valid URL"))]
    pub external_link: Option<String>,
    #[validate(url(message = "Live stream link must be a valid URL"))]
    pub live_stream_link: Option<String>,
    #[validate(url(message = "Event image must be a valid URL"))]
    pub event_image: Option<String>,
    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: Option<u32>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEventRequest {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(
        min = 10,
        max = 2000,
        message = "Description must be between 10 and 2000 characters"
    ))]
    pub description: Option<String>,
    #[validate(custom(function = "crate::validation::iso_date"))]
    pub start_date: Option<String>,
    #[validate(custom(function = "crate::validation::iso_date"))]
    pub end_date: Option<String>,
    #[validate(length(min = 2, max = 200, message = "Location must be between 2 and 200 characters"))]
    pub location: Option<String>,
    #[validate(url(message = "External link must be a valid URL"))]
    pub external_link: Option<String>,
    #[validate(url(message = "Live stream link must be a valid URL"))]
    pub live_stream_link: Option<String>,
    #[validate(url(message = "Event image must be a valid URL"))]
    pub event_image: Option<String>,
    #[validate(range(min = 1, message = "Max participants must be at least 1"))]
    pub max_participants: Option<u32>,
}

impl From<UpdateEventRequest> for EventPatch {
    fn from(req: UpdateEventRequest) -> Self {
        EventPatch {
            title: req.title,
            description: req.description,
            start_date: req.start_date.as_deref().and_then(parse_date),
            end_date: req.end_date.as_deref().and_then(parse_date),
            location: req.location,
            external_link: req.external_link,
            live_stream_link: req.live_stream_link,
            event_image: req.event_image,
            max_participants: req.max_participants,
        }
    }
}

/// An event with its creator and registered users.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventView {
    #[serde(flatten)]
    pub event: Event,
    pub creator: Option<UserSummary>,
    pub participants: Vec<UserSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::field_errors;

    #[test]
    fn create_validates_dates_and_capacity() {
        let req: CreateEventRequest = serde_json::from_value(serde_json::json!({
            "title": "Reef walk",
            "description": "Guided low-tide reef walk",
            "startDate": "someday",
            "location": "Cairns",
            "maxParticipants": 0
        }))
        .unwrap();
        let errors = field_errors(&req.validate().unwrap_err());
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, ["maxParticipants", "startDate"]);
    }

    #[test]
    fn update_patch_parses_dates() {
        let req: UpdateEventRequest =
            serde_json::from_value(serde_json::json!({"startDate": "2026-05-01"})).unwrap();
        let patch = EventPatch::from(req);
        assert!(patch.start_date.is_some());
        assert!(patch.end_date.is_none());
    }
}
