//! Event domain models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

/// Closed set of event categories.
///
/// The canonical token (`MUSICAL`, `SPORTS`, ...) is what gets persisted;
/// [`EventCategory::display_name`] is for presentation only.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum EventCategory {
    Musical,
    Sports,
    Food,
    Art,
}

impl EventCategory {
    pub const ALL: [EventCategory; 4] = [Self::Musical, Self::Sports, Self::Food, Self::Art];

    /// Case-insensitive lookup by name; `None` when unrecognized
    pub fn from_name(name: &str) -> Option<Self> {
        name.trim().parse().ok()
    }

    /// Canonical storage token
    pub fn token(self) -> &'static str {
        match self {
            Self::Musical => "MUSICAL",
            Self::Sports => "SPORTS",
            Self::Food => "FOOD",
            Self::Art => "ART",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            Self::Musical => "Musical",
            Self::Sports => "Sports",
            Self::Food => "Food",
            Self::Art => "Art",
        }
    }

    pub fn display_names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.display_name()).collect()
    }
}

/// Category as stored on an event.
///
/// Reads never reject data: a token that does not name a known category is
/// kept verbatim and shown as "Other". Known categories always serialize to
/// their canonical token, so legacy display strings ("Musical") are rewritten
/// on the next save.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum CategoryValue {
    Known(EventCategory),
    Unrecognized(String),
}

impl CategoryValue {
    pub fn known(&self) -> Option<EventCategory> {
        match self {
            Self::Known(category) => Some(*category),
            Self::Unrecognized(_) => None,
        }
    }

    /// Stored token; sort order for category sorting
    pub fn token(&self) -> &str {
        match self {
            Self::Known(category) => category.token(),
            Self::Unrecognized(raw) => raw,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            Self::Known(category) => category.display_name(),
            Self::Unrecognized(_) => "Other",
        }
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Unrecognized(raw) if raw.trim().is_empty())
    }
}

impl Default for CategoryValue {
    fn default() -> Self {
        Self::Unrecognized(String::new())
    }
}

impl From<EventCategory> for CategoryValue {
    fn from(category: EventCategory) -> Self {
        Self::Known(category)
    }
}

impl From<String> for CategoryValue {
    fn from(raw: String) -> Self {
        match EventCategory::from_name(&raw) {
            Some(category) => Self::Known(category),
            None => Self::Unrecognized(raw),
        }
    }
}

impl From<&str> for CategoryValue {
    fn from(raw: &str) -> Self {
        Self::from(raw.to_string())
    }
}

impl From<CategoryValue> for String {
    fn from(value: CategoryValue) -> Self {
        match value {
            CategoryValue::Known(category) => category.token().to_string(),
            CategoryValue::Unrecognized(raw) => raw,
        }
    }
}

impl fmt::Display for CategoryValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

/// Event lifecycle status
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum EventStatus {
    #[default]
    Active,
    Inactive,
    Cancelled,
    Draft,
    Completed,
}

/// Event entity
///
/// `id` is empty until the repository assigns one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct Event {
    pub id: String,
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "MUSICAL")]
    pub category: CategoryValue,
    /// Scheduled start (the calendar day is authoritative, see `time`)
    pub date: DateTime<Utc>,
    /// Free-text `HH:MM`
    pub time: String,
    pub location: String,
    /// Display order
    pub image_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participant_count: Option<u32>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub status: EventStatus,
    pub max_attendees: i32,
    pub current_attendees: i32,
    pub ticket_price: f64,
    pub organizer: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub tags: Vec<String>,
}

impl Default for Event {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            name: String::new(),
            description: String::new(),
            category: CategoryValue::default(),
            date: now,
            time: String::new(),
            location: String::new(),
            image_urls: Vec::new(),
            participant_count: None,
            created_by: String::new(),
            created_at: now,
            updated_at: now,
            status: EventStatus::Active,
            max_attendees: 0,
            current_attendees: 0,
            ticket_price: 0.0,
            organizer: String::new(),
            contact_email: String::new(),
            contact_phone: String::new(),
            tags: Vec::new(),
        }
    }
}

impl Event {
    /// Create an unsaved event with the scheduling fields set
    pub fn new(
        name: impl Into<String>,
        category: impl Into<CategoryValue>,
        date: DateTime<Utc>,
        time: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            date,
            time: time.into(),
            location: location.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_status(mut self, status: EventStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_organizer(mut self, organizer: impl Into<String>) -> Self {
        self.organizer = organizer.into();
        self
    }

    pub fn with_contact(mut self, email: impl Into<String>, phone: impl Into<String>) -> Self {
        self.contact_email = email.into();
        self.contact_phone = phone.into();
        self
    }

    pub fn with_capacity(mut self, max_attendees: i32, ticket_price: f64) -> Self {
        self.max_attendees = max_attendees;
        self.ticket_price = ticket_price;
        self
    }

    pub fn with_image_urls(mut self, image_urls: Vec<String>) -> Self {
        self.image_urls = image_urls;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = created_at;
        self.updated_at = created_at;
        self
    }

    pub fn is_persisted(&self) -> bool {
        !self.id.is_empty()
    }

    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        crate::dates::is_upcoming(self.date, now)
    }

    /// `currentAttendees > maxAttendees`; reported, never enforced
    pub fn is_over_capacity(&self) -> bool {
        self.max_attendees > 0 && self.current_attendees > self.max_attendees
    }
}

/// Equality filters for count queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct EventFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<EventCategory>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<EventStatus>,

    /// Only events created strictly after this instant
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_after: Option<DateTime<Utc>>,
}

impl EventFilter {
    pub fn category(category: EventCategory) -> Self {
        Self {
            category: Some(category),
            ..Self::default()
        }
    }

    pub fn status(status: EventStatus) -> Self {
        Self {
            status: Some(status),
            ..Self::default()
        }
    }

    pub fn created_after(instant: DateTime<Utc>) -> Self {
        Self {
            created_after: Some(instant),
            ..Self::default()
        }
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.category
            .is_none_or(|category| event.category == CategoryValue::Known(category))
            && self.status.is_none_or(|status| event.status == status)
            && self
                .created_after
                .is_none_or(|instant| event.created_at > instant)
    }
}

/// Dashboard counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EventAnalytics {
    pub total_events: u64,
    pub active_events: u64,
    /// Created within the last 30 days
    pub recent_events: u64,
    /// Keyed by canonical category token
    pub category_counts: HashMap<String, u64>,
}

/// Atomic status change for several events
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct BatchStatusUpdate {
    #[validate(length(min = 1, message = "At least one event id is required"))]
    pub ids: Vec<String>,
    pub status: EventStatus,
}

/// Image URLs to detach from an event
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct RemoveImages {
    #[validate(length(min = 1, message = "At least one image URL is required"))]
    pub urls: Vec<String>,
}

/// Identifier of a newly created document
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Created {
    pub id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_from_name_is_case_insensitive() {
        assert_eq!(EventCategory::from_name("musical"), Some(EventCategory::Musical));
        assert_eq!(EventCategory::from_name("Sports"), Some(EventCategory::Sports));
        assert_eq!(EventCategory::from_name(" FOOD "), Some(EventCategory::Food));
        assert_eq!(EventCategory::from_name("Theatre"), None);
        assert_eq!(EventCategory::from_name(""), None);
    }

    #[test]
    fn test_category_display_names() {
        assert_eq!(
            EventCategory::display_names(),
            vec!["Musical", "Sports", "Food", "Art"]
        );
        assert_eq!(EventCategory::Art.to_string(), "ART");
    }

    #[test]
    fn test_category_value_persists_canonical_token() {
        let legacy: CategoryValue = serde_json::from_str("\"Musical\"").unwrap();
        assert_eq!(legacy, CategoryValue::Known(EventCategory::Musical));
        assert_eq!(serde_json::to_string(&legacy).unwrap(), "\"MUSICAL\"");
    }

    #[test]
    fn test_category_value_keeps_unknown_tokens() {
        let other: CategoryValue = serde_json::from_str("\"Theatre\"").unwrap();
        assert_eq!(other.known(), None);
        assert_eq!(other.display_name(), "Other");
        assert_eq!(other.token(), "Theatre");
        assert_eq!(serde_json::to_string(&other).unwrap(), "\"Theatre\"");
        assert!(!other.is_blank());
        assert!(CategoryValue::default().is_blank());
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("cancelled".parse::<EventStatus>().unwrap(), EventStatus::Cancelled);
        assert_eq!("Draft".parse::<EventStatus>().unwrap(), EventStatus::Draft);
        assert!("archived".parse::<EventStatus>().is_err());
        assert_eq!(EventStatus::default(), EventStatus::Active);
    }

    #[test]
    fn test_event_json_uses_camel_case() {
        let event = Event::new("Jazz Night", EventCategory::Musical, Utc::now(), "19:30", "Blue Hall")
            .with_capacity(100, 12.5)
            .with_image_urls(vec!["https://cdn.example/a.jpg".to_string()]);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["category"], "MUSICAL");
        assert_eq!(json["status"], "active");
        assert_eq!(json["maxAttendees"], 100);
        assert_eq!(json["imageUrls"][0], "https://cdn.example/a.jpg");
        assert!(json.get("participantCount").is_none());
    }

    #[test]
    fn test_event_deserializes_with_missing_fields() {
        let event: Event = serde_json::from_str(r#"{"name":"Food Fair","category":"food"}"#).unwrap();
        assert_eq!(event.name, "Food Fair");
        assert_eq!(event.category.known(), Some(EventCategory::Food));
        assert!(event.id.is_empty());
        assert!(!event.is_persisted());
        assert_eq!(event.status, EventStatus::Active);
    }

    #[test]
    fn test_over_capacity_is_reported() {
        let mut event = Event::default().with_capacity(10, 0.0);
        event.current_attendees = 11;
        assert!(event.is_over_capacity());
        event.current_attendees = 10;
        assert!(!event.is_over_capacity());
    }

    #[test]
    fn test_filter_matches() {
        let now = Utc::now();
        let event = Event::new("Derby", EventCategory::Sports, now, "10:00", "Stadium")
            .with_status(EventStatus::Cancelled)
            .with_created_at(now);

        assert!(EventFilter::default().matches(&event));
        assert!(EventFilter::category(EventCategory::Sports).matches(&event));
        assert!(!EventFilter::category(EventCategory::Art).matches(&event));
        assert!(EventFilter::status(EventStatus::Cancelled).matches(&event));
        assert!(!EventFilter::created_after(now).matches(&event));
    }
}
