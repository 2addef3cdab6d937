//! Event validation rules
//!
//! Two validators guard every create and update:
//! - structural checks ([`validate_event_fields`]) collect every violated rule
//! - the temporal check ([`validate_event_date_time`]) stops at the first failure
//!
//! Full validation reports all structural errors followed by the first temporal one.

use chrono::{DateTime, Duration, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use strum::{Display, EnumString};
use validator::{ValidateEmail, ValidateUrl};

use crate::error::{EventError, Result};
use crate::models::Event;

pub const NAME_MIN_LEN: usize = 3;
pub const NAME_MAX_LEN: usize = 100;
pub const DESCRIPTION_MIN_LEN: usize = 10;
pub const DESCRIPTION_MAX_LEN: usize = 1000;
pub const LOCATION_MIN_LEN: usize = 3;
pub const MAX_IMAGES_PER_EVENT: usize = 5;

/// Minimum lead time between validation and the event start
pub const MIN_LEAD_TIME_HOURS: i64 = 1;

static TIME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([01]?[0-9]|2[0-3]):[0-5][0-9]$").unwrap());

static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9]{10,15}$").unwrap());

/// Which field set the structural validator checks
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ValidationMode {
    /// Name, description, category, location and time
    Basic,
    /// Basic plus organizer, contact details, capacity and price
    #[default]
    Full,
}

/// Outcome of a validation run; empty `errors` means valid
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn push(&mut self, reason: impl Into<String>) {
        self.errors.push(reason.into());
    }

    pub fn into_result(self) -> Result<()> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(EventError::ValidationFailed(self.errors))
        }
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn char_len(value: &str) -> usize {
    value.chars().count()
}

/// Structural checks, aggregating every violation
pub fn validate_event_fields(event: &Event, mode: ValidationMode) -> ValidationReport {
    let mut report = ValidationReport::default();

    if is_blank(&event.name) {
        report.push("Event name is required");
    } else if char_len(&event.name) < NAME_MIN_LEN {
        report.push("Event name must be at least 3 characters");
    } else if char_len(&event.name) > NAME_MAX_LEN {
        report.push("Event name must not exceed 100 characters");
    }

    if is_blank(&event.description) {
        report.push("Event description is required");
    } else if char_len(&event.description) < DESCRIPTION_MIN_LEN {
        report.push("Event description must be at least 10 characters");
    } else if char_len(&event.description) > DESCRIPTION_MAX_LEN {
        report.push("Event description must not exceed 1000 characters");
    }

    if event.category.is_blank() {
        report.push("Event category is required");
    }

    if is_blank(&event.location) {
        report.push("Event location is required");
    } else if char_len(&event.location) < LOCATION_MIN_LEN {
        report.push("Event location must be at least 3 characters");
    }

    if is_blank(&event.time) {
        report.push("Event time is required");
    }

    if mode == ValidationMode::Full {
        if is_blank(&event.organizer) {
            report.push("Organizer name is required");
        }
        if !is_blank(&event.contact_email) && !is_valid_email(&event.contact_email) {
            report.push("Invalid contact email format");
        }
        if !is_blank(&event.contact_phone) && !is_valid_phone(&event.contact_phone) {
            report.push("Invalid contact phone number format");
        }
        if event.max_attendees < 0 {
            report.push("Max attendees cannot be negative");
        }
        if event.ticket_price < 0.0 {
            report.push("Ticket price cannot be negative");
        }
    }

    report
}

pub fn is_valid_email(email: &str) -> bool {
    email.trim().validate_email()
}

/// Phone check after stripping whitespace
pub fn is_valid_phone(phone: &str) -> bool {
    let compact: String = phone.chars().filter(|c| !c.is_whitespace()).collect();
    PHONE_PATTERN.is_match(&compact)
}

/// Date-only comparison: today or later
pub fn is_event_date_valid(date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    date.date_naive() >= now.date_naive()
}

/// 24-hour `H:MM` or `HH:MM`
pub fn is_event_time_valid(time: &str) -> bool {
    TIME_PATTERN.is_match(time)
}

/// Temporal check, first failure wins
pub fn validate_event_date_time(
    date: DateTime<Utc>,
    time: &str,
    now: DateTime<Utc>,
) -> std::result::Result<(), String> {
    if !is_event_date_valid(date, now) {
        return Err("Event date cannot be in the past".to_string());
    }
    if !is_event_time_valid(time) {
        return Err("Invalid time format. Use HH:MM format".to_string());
    }

    let (hour, minute) = time
        .split_once(':')
        .ok_or_else(|| "Invalid time format".to_string())?;
    let hour: u32 = hour.parse().map_err(|_| "Invalid hour value".to_string())?;
    let minute: u32 = minute
        .parse()
        .map_err(|_| "Invalid minute value".to_string())?;
    let start_time =
        NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| "Invalid time format".to_string())?;

    let starts_at = date.date_naive().and_time(start_time).and_utc();
    if starts_at < now + Duration::hours(MIN_LEAD_TIME_HOURS) {
        return Err("Event must be scheduled at least 1 hour in advance".to_string());
    }

    Ok(())
}

/// Structural checks in `mode`, then the temporal check
pub fn validate_event_with_mode(
    event: &Event,
    mode: ValidationMode,
    now: DateTime<Utc>,
) -> ValidationReport {
    let mut report = validate_event_fields(event, mode);
    if let Err(reason) = validate_event_date_time(event.date, &event.time, now) {
        report.push(reason);
    }
    report
}

/// Gate for create and update in basic mode
pub fn validate_event(event: &Event, now: DateTime<Utc>) -> Result<()> {
    validate_event_with_mode(event, ValidationMode::Basic, now).into_result()
}

/// Gate for create and update in full mode
pub fn validate_event_full(event: &Event, now: DateTime<Utc>) -> Result<()> {
    validate_event_with_mode(event, ValidationMode::Full, now).into_result()
}

/// Image list rules: 1 to 5 entries, each an http(s) URL
pub fn validate_image_urls(image_urls: &[String]) -> ValidationReport {
    if image_urls.is_empty() {
        let mut report = ValidationReport::default();
        report.push("At least one event image is required");
        return report;
    }
    check_image_urls(image_urls, MAX_IMAGES_PER_EVENT)
}

/// At most `max_images` entries, each an http(s) URL; an empty list passes
pub fn check_image_urls(image_urls: &[String], max_images: usize) -> ValidationReport {
    let mut report = ValidationReport::default();

    if image_urls.len() > max_images {
        report.push(format!("Maximum {max_images} images allowed per event"));
    }

    for url in image_urls {
        let is_web = url.starts_with("http://") || url.starts_with("https://");
        if !is_web || !url.validate_url() {
            report.push(format!("Invalid image URL format: {url}"));
        }
    }

    report
}

/// Raw form input before it becomes an [`Event`]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventForm {
    pub name: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub location: String,
    pub image_count: usize,
}

/// Quick form check, first failure wins
pub fn validate_event_form(form: &EventForm) -> std::result::Result<(), String> {
    let checks: [(bool, &str); 7] = [
        (is_blank(&form.name), "Event name cannot be empty"),
        (is_blank(&form.description), "Description cannot be empty"),
        (is_blank(&form.date), "Please select a date"),
        (is_blank(&form.time), "Please select a time"),
        (is_blank(&form.location), "Location cannot be empty"),
        (form.image_count == 0, "Please select at least one image"),
        (!is_event_time_valid(&form.time), "Invalid time format"),
    ];

    match checks.iter().find(|(failed, _)| *failed) {
        Some((_, reason)) => Err((*reason).to_string()),
        None => Ok(()),
    }
}
