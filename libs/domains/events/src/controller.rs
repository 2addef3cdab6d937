//! Event list state for admin front ends
//!
//! The controller keeps the last fetched set of events and a derived view.
//! The view is recomputed from the fetched set and an immutable [`ViewState`]
//! on every change, so filter, search and sort always compose the same way.

use crate::error::Result;
use crate::models::{Event, EventCategory};
use crate::repository::EventRepository;
use crate::service::EventService;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;
use tracing::{debug, instrument, warn};

/// Sort applied to the derived view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Earliest date first
    Date,
    /// Case-insensitive
    Name,
    /// Stored category token
    Category,
}

/// Filter, search and sort settings
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ViewState {
    pub category: Option<EventCategory>,
    pub query: String,
    pub sort: Option<SortKey>,
}

impl ViewState {
    /// Category filter, then substring search, then stable sort
    pub fn apply(&self, events: &[Event]) -> Vec<Event> {
        let query = self.query.to_lowercase();

        let mut view: Vec<Event> = events
            .iter()
            .filter(|event| {
                self.category
                    .is_none_or(|category| event.category.known() == Some(category))
            })
            .filter(|event| query.is_empty() || matches_query(event, &query))
            .cloned()
            .collect();

        match self.sort {
            Some(SortKey::Date) => view.sort_by_key(|event| event.date),
            Some(SortKey::Name) => view.sort_by_cached_key(|event| event.name.to_lowercase()),
            Some(SortKey::Category) => {
                view.sort_by(|a, b| a.category.token().cmp(b.category.token()))
            }
            None => {}
        }

        view
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// `query` must already be lowercase
fn matches_query(event: &Event, query: &str) -> bool {
    [&event.name, &event.description, &event.location]
        .iter()
        .any(|field| field.to_lowercase().contains(query))
}

/// Result of the last delete issued through the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeleteOutcome {
    pub event_id: String,
    pub success: bool,
}

/// Everything a list screen renders
#[derive(Debug, Clone, Default, Serialize)]
pub struct ListSnapshot {
    /// Last fetched set
    pub all_events: Vec<Event>,
    /// Derived view
    pub events: Vec<Event>,
    pub view: ViewState,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub last_delete: Option<DeleteOutcome>,
}

/// Counts over the fetched set
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListStatistics {
    pub total: usize,
    pub upcoming: usize,
    pub past: usize,
    /// Keyed by stored category token
    pub by_category: BTreeMap<String, usize>,
}

/// Holds the fetched events and derived view for one list screen
pub struct EventListController<R: EventRepository> {
    service: Arc<EventService<R>>,
    state: watch::Sender<ListSnapshot>,
    latest_request: AtomicU64,
}

impl<R: EventRepository> EventListController<R> {
    pub fn new(service: Arc<EventService<R>>) -> Self {
        Self {
            service,
            state: watch::Sender::new(ListSnapshot::default()),
            latest_request: AtomicU64::new(0),
        }
    }

    /// Receive every state change
    pub fn subscribe(&self) -> watch::Receiver<ListSnapshot> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ListSnapshot {
        self.state.borrow().clone()
    }

    /// Fetch all events and reset filter, search and sort.
    ///
    /// Only the most recently issued load may apply its result.
    #[instrument(skip(self))]
    pub async fn load(&self) {
        let request = self.latest_request.fetch_add(1, Ordering::SeqCst) + 1;
        self.state.send_modify(|state| {
            state.is_loading = true;
            state.error_message = None;
        });

        let result = self.service.get_all().await;

        if self.latest_request.load(Ordering::SeqCst) != request {
            debug!(request, "Discarding stale load result");
            return;
        }

        self.state.send_modify(|state| {
            state.is_loading = false;
            match result {
                Ok(events) => {
                    state.view = ViewState::default();
                    state.events = events.clone();
                    state.all_events = events;
                }
                Err(err) => {
                    warn!(error = %err, "Failed to load events");
                    state.error_message = Some(err.to_string());
                }
            }
        });
    }

    pub async fn refresh(&self) {
        self.load().await
    }

    fn update_view(&self, change: impl FnOnce(&mut ViewState)) {
        self.state.send_modify(|state| {
            change(&mut state.view);
            state.events = state.view.apply(&state.all_events);
        });
    }

    /// `None` clears the category filter
    pub fn filter_by_category(&self, category: Option<EventCategory>) {
        self.update_view(|view| view.category = category);
    }

    /// Empty query clears the search
    pub fn search(&self, query: &str) {
        let query = query.to_string();
        self.update_view(|view| view.query = query);
    }

    pub fn sort_by_date(&self) {
        self.update_view(|view| view.sort = Some(SortKey::Date));
    }

    pub fn sort_by_name(&self) {
        self.update_view(|view| view.sort = Some(SortKey::Name));
    }

    pub fn sort_by_category(&self) {
        self.update_view(|view| view.sort = Some(SortKey::Category));
    }

    /// Delete through the service; on success the event is dropped locally
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        let result = self.service.delete(id).await;

        self.state.send_modify(|state| match &result {
            Ok(()) => {
                state.all_events.retain(|event| event.id != id);
                state.events.retain(|event| event.id != id);
                state.last_delete = Some(DeleteOutcome {
                    event_id: id.to_string(),
                    success: true,
                });
            }
            Err(err) => {
                state.error_message = Some(err.to_string());
                state.last_delete = Some(DeleteOutcome {
                    event_id: id.to_string(),
                    success: false,
                });
            }
        });

        result
    }

    pub fn clear_error(&self) {
        self.state.send_modify(|state| state.error_message = None);
    }

    /// Counts over the fetched set; never touches the view
    pub fn get_statistics(&self, now: DateTime<Utc>) -> ListStatistics {
        let state = self.state.borrow();
        let mut stats = ListStatistics {
            total: state.all_events.len(),
            ..ListStatistics::default()
        };

        for event in &state.all_events {
            if event.is_upcoming(now) {
                stats.upcoming += 1;
            } else {
                stats.past += 1;
            }
            *stats
                .by_category
                .entry(event.category.token().to_string())
                .or_default() += 1;
        }

        stats
    }
}
