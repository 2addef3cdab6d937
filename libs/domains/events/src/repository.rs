//! Event repository trait

use crate::error::{EventError, Result};
use crate::models::{Event, EventAnalytics, EventCategory, EventFilter, EventStatus};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tracing::{debug, instrument};

/// Window for `recentEvents` in analytics
pub const RECENT_WINDOW_DAYS: i64 = 30;

/// Sentinel appended to a prefix to form the exclusive upper bound of a name range
pub const PREFIX_SENTINEL: char = '\u{f8ff}';

/// Exclusive upper bound for a name prefix range `[prefix, prefix + sentinel)`
pub fn prefix_upper_bound(prefix: &str) -> String {
    let mut upper = String::with_capacity(prefix.len() + PREFIX_SENTINEL.len_utf8());
    upper.push_str(prefix);
    upper.push(PREFIX_SENTINEL);
    upper
}

/// Repository trait for event storage operations
///
/// Every store failure surfaces as an `Err`; an absent document is `Ok(None)`
/// or `Ok(false)` and becomes `NotFound` at the service layer.
#[async_trait]
pub trait EventRepository: Send + Sync {
    /// Insert a new document, returning the assigned id
    async fn create(&self, event: Event) -> Result<String>;

    /// Full-document overwrite; `false` when no document has `id`
    async fn update(&self, id: &str, event: Event) -> Result<bool>;

    /// Remove the document; `false` when no document has `id`
    async fn delete(&self, id: &str) -> Result<bool>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Event>>;

    /// All events, newest `createdAt` first
    async fn get_all(&self) -> Result<Vec<Event>>;

    /// Events in `category`, earliest `date` first
    async fn get_by_category(&self, category: EventCategory) -> Result<Vec<Event>>;

    /// Events with `status`, newest `createdAt` first
    async fn get_by_status(&self, status: EventStatus) -> Result<Vec<Event>>;

    /// Case-sensitive name prefix match ordered by name
    async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Event>>;

    async fn count(&self, filter: &EventFilter) -> Result<u64>;

    /// Set `status` and `updatedAt` on every id, all or nothing.
    /// Fails with `NotFound` if any id is absent, leaving every document unchanged.
    async fn batch_update_status(
        &self,
        ids: &[String],
        status: EventStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()>;

    /// Copy an event into a new document with a fresh id
    #[instrument(skip(self))]
    async fn duplicate(&self, id: &str) -> Result<String> {
        let mut event = self
            .get_by_id(id)
            .await?
            .ok_or_else(|| EventError::not_found(id))?;
        event.id.clear();
        self.create(event).await
    }

    /// Dashboard counters: one count per category plus active, total and recent
    #[instrument(skip(self))]
    async fn analytics(&self, now: DateTime<Utc>) -> Result<EventAnalytics> {
        let total_events = self.count(&EventFilter::default()).await?;
        let active_events = self.count(&EventFilter::status(EventStatus::Active)).await?;
        let recent_events = self
            .count(&EventFilter::created_after(
                now - Duration::days(RECENT_WINDOW_DAYS),
            ))
            .await?;

        let mut analytics = EventAnalytics {
            total_events,
            active_events,
            recent_events,
            ..EventAnalytics::default()
        };
        for category in EventCategory::ALL {
            let count = self.count(&EventFilter::category(category)).await?;
            analytics
                .category_counts
                .insert(category.token().to_string(), count);
        }

        debug!(total_events, active_events, recent_events, "Computed analytics");
        Ok(analytics)
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use mockall::mock;

    mock! {
        pub EventRepository {}

        #[async_trait]
        impl EventRepository for EventRepository {
            async fn create(&self, event: Event) -> Result<String>;
            async fn update(&self, id: &str, event: Event) -> Result<bool>;
            async fn delete(&self, id: &str) -> Result<bool>;
            async fn get_by_id(&self, id: &str) -> Result<Option<Event>>;
            async fn get_all(&self) -> Result<Vec<Event>>;
            async fn get_by_category(&self, category: EventCategory) -> Result<Vec<Event>>;
            async fn get_by_status(&self, status: EventStatus) -> Result<Vec<Event>>;
            async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Event>>;
            async fn count(&self, filter: &EventFilter) -> Result<u64>;
            async fn batch_update_status(
                &self,
                ids: &[String],
                status: EventStatus,
                updated_at: DateTime<Utc>,
            ) -> Result<()>;
        }
    }
}
