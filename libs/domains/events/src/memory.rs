//! In-memory implementation of EventRepository

use crate::error::{EventError, Result};
use crate::models::{CategoryValue, Event, EventCategory, EventFilter, EventStatus};
use crate::repository::{EventRepository, prefix_upper_bound};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, instrument};
use uuid::Uuid;

/// Process-local event store for development and tests
#[derive(Clone, Default)]
pub struct InMemoryEventRepository {
    events: Arc<RwLock<HashMap<String, Event>>>,
}

impl InMemoryEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.events.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.read().await.is_empty()
    }

    async fn select(&self, predicate: impl Fn(&Event) -> bool) -> Vec<Event> {
        self.events
            .read()
            .await
            .values()
            .filter(|event| predicate(event))
            .cloned()
            .collect()
    }
}

fn newest_first(events: &mut [Event]) {
    events.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[async_trait]
impl EventRepository for InMemoryEventRepository {
    #[instrument(skip(self, event), fields(event_name = %event.name))]
    async fn create(&self, mut event: Event) -> Result<String> {
        let id = Uuid::now_v7().simple().to_string();
        event.id = id.clone();
        self.events.write().await.insert(id.clone(), event);

        info!(event_id = %id, "Created event");
        Ok(id)
    }

    #[instrument(skip(self, event))]
    async fn update(&self, id: &str, mut event: Event) -> Result<bool> {
        let mut events = self.events.write().await;
        match events.get_mut(id) {
            Some(stored) => {
                event.id = id.to_string();
                *stored = event;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        Ok(self.events.write().await.remove(id).is_some())
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Option<Event>> {
        Ok(self.events.read().await.get(id).cloned())
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Event>> {
        let mut events = self.select(|_| true).await;
        newest_first(&mut events);
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn get_by_category(&self, category: EventCategory) -> Result<Vec<Event>> {
        let wanted = CategoryValue::Known(category);
        let mut events = self.select(|event| event.category == wanted).await;
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.id.cmp(&b.id)));
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn get_by_status(&self, status: EventStatus) -> Result<Vec<Event>> {
        let mut events = self.select(|event| event.status == status).await;
        newest_first(&mut events);
        Ok(events)
    }

    #[instrument(skip(self))]
    async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Event>> {
        let upper = prefix_upper_bound(prefix);
        let mut events = self
            .select(|event| event.name.as_str() >= prefix && event.name < upper)
            .await;
        events.sort_by_key(|event| event.name.clone());
        Ok(events)
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &EventFilter) -> Result<u64> {
        let events = self.events.read().await;
        Ok(events.values().filter(|event| filter.matches(event)).count() as u64)
    }

    #[instrument(skip(self, ids), fields(count = ids.len(), status = %status))]
    async fn batch_update_status(
        &self,
        ids: &[String],
        status: EventStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut events = self.events.write().await;

        if let Some(missing) = ids.iter().find(|id| !events.contains_key(id.as_str())) {
            return Err(EventError::not_found(missing));
        }

        for id in ids {
            if let Some(event) = events.get_mut(id.as_str()) {
                event.status = status;
                event.updated_at = updated_at;
            }
        }

        info!("Batch status update committed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn event(name: &str, category: EventCategory, created_offset_days: i64) -> Event {
        let base = Utc.with_ymd_and_hms(2026, 1, 1, 9, 0, 0).unwrap();
        Event::new(
            name,
            category,
            base + Duration::days(60 - created_offset_days),
            "19:00",
            "Main Hall",
        )
        .with_created_at(base + Duration::days(created_offset_days))
    }

    #[tokio::test]
    async fn test_create_assigns_id() {
        let repo = InMemoryEventRepository::new();
        let id = repo
            .create(event("Jazz Night", EventCategory::Musical, 0))
            .await
            .unwrap();

        assert!(!id.is_empty());
        let stored = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.name, "Jazz Night");
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let repo = InMemoryEventRepository::new();
        assert!(repo.get_by_id("nope").await.unwrap().is_none());
        assert!(!repo.update("nope", Event::default()).await.unwrap());
        assert!(!repo.delete("nope").await.unwrap());
    }

    #[tokio::test]
    async fn test_update_overwrites_whole_document() {
        let repo = InMemoryEventRepository::new();
        let id = repo
            .create(event("Jazz Night", EventCategory::Musical, 0).with_tags(vec!["live".into()]))
            .await
            .unwrap();

        let replacement = event("Jazz Brunch", EventCategory::Food, 1);
        assert!(repo.update(&id, replacement).await.unwrap());

        let stored = repo.get_by_id(&id).await.unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.name, "Jazz Brunch");
        assert!(stored.tags.is_empty());
    }

    #[tokio::test]
    async fn test_orderings() {
        let repo = InMemoryEventRepository::new();
        repo.create(event("Derby", EventCategory::Sports, 1)).await.unwrap();
        repo.create(event("Marathon", EventCategory::Sports, 3)).await.unwrap();
        repo.create(event("Tasting", EventCategory::Food, 2)).await.unwrap();

        let all: Vec<String> = repo.get_all().await.unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(all, vec!["Marathon", "Tasting", "Derby"]);

        // later created means earlier date in this fixture
        let sports: Vec<String> = repo
            .get_by_category(EventCategory::Sports)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(sports, vec!["Marathon", "Derby"]);
    }

    #[tokio::test]
    async fn test_prefix_search_excludes_mid_string_matches() {
        let repo = InMemoryEventRepository::new();
        for name in ["Jazz Night", "Late Jazz", "Jazzfest", "jazz lower", "Blues"] {
            repo.create(event(name, EventCategory::Musical, 0)).await.unwrap();
        }

        let names: Vec<String> = repo
            .search_by_name_prefix("Jazz")
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Jazz Night", "Jazzfest"]);
    }

    #[tokio::test]
    async fn test_batch_status_is_all_or_nothing() {
        let repo = InMemoryEventRepository::new();
        let id1 = repo.create(event("Derby", EventCategory::Sports, 0)).await.unwrap();
        let id2 = repo.create(event("Marathon", EventCategory::Sports, 0)).await.unwrap();
        let at = Utc::now();

        let result = repo
            .batch_update_status(&[id1.clone(), "missing".into()], EventStatus::Cancelled, at)
            .await;
        assert!(matches!(result, Err(EventError::NotFound(_))));
        assert_eq!(
            repo.get_by_id(&id1).await.unwrap().unwrap().status,
            EventStatus::Active
        );

        repo.batch_update_status(&[id1.clone(), id2.clone()], EventStatus::Cancelled, at)
            .await
            .unwrap();
        for id in [id1, id2] {
            let stored = repo.get_by_id(&id).await.unwrap().unwrap();
            assert_eq!(stored.status, EventStatus::Cancelled);
            assert_eq!(stored.updated_at, at);
        }
    }

    #[tokio::test]
    async fn test_count_with_filters() {
        let repo = InMemoryEventRepository::new();
        repo.create(event("Derby", EventCategory::Sports, 0)).await.unwrap();
        repo.create(
            event("Gallery", EventCategory::Art, 0).with_status(EventStatus::Draft),
        )
        .await
        .unwrap();

        assert_eq!(repo.count(&EventFilter::default()).await.unwrap(), 2);
        assert_eq!(
            repo.count(&EventFilter::status(EventStatus::Active)).await.unwrap(),
            1
        );
        assert_eq!(
            repo.count(&EventFilter::category(EventCategory::Art)).await.unwrap(),
            1
        );
    }
}
