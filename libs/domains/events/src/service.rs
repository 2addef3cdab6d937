//! Event service layer

use crate::error::{EventError, Result};
use crate::media::{ImageUpload, MediaManager};
use crate::models::{Event, EventAnalytics, EventCategory, EventFilter, EventStatus};
use crate::repository::EventRepository;
use crate::validation::{
    ValidationMode, ValidationReport, check_image_urls, validate_event_with_mode,
};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Event service that coordinates validation, the document store and the blob store
pub struct EventService<R: EventRepository> {
    repository: Arc<R>,
    media: MediaManager,
    validation_mode: ValidationMode,
}

impl<R: EventRepository> EventService<R> {
    /// Create a new event service with full validation
    pub fn new(repository: Arc<R>, media: MediaManager) -> Self {
        Self {
            repository,
            media,
            validation_mode: ValidationMode::Full,
        }
    }

    pub fn with_validation_mode(mut self, mode: ValidationMode) -> Self {
        self.validation_mode = mode;
        self
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    pub fn media(&self) -> &MediaManager {
        &self.media
    }

    fn validate(&self, event: &Event, now: DateTime<Utc>) -> Result<()> {
        let mut report = validate_event_with_mode(event, self.validation_mode, now);
        report.errors.extend(self.check_images(event).errors);
        report.into_result()?;
        if event.is_over_capacity() {
            warn!(
                current_attendees = event.current_attendees,
                max_attendees = event.max_attendees,
                "Event is over capacity"
            );
        }
        Ok(())
    }

    fn check_images(&self, event: &Event) -> ValidationReport {
        check_image_urls(&event.image_urls, self.media.config().max_images)
    }

    /// Validate and store a new event
    #[instrument(skip(self, event), fields(event_name = %event.name))]
    pub async fn create(&self, mut event: Event) -> Result<String> {
        let now = Utc::now();
        self.validate(&event, now)?;

        event.id.clear();
        event.created_at = now;
        event.updated_at = now;

        let id = self.repository.create(event).await?;
        info!(event_id = %id, "Event created");
        Ok(id)
    }

    /// Store an unfinished event as a draft; only the image list is checked
    #[instrument(skip(self, event), fields(event_name = %event.name))]
    pub async fn save_draft(&self, mut event: Event) -> Result<String> {
        self.check_images(&event).into_result()?;

        let now = Utc::now();
        event.id.clear();
        event.status = EventStatus::Draft;
        event.created_at = now;
        event.updated_at = now;

        let id = self.repository.create(event).await?;
        info!(event_id = %id, "Draft saved");
        Ok(id)
    }

    /// Create the event, upload its images, then record their URLs.
    ///
    /// A failed upload deletes the new document again and returns the batch
    /// failure, so a retry starts from a clean slate.
    #[instrument(skip(self, event, uploads), fields(event_name = %event.name, count = uploads.len()))]
    pub async fn create_with_images(
        &self,
        event: Event,
        uploads: Vec<ImageUpload>,
    ) -> Result<String> {
        if uploads.len() > self.media.config().max_images {
            return Err(EventError::validation(format!(
                "Maximum {} images allowed per event",
                self.media.config().max_images
            )));
        }

        let id = self.create(event).await?;
        let urls = match self.media.upload_images(&id, &uploads).await {
            Ok(urls) => urls,
            Err(err) => {
                match self.repository.delete(&id).await {
                    Ok(_) => info!(event_id = %id, "Event removed after failed image upload"),
                    Err(cleanup) => warn!(
                        event_id = %id,
                        error = %cleanup,
                        "Failed to remove event after failed image upload"
                    ),
                }
                return Err(err);
            }
        };
        if urls.is_empty() {
            return Ok(id);
        }

        let mut stored = self.require(&id).await?;
        stored.image_urls = urls;
        stored.updated_at = Utc::now();
        self.overwrite(&id, stored).await?;

        info!(event_id = %id, count = uploads.len(), "Event images attached");
        Ok(id)
    }

    /// Validate and overwrite an existing event
    #[instrument(skip(self, event))]
    pub async fn update(&self, id: &str, mut event: Event) -> Result<()> {
        let now = Utc::now();
        self.validate(&event, now)?;

        event.id = id.to_string();
        event.updated_at = now;
        self.overwrite(id, event).await?;

        info!(event_id = %id, "Event updated");
        Ok(())
    }

    async fn overwrite(&self, id: &str, event: Event) -> Result<()> {
        if self.repository.update(id, event).await? {
            Ok(())
        } else {
            Err(EventError::not_found(id))
        }
    }

    /// Delete the document; associated images are left in the blob store
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<()> {
        if !self.repository.delete(id).await? {
            warn!(event_id = %id, "Event not found for deletion");
            return Err(EventError::not_found(id));
        }
        info!(event_id = %id, "Event deleted");
        Ok(())
    }

    /// Delete the document, then its images
    #[instrument(skip(self))]
    pub async fn delete_with_images(&self, id: &str) -> Result<()> {
        let event = self.require(id).await?;
        self.delete(id).await?;
        self.media.delete_images(&event.image_urls).await?;
        info!(event_id = %id, count = event.image_urls.len(), "Event images deleted");
        Ok(())
    }

    /// Copy an event into a new document
    #[instrument(skip(self))]
    pub async fn duplicate(&self, id: &str) -> Result<String> {
        let copy_id = self.repository.duplicate(id).await?;
        info!(source_id = %id, event_id = %copy_id, "Event duplicated");
        Ok(copy_id)
    }

    #[instrument(skip(self))]
    pub async fn get_by_id(&self, id: &str) -> Result<Option<Event>> {
        self.repository.get_by_id(id).await
    }

    /// Like [`Self::get_by_id`] but absence is `NotFound`
    #[instrument(skip(self))]
    pub async fn require(&self, id: &str) -> Result<Event> {
        self.repository
            .get_by_id(id)
            .await?
            .ok_or_else(|| EventError::not_found(id))
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<Event>> {
        self.repository.get_all().await
    }

    #[instrument(skip(self))]
    pub async fn get_by_category(&self, category: EventCategory) -> Result<Vec<Event>> {
        self.repository.get_by_category(category).await
    }

    #[instrument(skip(self))]
    pub async fn get_by_status(&self, status: EventStatus) -> Result<Vec<Event>> {
        self.repository.get_by_status(status).await
    }

    #[instrument(skip(self))]
    pub async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Event>> {
        self.repository.search_by_name_prefix(prefix).await
    }

    #[instrument(skip(self))]
    pub async fn analytics(&self) -> Result<EventAnalytics> {
        self.repository.analytics(Utc::now()).await
    }

    /// Change the status of several events atomically
    #[instrument(skip(self, ids), fields(count = ids.len(), status = %status))]
    pub async fn batch_update_status(&self, ids: &[String], status: EventStatus) -> Result<()> {
        if ids.is_empty() {
            return Err(EventError::InvalidInput(
                "At least one event id is required".to_string(),
            ));
        }
        self.repository
            .batch_update_status(ids, status, Utc::now())
            .await?;
        info!("Event statuses updated");
        Ok(())
    }

    /// Upload images and append their URLs to the event
    #[instrument(skip(self, uploads), fields(count = uploads.len()))]
    pub async fn add_images(&self, id: &str, uploads: Vec<ImageUpload>) -> Result<Vec<String>> {
        let mut event = self.require(id).await?;

        let max_images = self.media.config().max_images;
        if event.image_urls.len() + uploads.len() > max_images {
            return Err(EventError::validation(format!(
                "Maximum {} images allowed per event",
                max_images
            )));
        }

        let urls = self.media.upload_images(id, &uploads).await?;
        event.image_urls.extend(urls.iter().cloned());
        event.updated_at = Utc::now();
        self.overwrite(id, event).await?;

        Ok(urls)
    }

    /// Delete images and drop their URLs from the event.
    ///
    /// On a partial failure the URLs that were deleted are still removed from
    /// the event before the error is returned.
    #[instrument(skip(self, urls), fields(count = urls.len()))]
    pub async fn remove_images(&self, id: &str, urls: &[String]) -> Result<()> {
        let mut event = self.require(id).await?;

        if let Some(unknown) = urls.iter().find(|url| !event.image_urls.contains(*url)) {
            return Err(EventError::NotFound(format!("image {unknown} on event {id}")));
        }

        let outcome = self.media.delete_images(urls).await;
        let removed: &[String] = match &outcome {
            Ok(()) => urls,
            Err(EventError::PartialBatchFailure { completed, .. }) => completed,
            Err(_) => &[],
        };

        if !removed.is_empty() {
            event.image_urls.retain(|url| !removed.contains(url));
            event.updated_at = Utc::now();
            self.overwrite(id, event).await?;
        }

        outcome
    }

    /// Probe the document store with a cheap count
    #[instrument(skip(self))]
    pub async fn health(&self) -> HealthStatus {
        match self.repository.count(&EventFilter::default()).await {
            Ok(_) => HealthStatus {
                status: "ok".to_string(),
                storage: true,
            },
            Err(err) => {
                warn!(error = %err, "Event store health probe failed");
                HealthStatus {
                    status: "degraded".to_string(),
                    storage: false,
                }
            }
        }
    }
}

/// Health status for the event service backends
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize, utoipa::ToSchema)]
pub struct HealthStatus {
    pub status: String,
    pub storage: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryEventRepository;
    use crate::repository::mock::MockEventRepository;
    use chrono::Duration;

    fn upcoming_event(name: &str) -> Event {
        Event::new(
            name,
            EventCategory::Musical,
            Utc::now() + Duration::days(7),
            "19:30",
            "Blue Hall",
        )
        .with_description("An evening of live music")
        .with_organizer("City Arts")
    }

    fn service() -> EventService<InMemoryEventRepository> {
        EventService::new(
            Arc::new(InMemoryEventRepository::new()),
            MediaManager::in_memory(),
        )
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_event() {
        let mut repo = MockEventRepository::new();
        repo.expect_create().never();
        let service = EventService::new(Arc::new(repo), MediaManager::in_memory());

        let result = service.create(Event::default()).await;
        match result {
            Err(EventError::ValidationFailed(errors)) => {
                assert!(errors.contains(&"Event name is required".to_string()));
                assert!(errors.contains(&"Organizer name is required".to_string()));
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_basic_mode_skips_organizer() {
        let mut event = upcoming_event("Jazz Night");
        event.organizer.clear();

        assert!(service().create(event.clone()).await.is_err());

        let service = service().with_validation_mode(ValidationMode::Basic);
        assert!(service.create(event).await.is_ok());
    }

    #[tokio::test]
    async fn test_create_stamps_timestamps() {
        let service = service();
        let before = Utc::now();
        let id = service.create(upcoming_event("Jazz Night")).await.unwrap();

        let stored = service.require(&id).await.unwrap();
        assert!(stored.created_at >= before);
        assert_eq!(stored.created_at, stored.updated_at);
    }

    #[tokio::test]
    async fn test_over_capacity_is_accepted() {
        let mut event = upcoming_event("Sold Out").with_capacity(10, 5.0);
        event.current_attendees = 12;
        assert!(service().create(event).await.is_ok());
    }

    #[tokio::test]
    async fn test_save_draft_skips_validation() {
        let service = service();
        let id = service.save_draft(Event::default()).await.unwrap();
        let stored = service.require(&id).await.unwrap();
        assert_eq!(stored.status, EventStatus::Draft);
    }

    #[tokio::test]
    async fn test_update_refreshes_updated_at() {
        let service = service();
        let id = service.create(upcoming_event("Jazz Night")).await.unwrap();
        let created = service.require(&id).await.unwrap();

        let mut changed = created.clone().with_description("A longer evening of live music");
        changed.name = "Jazz Night Extended".to_string();
        service.update(&id, changed).await.unwrap();

        let stored = service.require(&id).await.unwrap();
        assert_eq!(stored.name, "Jazz Night Extended");
        assert!(stored.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_too_many_image_urls() {
        let service = service();
        let id = service.create(upcoming_event("Jazz Night")).await.unwrap();

        let six = (0..6)
            .map(|i| format!("https://cdn.example.com/{i}.jpg"))
            .collect();
        let result = service
            .update(&id, upcoming_event("Jazz Night").with_image_urls(six))
            .await;
        match result {
            Err(EventError::ValidationFailed(errors)) => {
                assert_eq!(errors, vec!["Maximum 5 images allowed per event"]);
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(service.require(&id).await.unwrap().image_urls.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_draft_reject_non_url_images() {
        let service = service();
        let bogus = vec!["not a url".to_string()];

        let result = service
            .create(upcoming_event("Jazz Night").with_image_urls(bogus.clone()))
            .await;
        assert!(matches!(result, Err(EventError::ValidationFailed(_))));

        let result = service
            .save_draft(Event::default().with_image_urls(bogus))
            .await;
        assert!(matches!(result, Err(EventError::ValidationFailed(_))));
        assert!(service.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_keeps_uploaded_images() {
        let service = service();
        let id = service
            .create_with_images(
                upcoming_event("Jazz Night"),
                vec![ImageUpload::new("image/jpeg", vec![1])],
            )
            .await
            .unwrap();

        let stored = service.require(&id).await.unwrap();
        let changed = stored.clone().with_description("A longer evening of live music");
        service.update(&id, changed).await.unwrap();
        assert_eq!(service.require(&id).await.unwrap().image_urls, stored.image_urls);
    }

    #[tokio::test]
    async fn test_update_and_delete_missing_are_not_found() {
        let service = service();
        let result = service.update("missing", upcoming_event("Jazz Night")).await;
        assert!(matches!(result, Err(EventError::NotFound(_))));

        let result = service.delete("missing").await;
        assert!(matches!(result, Err(EventError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_store_failure_propagates() {
        let mut repo = MockEventRepository::new();
        repo.expect_get_all()
            .returning(|| Err(EventError::StoreUnavailable("timeout".into())));
        let service = EventService::new(Arc::new(repo), MediaManager::in_memory());

        let result = service.get_all().await;
        assert!(matches!(result, Err(ref e) if e.is_retryable()));
    }

    #[tokio::test]
    async fn test_batch_status_requires_ids() {
        let result = service().batch_update_status(&[], EventStatus::Cancelled).await;
        assert!(matches!(result, Err(EventError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_with_images_records_urls() {
        let service = service();
        let id = service
            .create_with_images(
                upcoming_event("Jazz Night"),
                vec![
                    ImageUpload::new("image/jpeg", vec![1]),
                    ImageUpload::new("image/jpeg", vec![2]),
                ],
            )
            .await
            .unwrap();

        let stored = service.require(&id).await.unwrap();
        assert_eq!(stored.image_urls.len(), 2);
        assert!(stored.image_urls[0].contains(&format!("{id}_image_0_")));
    }

    #[tokio::test]
    async fn test_add_and_remove_images() {
        let service = service();
        let id = service.create(upcoming_event("Jazz Night")).await.unwrap();

        let urls = service
            .add_images(&id, vec![ImageUpload::new("image/png", vec![7])])
            .await
            .unwrap();
        assert_eq!(service.require(&id).await.unwrap().image_urls, urls);

        service.remove_images(&id, &urls).await.unwrap();
        assert!(service.require(&id).await.unwrap().image_urls.is_empty());
    }

    #[tokio::test]
    async fn test_remove_unknown_image_is_not_found() {
        let service = service();
        let id = service.create(upcoming_event("Jazz Night")).await.unwrap();
        let result = service
            .remove_images(&id, &["https://cdn.example.com/x.jpg".to_string()])
            .await;
        assert!(matches!(result, Err(EventError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_plain_delete_keeps_images() {
        let store = crate::media::InMemoryBlobStore::new();
        let service = EventService::new(
            Arc::new(InMemoryEventRepository::new()),
            MediaManager::new(Arc::new(store.clone()), Default::default()),
        );

        let id = service
            .create_with_images(
                upcoming_event("Jazz Night"),
                vec![ImageUpload::new("image/jpeg", vec![1])],
            )
            .await
            .unwrap();
        service.delete(&id).await.unwrap();
        assert_eq!(store.len().await, 1);

        let id = service
            .create_with_images(
                upcoming_event("Blues Night"),
                vec![ImageUpload::new("image/jpeg", vec![1])],
            )
            .await
            .unwrap();
        service.delete_with_images(&id).await.unwrap();
        assert_eq!(store.len().await, 1);
    }
}
