//! MongoDB implementation of EventRepository

use crate::error::{EventError, Result};
use crate::models::{CategoryValue, Event, EventCategory, EventFilter, EventStatus};
use crate::repository::{EventRepository, prefix_upper_bound};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::TryStreamExt;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{self, Document, doc};
use mongodb::options::FindOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

/// Stored shape of an event: ObjectId key and BSON datetimes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EventDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    category: CategoryValue,
    date: bson::DateTime,
    #[serde(default)]
    time: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    participant_count: Option<u32>,
    #[serde(default)]
    created_by: String,
    created_at: bson::DateTime,
    updated_at: bson::DateTime,
    #[serde(default)]
    status: EventStatus,
    #[serde(default)]
    max_attendees: i32,
    #[serde(default)]
    current_attendees: i32,
    #[serde(default)]
    ticket_price: f64,
    #[serde(default)]
    organizer: String,
    #[serde(default)]
    contact_email: String,
    #[serde(default)]
    contact_phone: String,
    #[serde(default)]
    tags: Vec<String>,
}

fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn from_bson_datetime(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}

impl EventDocument {
    /// The id is dropped; the store key is carried separately
    fn from_event(event: Event) -> Self {
        Self {
            id: None,
            name: event.name,
            description: event.description,
            category: event.category,
            date: to_bson_datetime(event.date),
            time: event.time,
            location: event.location,
            image_urls: event.image_urls,
            participant_count: event.participant_count,
            created_by: event.created_by,
            created_at: to_bson_datetime(event.created_at),
            updated_at: to_bson_datetime(event.updated_at),
            status: event.status,
            max_attendees: event.max_attendees,
            current_attendees: event.current_attendees,
            ticket_price: event.ticket_price,
            organizer: event.organizer,
            contact_email: event.contact_email,
            contact_phone: event.contact_phone,
            tags: event.tags,
        }
    }

    fn into_event(self) -> Event {
        Event {
            id: self.id.map(|oid| oid.to_hex()).unwrap_or_default(),
            name: self.name,
            description: self.description,
            category: self.category,
            date: from_bson_datetime(self.date),
            time: self.time,
            location: self.location,
            image_urls: self.image_urls,
            participant_count: self.participant_count,
            created_by: self.created_by,
            created_at: from_bson_datetime(self.created_at),
            updated_at: from_bson_datetime(self.updated_at),
            status: self.status,
            max_attendees: self.max_attendees,
            current_attendees: self.current_attendees,
            ticket_price: self.ticket_price,
            organizer: self.organizer,
            contact_email: self.contact_email,
            contact_phone: self.contact_phone,
            tags: self.tags,
        }
    }
}

/// Ids that are not valid ObjectIds cannot match any document
fn parse_id(id: &str) -> Option<ObjectId> {
    ObjectId::parse_str(id).ok()
}

/// Build the count filter document for an EventFilter
fn build_filter(filter: &EventFilter) -> Document {
    let mut query = Document::new();

    if let Some(category) = filter.category {
        query.insert("category", category.token());
    }
    if let Some(status) = filter.status {
        query.insert("status", status.to_string());
    }
    if let Some(after) = filter.created_after {
        query.insert("createdAt", doc! { "$gt": to_bson_datetime(after) });
    }

    query
}

fn name_prefix_filter(prefix: &str) -> Document {
    doc! { "name": { "$gte": prefix, "$lt": prefix_upper_bound(prefix) } }
}

/// MongoDB-based event repository
#[derive(Clone)]
pub struct MongoEventRepository {
    client: Client,
    collection: Collection<EventDocument>,
}

impl MongoEventRepository {
    /// Create a new MongoDB event repository
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        Self {
            client: client.clone(),
            collection: client.database(database).collection(collection),
        }
    }

    /// Create indexes backing every ordered query
    pub async fn create_indexes(&self) -> Result<()> {
        let indexes = vec![
            IndexModel::builder().keys(doc! { "createdAt": -1 }).build(),
            IndexModel::builder()
                .keys(doc! { "category": 1, "date": 1 })
                .build(),
            IndexModel::builder()
                .keys(doc! { "status": 1, "createdAt": -1 })
                .build(),
            IndexModel::builder().keys(doc! { "name": 1 }).build(),
        ];

        self.collection.create_indexes(indexes).await?;
        info!("Event indexes ensured");
        Ok(())
    }

    async fn find_sorted(&self, query: Document, sort: Document) -> Result<Vec<Event>> {
        let options = FindOptions::builder().sort(sort).build();
        let cursor = self.collection.find(query).with_options(options).await?;
        let documents: Vec<EventDocument> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(EventDocument::into_event).collect())
    }
}

#[async_trait]
impl EventRepository for MongoEventRepository {
    #[instrument(skip(self, event), fields(event_name = %event.name))]
    async fn create(&self, event: Event) -> Result<String> {
        let result = self
            .collection
            .insert_one(EventDocument::from_event(event))
            .await?;
        let id = result
            .inserted_id
            .as_object_id()
            .map(|oid| oid.to_hex())
            .ok_or_else(|| EventError::StoreUnavailable("store returned a non-ObjectId key".into()))?;

        info!(event_id = %id, "Event stored in MongoDB");
        Ok(id)
    }

    #[instrument(skip(self, event))]
    async fn update(&self, id: &str, event: Event) -> Result<bool> {
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };
        let mut document = EventDocument::from_event(event);
        document.id = Some(oid);

        let result = self
            .collection
            .replace_one(doc! { "_id": oid }, document)
            .await?;
        Ok(result.matched_count > 0)
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: &str) -> Result<bool> {
        let Some(oid) = parse_id(id) else {
            return Ok(false);
        };
        let result = self.collection.delete_one(doc! { "_id": oid }).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn get_by_id(&self, id: &str) -> Result<Option<Event>> {
        let Some(oid) = parse_id(id) else {
            debug!("Id is not an ObjectId");
            return Ok(None);
        };
        let document = self.collection.find_one(doc! { "_id": oid }).await?;
        Ok(document.map(EventDocument::into_event))
    }

    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Event>> {
        self.find_sorted(doc! {}, doc! { "createdAt": -1 }).await
    }

    #[instrument(skip(self))]
    async fn get_by_category(&self, category: EventCategory) -> Result<Vec<Event>> {
        self.find_sorted(doc! { "category": category.token() }, doc! { "date": 1 })
            .await
    }

    #[instrument(skip(self))]
    async fn get_by_status(&self, status: EventStatus) -> Result<Vec<Event>> {
        self.find_sorted(
            doc! { "status": status.to_string() },
            doc! { "createdAt": -1 },
        )
        .await
    }

    #[instrument(skip(self))]
    async fn search_by_name_prefix(&self, prefix: &str) -> Result<Vec<Event>> {
        self.find_sorted(name_prefix_filter(prefix), doc! { "name": 1 })
            .await
    }

    #[instrument(skip(self, filter))]
    async fn count(&self, filter: &EventFilter) -> Result<u64> {
        let count = self.collection.count_documents(build_filter(filter)).await?;
        Ok(count)
    }

    #[instrument(skip(self, ids), fields(count = ids.len(), status = %status))]
    async fn batch_update_status(
        &self,
        ids: &[String],
        status: EventStatus,
        updated_at: DateTime<Utc>,
    ) -> Result<()> {
        let mut oids = Vec::with_capacity(ids.len());
        for id in ids {
            oids.push(parse_id(id).ok_or_else(|| EventError::not_found(id))?);
        }

        let update = doc! {
            "$set": {
                "status": status.to_string(),
                "updatedAt": to_bson_datetime(updated_at),
            }
        };

        let mut session = self.client.start_session().await?;
        session.start_transaction().await?;

        for (id, oid) in ids.iter().zip(oids) {
            let result = self
                .collection
                .update_one(doc! { "_id": oid }, update.clone())
                .session(&mut session)
                .await;

            match result {
                Ok(outcome) if outcome.matched_count > 0 => {}
                Ok(_) => {
                    warn!(event_id = %id, "Batch status update aborted: event missing");
                    let abort = session.abort_transaction().await;
                    return Err(after_abort(EventError::not_found(id), abort));
                }
                Err(err) => {
                    let abort = session.abort_transaction().await;
                    return Err(after_abort(err.into(), abort));
                }
            }
        }

        session.commit_transaction().await?;
        info!("Batch status update committed");
        Ok(())
    }
}

/// The error that caused the abort wins over a failed abort
fn after_abort<E: std::fmt::Display>(
    cause: EventError,
    abort: std::result::Result<(), E>,
) -> EventError {
    if let Err(err) = abort {
        warn!(error = %err, cause = %cause, "Failed to abort batch status transaction");
    }
    cause
}
