//! Events Domain
//!
//! Back office for creating and curating public events:
//! - Event entity with a closed category set and lifecycle status
//! - Field and date/time validation
//! - Image uploads to a blob store, tracked per event
//! - MongoDB (or in-memory) persistence behind [`EventRepository`]
//! - A list controller that keeps a filtered, sorted view for an admin screen
//! - Admin profiles keyed by the authenticated principal
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       Request Flow                            │
//! ├──────────────────────────────────────────────────────────────┤
//! │                                                               │
//! │  HTTP /events ──► EventService ─┬─► validation                │
//! │                        ▲        │                             │
//! │  EventListController ──┘        ├─► EventRepository           │
//! │                                 │     (MongoDB / in-memory)   │
//! │                                 │                             │
//! │                                 └─► MediaManager ─► BlobStore │
//! │                                                               │
//! │  HTTP /admin ──► AdminService ──► AdminProfileStore           │
//! │                                                               │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use utoipa::OpenApi;

mod admin;
mod config;
mod controller;
pub mod dates;
mod error;
mod handlers;
mod media;
mod memory;
mod models;
mod mongodb;
mod repository;
mod service;
pub mod validation;

pub use admin::{
    AdminProfileStore, AdminService, AdminUser, InMemoryAdminStore, MongoAdminStore,
    PERMISSION_CREATE_EVENT, PERMISSION_DELETE_EVENT, PERMISSION_EDIT_EVENT,
    PERMISSION_VIEW_ANALYTICS, Principal, PrincipalProvider,
};
pub use config::{EventsConfig, MediaConfig, StorageBackend};
pub use controller::{
    DeleteOutcome, EventListController, ListSnapshot, ListStatistics, SortKey, ViewState,
};
pub use error::{ErrorResponse, EventError, Result};
pub use handlers::{
    AdminState, DeleteQuery, EventsState, HeaderPrincipal, ListQuery, USER_EMAIL_HEADER,
    USER_ID_HEADER, admin_router, events_router,
};
pub use media::{BlobStore, HttpBlobStore, ImageUpload, InMemoryBlobStore, MediaManager};
pub use memory::InMemoryEventRepository;
pub use models::{
    BatchStatusUpdate, CategoryValue, Created, Event, EventAnalytics, EventCategory, EventFilter,
    EventStatus, RemoveImages,
};
pub use mongodb::MongoEventRepository;
pub use repository::{EventRepository, RECENT_WINDOW_DAYS};
pub use service::{EventService, HealthStatus};
pub use validation::ValidationMode;

/// OpenAPI documentation for the events API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::list_events,
        handlers::create_event,
        handlers::save_draft,
        handlers::get_analytics,
        handlers::batch_update_status,
        handlers::get_event,
        handlers::update_event,
        handlers::delete_event,
        handlers::duplicate_event,
        handlers::upload_image,
        handlers::remove_images,
        handlers::health_check,
    ),
    components(schemas(
        Event,
        EventCategory,
        EventStatus,
        EventAnalytics,
        BatchStatusUpdate,
        RemoveImages,
        Created,
        HealthStatus,
        ErrorResponse,
    )),
    tags(
        (name = "events", description = "Event management backed by MongoDB and a blob store")
    )
)]
pub struct ApiDoc;

/// OpenAPI documentation for the admin profile API
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::get_profile,
        handlers::create_profile,
        handlers::update_profile,
    ),
    components(schemas(AdminUser, ErrorResponse)),
    tags(
        (name = "admin", description = "Profile of the signed-in administrator")
    )
)]
pub struct AdminApiDoc;
