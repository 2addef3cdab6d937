//! HTTP handlers for the events admin API

use crate::admin::{AdminProfileStore, AdminService, AdminUser, Principal};
use crate::error::EventError;
use crate::media::ImageUpload;
use crate::models::{
    BatchStatusUpdate, Created, Event, EventAnalytics, EventCategory, EventFilter, EventStatus,
    RemoveImages,
};
use crate::repository::EventRepository;
use crate::service::{EventService, HealthStatus};
use axum::body::Bytes;
use axum::extract::{FromRequestParts, Path, Query, State};
use axum::http::request::Parts;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::instrument;
use utoipa::IntoParams;
use validator::Validate;

/// Events router state
pub type EventsState<R> = Arc<EventService<R>>;

/// Admin profile router state
pub type AdminState<S> = Arc<S>;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const USER_EMAIL_HEADER: &str = "x-user-email";

/// Create the events router
pub fn events_router<R: EventRepository + 'static>() -> Router<EventsState<R>> {
    Router::new()
        .route("/", get(list_events::<R>).post(create_event::<R>))
        .route("/drafts", post(save_draft::<R>))
        .route("/analytics", get(get_analytics::<R>))
        .route("/status", post(batch_update_status::<R>))
        .route("/health", get(health_check::<R>))
        .route(
            "/{id}",
            get(get_event::<R>)
                .put(update_event::<R>)
                .delete(delete_event::<R>),
        )
        .route("/{id}/duplicate", post(duplicate_event::<R>))
        .route(
            "/{id}/images",
            post(upload_image::<R>).delete(remove_images::<R>),
        )
}

/// Create the admin profile router
pub fn admin_router<S: AdminProfileStore + 'static>() -> Router<AdminState<S>> {
    Router::new().route(
        "/profile",
        get(get_profile::<S>)
            .post(create_profile::<S>)
            .put(update_profile::<S>),
    )
}

/// List query; `q` wins over `category`, which wins over `status` for the
/// store query, and the remaining filters are applied to its result
#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    /// Category token or display name
    pub category: Option<String>,
    /// Status token
    pub status: Option<String>,
    /// Case-sensitive name prefix
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteQuery {
    /// Also delete the event's images
    #[serde(default)]
    pub cascade: bool,
}

fn parse_category(name: &str) -> Result<EventCategory, EventError> {
    EventCategory::from_name(name)
        .ok_or_else(|| EventError::InvalidInput(format!("Unknown category: {name}")))
}

fn parse_status(name: &str) -> Result<EventStatus, EventError> {
    name.trim()
        .parse()
        .map_err(|_| EventError::InvalidInput(format!("Unknown status: {name}")))
}

/// List events, newest first
#[utoipa::path(
    get,
    path = "/",
    params(ListQuery),
    responses(
        (status = 200, description = "List of events", body = Vec<Event>),
        (status = 400, description = "Unknown category or status"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn list_events<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Event>>, EventError> {
    let category = query.category.as_deref().map(parse_category).transpose()?;
    let status = query.status.as_deref().map(parse_status).transpose()?;
    let prefix = query.q.as_deref().filter(|q| !q.is_empty());

    let mut events = match (prefix, category, status) {
        (Some(prefix), _, _) => state.search_by_name_prefix(prefix).await?,
        (None, Some(category), _) => state.get_by_category(category).await?,
        (None, None, Some(status)) => state.get_by_status(status).await?,
        (None, None, None) => state.get_all().await?,
    };

    let filter = EventFilter {
        category,
        status,
        created_after: None,
    };
    events.retain(|event| filter.matches(event));
    Ok(Json(events))
}

/// Create a new event
#[utoipa::path(
    post,
    path = "/",
    request_body = Event,
    responses(
        (status = 201, description = "Event created", body = Created),
        (status = 400, description = "Validation error"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state, event), fields(event_name = %event.name))]
pub async fn create_event<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Json(event): Json<Event>,
) -> Result<impl IntoResponse, EventError> {
    let id = state.create(event).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// Save an unfinished event as a draft
#[utoipa::path(
    post,
    path = "/drafts",
    request_body = Event,
    responses(
        (status = 201, description = "Draft saved", body = Created),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state, event), fields(event_name = %event.name))]
pub async fn save_draft<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Json(event): Json<Event>,
) -> Result<impl IntoResponse, EventError> {
    let id = state.save_draft(event).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// Dashboard counters
#[utoipa::path(
    get,
    path = "/analytics",
    responses(
        (status = 200, description = "Event analytics", body = EventAnalytics),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn get_analytics<R: EventRepository>(
    State(state): State<EventsState<R>>,
) -> Result<Json<EventAnalytics>, EventError> {
    let analytics = state.analytics().await?;
    Ok(Json(analytics))
}

/// Change the status of several events; all or nothing
#[utoipa::path(
    post,
    path = "/status",
    request_body = BatchStatusUpdate,
    responses(
        (status = 204, description = "Statuses updated"),
        (status = 400, description = "No ids given"),
        (status = 404, description = "An event does not exist"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state, update), fields(count = update.ids.len(), status = %update.status))]
pub async fn batch_update_status<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Json(update): Json<BatchStatusUpdate>,
) -> Result<impl IntoResponse, EventError> {
    update.validate()?;
    state.batch_update_status(&update.ids, update.status).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get event by ID
#[utoipa::path(
    get,
    path = "/{id}",
    params(
        ("id" = String, Path, description = "Event ID")
    ),
    responses(
        (status = 200, description = "Event found", body = Event),
        (status = 404, description = "Event not found"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn get_event<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(id): Path<String>,
) -> Result<Json<Event>, EventError> {
    let event = state.require(&id).await?;
    Ok(Json(event))
}

/// Validate and overwrite an event
#[utoipa::path(
    put,
    path = "/{id}",
    params(
        ("id" = String, Path, description = "Event ID")
    ),
    request_body = Event,
    responses(
        (status = 204, description = "Event updated"),
        (status = 400, description = "Validation error"),
        (status = 404, description = "Event not found"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state, event))]
pub async fn update_event<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(id): Path<String>,
    Json(event): Json<Event>,
) -> Result<impl IntoResponse, EventError> {
    state.update(&id, event).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Delete event by ID
#[utoipa::path(
    delete,
    path = "/{id}",
    params(
        ("id" = String, Path, description = "Event ID"),
        DeleteQuery
    ),
    responses(
        (status = 204, description = "Event deleted"),
        (status = 404, description = "Event not found"),
        (status = 502, description = "Some images could not be deleted"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn delete_event<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(id): Path<String>,
    Query(query): Query<DeleteQuery>,
) -> Result<impl IntoResponse, EventError> {
    if query.cascade {
        state.delete_with_images(&id).await?;
    } else {
        state.delete(&id).await?;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Copy an event into a new document
#[utoipa::path(
    post,
    path = "/{id}/duplicate",
    params(
        ("id" = String, Path, description = "Source event ID")
    ),
    responses(
        (status = 201, description = "Copy created", body = Created),
        (status = 404, description = "Event not found"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "events"
)]
#[instrument(skip(state))]
pub async fn duplicate_event<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse, EventError> {
    let id = state.duplicate(&id).await?;
    Ok((StatusCode::CREATED, Json(Created { id })))
}

/// Upload one image from the raw request body
#[utoipa::path(
    post,
    path = "/{id}/images",
    params(
        ("id" = String, Path, description = "Event ID")
    ),
    request_body(content = Vec<u8>, content_type = "image/*"),
    responses(
        (status = 201, description = "Image attached", body = Vec<String>),
        (status = 400, description = "Empty body or image limit reached"),
        (status = 404, description = "Event not found"),
        (status = 502, description = "Blob store rejected the upload")
    ),
    tag = "events"
)]
#[instrument(skip(state, headers, body), fields(size = body.len()))]
pub async fn upload_image<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, EventError> {
    if body.is_empty() {
        return Err(EventError::InvalidInput("Image body is empty".to_string()));
    }

    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("application/octet-stream");

    let urls = state
        .add_images(&id, vec![ImageUpload::new(content_type, body.to_vec())])
        .await?;
    Ok((StatusCode::CREATED, Json(urls)))
}

/// Delete images and detach them from the event
#[utoipa::path(
    delete,
    path = "/{id}/images",
    params(
        ("id" = String, Path, description = "Event ID")
    ),
    request_body = RemoveImages,
    responses(
        (status = 204, description = "Images removed"),
        (status = 400, description = "No URLs given"),
        (status = 404, description = "Event or image not found"),
        (status = 502, description = "Some images could not be deleted")
    ),
    tag = "events"
)]
#[instrument(skip(state, request), fields(count = request.urls.len()))]
pub async fn remove_images<R: EventRepository>(
    State(state): State<EventsState<R>>,
    Path(id): Path<String>,
    Json(request): Json<RemoveImages>,
) -> Result<impl IntoResponse, EventError> {
    request.validate()?;
    state.remove_images(&id, &request.urls).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Health check endpoint
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health status", body = HealthStatus)
    ),
    tag = "events"
)]
pub async fn health_check<R: EventRepository>(
    State(state): State<EventsState<R>>,
) -> Json<HealthStatus> {
    Json(state.health().await)
}

/// Principal read from the identity headers set by the auth proxy
#[derive(Debug, Clone, Default)]
pub struct HeaderPrincipal(pub Option<Principal>);

impl<S: Send + Sync> FromRequestParts<S> for HeaderPrincipal {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_value = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        Ok(Self(header_value(USER_ID_HEADER).map(|id| {
            Principal::new(id, header_value(USER_EMAIL_HEADER))
        })))
    }
}

/// Current admin profile
#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "Admin profile, null when signed out or absent", body = AdminUser),
        (status = 503, description = "Store unavailable")
    ),
    tag = "admin"
)]
#[instrument(skip(state, principal))]
pub async fn get_profile<S: AdminProfileStore>(
    State(state): State<AdminState<S>>,
    principal: HeaderPrincipal,
) -> Result<Json<Option<AdminUser>>, EventError> {
    let admin = AdminService::new(state, principal.0).current_admin().await?;
    Ok(Json(admin))
}

/// Create the current principal's admin profile
#[utoipa::path(
    post,
    path = "/profile",
    request_body = AdminUser,
    responses(
        (status = 201, description = "Profile created", body = AdminUser),
        (status = 401, description = "No authenticated user"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "admin"
)]
#[instrument(skip(state, principal, admin))]
pub async fn create_profile<S: AdminProfileStore>(
    State(state): State<AdminState<S>>,
    principal: HeaderPrincipal,
    Json(admin): Json<AdminUser>,
) -> Result<impl IntoResponse, EventError> {
    let admin = AdminService::new(state, principal.0)
        .create_admin_profile(admin)
        .await?;
    Ok((StatusCode::CREATED, Json(admin)))
}

/// Overwrite the current principal's admin profile
#[utoipa::path(
    put,
    path = "/profile",
    request_body = AdminUser,
    responses(
        (status = 200, description = "Profile updated", body = AdminUser),
        (status = 401, description = "No authenticated user"),
        (status = 503, description = "Store unavailable")
    ),
    tag = "admin"
)]
#[instrument(skip(state, principal, admin))]
pub async fn update_profile<S: AdminProfileStore>(
    State(state): State<AdminState<S>>,
    principal: HeaderPrincipal,
    Json(admin): Json<AdminUser>,
) -> Result<Json<AdminUser>, EventError> {
    let admin = AdminService::new(state, principal.0)
        .update_admin_profile(admin)
        .await?;
    Ok(Json(admin))
}
