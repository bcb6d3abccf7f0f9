//! Admin Events Lambda - Password-gated event management.
//!
//! Endpoints:
//! - POST /admin/events - Create an event
//! - PUT /admin/events/{id} - Partially update an event
//! - DELETE /admin/events/{id} - Delete an event and its category rows
//!
//! Every request must present the shared admin secret in the Authorization
//! header; a "Bearer " prefix is accepted and stripped.

use chrono::{DateTime, Utc};
use lambda_http::{run, service_fn, Body, Error, Request, Response};
use serde::Deserialize;
use serde_json::json;
use shared::http::{error_response, json_response, ApiResponse};
use shared::models::{EventCategory, EventResponse, EventRow};
use shared::{auth, db, parse_body, Config};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use validator::Validate;

/// Create event request
#[derive(Debug, Deserialize, Validate)]
struct CreateEventRequest {
    #[validate(length(min = 1))]
    title: String,
    description: Option<String>,
    #[validate(length(min = 1))]
    start_time: String,
    end_time: Option<String>,
    #[validate(length(min = 1))]
    categories: Vec<String>,
    location: Option<String>,
    organizer: Option<String>,
}

/// Update event request; absent fields keep their stored values
#[derive(Debug, Deserialize)]
struct UpdateEventRequest {
    title: Option<String>,
    description: Option<String>,
    start_time: Option<String>,
    end_time: Option<String>,
    categories: Option<Vec<String>>,
    location: Option<String>,
    organizer: Option<String>,
}

/// Fully-resolved event waiting to be inserted
#[derive(Debug)]
struct NewEvent {
    id: Uuid,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    location: Option<String>,
    organizer: Option<String>,
    categories: Vec<EventCategory>,
}

/// Merged state of an event after applying an update request
#[derive(Debug)]
struct EventUpdate {
    id: Uuid,
    title: String,
    description: Option<String>,
    start_time: DateTime<Utc>,
    end_time: Option<DateTime<Utc>>,
    location: Option<String>,
    organizer: Option<String>,
    /// Replacement category set, or `None` to leave the stored rows alone.
    categories: Option<Vec<EventCategory>>,
    /// Names already stored, echoed back when no replacement is given.
    existing_categories: Vec<String>,
}

/// Application state
struct AppState {
    admin_password: String,
    db_pool: PgPool,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let admin_password = config
            .admin_password
            .clone()
            .ok_or("ADMIN_PASSWORD not set")?;
        let db_pool = db::create_pool(&config).await?;

        Ok(Self {
            admin_password,
            db_pool,
        })
    }
}

/// Pull the event id out of an /admin/events/{id} path.
fn parse_event_id(path: &str) -> Result<Uuid, (u16, &'static str)> {
    let id = path.trim_start_matches("/admin/events/");
    if id.is_empty() {
        return Err((400, "Event ID required"));
    }
    Uuid::parse_str(id).map_err(|_| (400, "Invalid event ID"))
}

fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|instant| instant.with_timezone(&Utc))
}

fn empty_to_none(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Parse category names, deduplicating while keeping first-seen order.
fn parse_categories(raw: &[String]) -> Result<Vec<EventCategory>, &str> {
    let mut categories = Vec::new();
    for token in raw {
        let category: EventCategory = match token.parse() {
            Ok(category) => category,
            Err(_) => return Err(token),
        };
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    Ok(categories)
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let raw_path = event.uri().path();
    // Strip /api stage prefix if present (API Gateway REST API includes stage in path)
    let path = raw_path.strip_prefix("/api").unwrap_or(raw_path);
    let method = event.method().as_str();

    info!("Received request: method={}, path={} (raw: {})", method, path, raw_path);

    if let Err(e) = auth::require_admin(&event, &state.admin_password) {
        return error_response(e.status_code(), "Unauthorized");
    }

    match (method, path) {
        // Create event
        ("POST", "/admin/events") => {
            let request: CreateEventRequest = parse_body!(event.body());

            if request.validate().is_err() {
                return error_response(
                    400,
                    "Missing required fields: title, start_time, categories",
                );
            }

            let start_time = match parse_instant(&request.start_time) {
                Some(instant) => instant,
                None => return error_response(400, "Invalid start_time format"),
            };

            let end_time = match request.end_time.as_deref() {
                Some(value) if !value.is_empty() => match parse_instant(value) {
                    Some(instant) => Some(instant),
                    None => return error_response(400, "Invalid end_time format"),
                },
                _ => None,
            };

            if let Some(end) = end_time {
                if end < start_time {
                    return error_response(400, "end_time must be after start_time");
                }
            }

            let categories = match parse_categories(&request.categories) {
                Ok(categories) => categories,
                Err(token) => {
                    return error_response(400, format!("Unknown category: {}", token));
                }
            };

            let new_event = NewEvent {
                id: Uuid::new_v4(),
                title: request.title,
                description: request.description.and_then(empty_to_none),
                start_time,
                end_time,
                location: request.location.and_then(empty_to_none),
                organizer: request.organizer.and_then(empty_to_none),
                categories,
            };

            match insert_event(&state.db_pool, &new_event).await {
                Ok(row) => {
                    info!("Created event {}", row.id);
                    json_response(201, &ApiResponse::success(EventResponse::from(row)))
                }
                Err(e) => {
                    error!("Failed to create event: {}", e);
                    error_response(500, "Failed to create event")
                }
            }
        }

        // Update event
        _ if path.starts_with("/admin/events/") && method == "PUT" => {
            let id = match parse_event_id(path) {
                Ok(id) => id,
                Err((status, message)) => return error_response(status, message),
            };

            let request: UpdateEventRequest = parse_body!(event.body());

            let existing = match fetch_event(&state.db_pool, id).await {
                Ok(Some(row)) => row,
                Ok(None) => return error_response(404, "Event not found"),
                Err(e) => {
                    error!("Failed to update event {}: {}", id, e);
                    return error_response(500, "Failed to update event");
                }
            };

            let title = match request.title {
                Some(value) if value.is_empty() => {
                    return error_response(400, "Title cannot be empty");
                }
                Some(value) => value,
                None => existing.title,
            };

            let start_time = match request.start_time.as_deref() {
                Some(value) => match parse_instant(value) {
                    Some(instant) => instant,
                    None => return error_response(400, "Invalid start_time format"),
                },
                None => existing.start_time,
            };

            let end_time = match request.end_time.as_deref() {
                // An explicit empty string clears the end time.
                Some("") => None,
                Some(value) => match parse_instant(value) {
                    Some(instant) => Some(instant),
                    None => return error_response(400, "Invalid end_time format"),
                },
                None => existing.end_time,
            };

            if let Some(end) = end_time {
                if end < start_time {
                    return error_response(400, "end_time must be after start_time");
                }
            }

            let categories = match request.categories.as_deref() {
                Some([]) => {
                    return error_response(400, "At least one category is required");
                }
                Some(raw) => match parse_categories(raw) {
                    Ok(parsed) => Some(parsed),
                    Err(token) => {
                        return error_response(400, format!("Unknown category: {}", token));
                    }
                },
                None => None,
            };

            let description = match request.description {
                Some(value) => empty_to_none(value),
                None => existing.description,
            };
            let location = match request.location {
                Some(value) => empty_to_none(value),
                None => existing.location,
            };
            let organizer = match request.organizer {
                Some(value) => empty_to_none(value),
                None => existing.organizer,
            };

            let update = EventUpdate {
                id,
                title,
                description,
                start_time,
                end_time,
                location,
                organizer,
                categories,
                existing_categories: existing.categories,
            };

            match apply_update(&state.db_pool, &update).await {
                Ok(row) => {
                    info!("Updated event {}", id);
                    json_response(200, &ApiResponse::success(EventResponse::from(row)))
                }
                Err(shared::Error::NotFound(message)) => error_response(404, message),
                Err(e) => {
                    error!("Failed to update event {}: {}", id, e);
                    error_response(500, "Failed to update event")
                }
            }
        }

        // Delete event
        _ if path.starts_with("/admin/events/") && method == "DELETE" => {
            let id = match parse_event_id(path) {
                Ok(id) => id,
                Err((status, message)) => return error_response(status, message),
            };

            match delete_event(&state.db_pool, id).await {
                Ok(0) => error_response(404, "Event not found"),
                Ok(_) => {
                    info!("Deleted event {}", id);
                    json_response(
                        200,
                        &ApiResponse::success(json!({
                            "message": "Event deleted",
                            "event_id": id.to_string(),
                        })),
                    )
                }
                Err(e) => {
                    error!("Failed to delete event {}: {}", id, e);
                    error_response(500, "Failed to delete event")
                }
            }
        }

        _ => error_response(404, "Not found"),
    }
}

async fn fetch_event(pool: &PgPool, id: Uuid) -> shared::Result<Option<EventRow>> {
    let row = sqlx::query_as(
        r#"
        SELECT e.id, e.title, e.description, e.start_time, e.end_time,
               e.location, e.organizer, e.created_at, e.updated_at,
               COALESCE(
                   array_agg(c.category) FILTER (WHERE c.category IS NOT NULL),
                   ARRAY[]::text[]
               ) AS categories
        FROM events e
        LEFT JOIN event_categories c ON c.event_id = e.id
        WHERE e.id = $1
        GROUP BY e.id
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Insert the event and its category rows in one transaction.
async fn insert_event(pool: &PgPool, new_event: &NewEvent) -> shared::Result<EventRow> {
    let mut tx = pool.begin().await?;

    let (created_at, updated_at): (DateTime<Utc>, DateTime<Utc>) = sqlx::query_as(
        r#"
        INSERT INTO events (id, title, description, start_time, end_time, location, organizer)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        RETURNING created_at, updated_at
        "#,
    )
    .bind(new_event.id)
    .bind(&new_event.title)
    .bind(&new_event.description)
    .bind(new_event.start_time)
    .bind(new_event.end_time)
    .bind(&new_event.location)
    .bind(&new_event.organizer)
    .fetch_one(&mut *tx)
    .await?;

    for category in &new_event.categories {
        sqlx::query("INSERT INTO event_categories (event_id, category) VALUES ($1, $2)")
            .bind(new_event.id)
            .bind(category.as_str())
            .execute(&mut *tx)
            .await?;
    }

    tx.commit().await?;

    Ok(EventRow {
        id: new_event.id,
        title: new_event.title.clone(),
        description: new_event.description.clone(),
        start_time: new_event.start_time,
        end_time: new_event.end_time,
        location: new_event.location.clone(),
        organizer: new_event.organizer.clone(),
        created_at,
        updated_at,
        categories: new_event
            .categories
            .iter()
            .map(|c| c.as_str().to_string())
            .collect(),
    })
}

/// Persist a merged update, replacing the category rows only when a new set
/// was given. Returns `Error::NotFound` when the event vanished between the
/// read and the write.
async fn apply_update(pool: &PgPool, update: &EventUpdate) -> shared::Result<EventRow> {
    let mut tx = pool.begin().await?;

    let timestamps: Option<(DateTime<Utc>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        UPDATE events
        SET title = $2, description = $3, start_time = $4, end_time = $5,
            location = $6, organizer = $7, updated_at = NOW()
        WHERE id = $1
        RETURNING created_at, updated_at
        "#,
    )
    .bind(update.id)
    .bind(&update.title)
    .bind(&update.description)
    .bind(update.start_time)
    .bind(update.end_time)
    .bind(&update.location)
    .bind(&update.organizer)
    .fetch_optional(&mut *tx)
    .await?;

    let (created_at, updated_at) = match timestamps {
        Some(pair) => pair,
        None => return Err(shared::Error::NotFound("Event not found".to_string())),
    };

    let categories = match &update.categories {
        Some(replacement) => {
            sqlx::query("DELETE FROM event_categories WHERE event_id = $1")
                .bind(update.id)
                .execute(&mut *tx)
                .await?;

            for category in replacement {
                sqlx::query("INSERT INTO event_categories (event_id, category) VALUES ($1, $2)")
                    .bind(update.id)
                    .bind(category.as_str())
                    .execute(&mut *tx)
                    .await?;
            }

            replacement.iter().map(|c| c.as_str().to_string()).collect()
        }
        None => update.existing_categories.clone(),
    };

    tx.commit().await?;

    Ok(EventRow {
        id: update.id,
        title: update.title.clone(),
        description: update.description.clone(),
        start_time: update.start_time,
        end_time: update.end_time,
        location: update.location.clone(),
        organizer: update.organizer.clone(),
        created_at,
        updated_at,
        categories,
    })
}

/// Delete an event and its category rows in one transaction, returning how
/// many event rows went away.
async fn delete_event(pool: &PgPool, id: Uuid) -> shared::Result<u64> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM event_categories WHERE event_id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?;

    let deleted = sqlx::query("DELETE FROM events WHERE id = $1")
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

    tx.commit().await?;

    Ok(deleted)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .init();

    let state = Arc::new(AppState::new().await?);

    run(service_fn(move |event| {
        let state = Arc::clone(&state);
        async move {
            match handler(state, event).await {
                Ok(response) => Ok(response),
                Err(e) => {
                    error!("Unhandled error: {}", e);
                    error_response(500, "Internal server error")
                }
            }
        }
    }))
    .await
}
