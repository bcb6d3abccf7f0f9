//! Public Events Lambda - Read-only event feed for the calendar frontend.
//!
//! Endpoints:
//! - GET /events - List upcoming events (past 30 days onward)
//!   - ?categories=a,b - Keep only events tagged with at least one of the names
//!   - ?segments=true - Return calendar segments instead of raw events
//!   - ?tz=Area/City - Timezone for segment day boundaries

use chrono::{Duration, Utc};
use chrono_tz::Tz;
use lambda_http::{run, service_fn, Body, Error, Request, RequestExt, Response};
use shared::dates::{expand_segments, SegmentInput};
use shared::http::{error_response, json_response, ApiResponse};
use shared::models::{EventResponse, EventRow};
use shared::{db, Config};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// How far back listed events may start.
const EVENT_LOOKBACK_DAYS: i64 = 30;

/// Application state
struct AppState {
    config: Config,
    db_pool: PgPool,
}

impl AppState {
    async fn new() -> Result<Self, Error> {
        let config = Config::from_env()?;
        let db_pool = db::create_pool(&config).await?;

        Ok(Self { config, db_pool })
    }
}

/// Split the raw `categories` query value into filter tokens. Empty tokens
/// are dropped, and an absent or all-empty value means no filtering.
fn parse_category_filter(raw: Option<&str>) -> Option<Vec<String>> {
    let tokens: Vec<String> = raw?
        .split(',')
        .filter(|token| !token.is_empty())
        .map(str::to_string)
        .collect();

    if tokens.is_empty() {
        None
    } else {
        Some(tokens)
    }
}

async fn handler(state: Arc<AppState>, event: Request) -> Result<Response<Body>, Error> {
    let raw_path = event.uri().path();
    // Strip /api stage prefix if present (API Gateway REST API includes stage in path)
    let path = raw_path.strip_prefix("/api").unwrap_or(raw_path);
    let method = event.method().as_str();

    info!("Received request: method={}, path={} (raw: {})", method, path, raw_path);

    match (method, path) {
        // List events
        ("GET", "/events") => {
            let params = event.query_string_parameters();
            let cutoff = Utc::now() - Duration::days(EVENT_LOOKBACK_DAYS);

            let rows: Vec<EventRow> = match sqlx::query_as(
                r#"
                SELECT e.id, e.title, e.description, e.start_time, e.end_time,
                       e.location, e.organizer, e.created_at, e.updated_at,
                       COALESCE(
                           array_agg(c.category) FILTER (WHERE c.category IS NOT NULL),
                           ARRAY[]::text[]
                       ) AS categories
                FROM events e
                LEFT JOIN event_categories c ON c.event_id = e.id
                WHERE e.start_time >= $1
                GROUP BY e.id
                ORDER BY e.start_time ASC
                "#,
            )
            .bind(cutoff)
            .fetch_all(&state.db_pool)
            .await
            {
                Ok(rows) => rows,
                Err(e) => {
                    error!("Failed to fetch events: {}", e);
                    return error_response(500, "Failed to fetch events");
                }
            };

            let rows = match parse_category_filter(params.first("categories")) {
                Some(wanted) => rows
                    .into_iter()
                    .filter(|row| row.categories.iter().any(|c| wanted.contains(c)))
                    .collect(),
                None => rows,
            };

            let want_segments = params.first("segments").map(|v| v == "true").unwrap_or(false);
            if !want_segments {
                let events: Vec<EventResponse> =
                    rows.into_iter().map(EventResponse::from).collect();
                info!("Returning {} events", events.len());
                return json_response(200, &ApiResponse::success(events));
            }

            let tz = match params.first("tz") {
                Some(name) => match name.parse::<Tz>() {
                    Ok(tz) => tz,
                    Err(_) => {
                        return error_response(400, format!("Invalid timezone: {}", name));
                    }
                },
                None => state.config.calendar_timezone,
            };

            let mut segments = Vec::new();
            for row in rows {
                let start = row.start_time;
                let end = row.end_time;
                let id = row.id.to_string();
                let title = row.title.clone();
                let input = SegmentInput {
                    id: &id,
                    title: &title,
                    start,
                    end,
                };
                segments.extend(expand_segments(input, EventResponse::from(row), tz));
            }

            info!("Returning {} calendar segments", segments.len());
            json_response(200, &ApiResponse::success(segments))
        }

        _ => error_response(404, "Not found"),
    }
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
