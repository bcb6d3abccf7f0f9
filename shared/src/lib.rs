//! Shared library for CampusCal Lambda functions.
//!
//! This crate provides the calendar domain logic, common types, and clients used across all Lambda functions.

pub mod auth;
pub mod config;
pub mod dates;
pub mod db;
pub mod error;
pub mod http;
pub mod models;

pub use config::Config;
pub use dates::{expand_segments, is_overnight, CalendarSegment, SegmentInput, WallTime};
pub use db::{create_pool, get_database_credentials, get_secret, DatabaseCredentials};
pub use error::{Error, Result};
pub use http::{error_response, json_response, parse_json_body, ApiResponse};
pub use models::{EventCategory, EventResponse, EventRow};
