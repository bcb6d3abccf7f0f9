//! Shared-secret authentication for the admin API.

use lambda_http::Request;

use crate::{Error, Result};

/// Extract the token from the Authorization header.
///
/// The `Bearer ` scheme prefix is optional; clients that send the raw
/// secret are accepted as well.
pub fn bearer_token(event: &Request) -> Option<&str> {
    let header = event
        .headers()
        .get("authorization")
        .and_then(|value| value.to_str().ok())?;

    Some(header.strip_prefix("Bearer ").unwrap_or(header))
}

/// Check the admin secret carried in the Authorization header.
pub fn require_admin(event: &Request, expected: &str) -> Result<()> {
    match bearer_token(event) {
        Some(token) if token == expected => Ok(()),
        _ => Err(Error::Auth("Unauthorized".to_string())),
    }
}
