//! One-shot user-visible messages carried across a redirect in a short-lived
//! cookie. Base64 keeps arbitrary message text cookie-safe.

use axum::http::HeaderMap;
use axum::http::header;
use base64::Engine;
use base64::engine::general_purpose::STANDARD as B64;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct Flash {
    pub category: String,
    pub message: String,
}

/// Set-Cookie value carrying a flash for the next page render.
pub fn set(category: &str, message: &str) -> String {
    let encoded = B64.encode(format!("{category}\n{message}"));
    format!("flash={encoded}; Path=/; Max-Age=60")
}

/// Set-Cookie value that clears the flash after it has been shown.
pub fn clear() -> String {
    "flash=; Path=/; Max-Age=0".to_string()
}

pub fn take(headers: &HeaderMap) -> Option<Flash> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    let encoded = cookie_header
        .split(';')
        .find_map(|c| c.trim().strip_prefix("flash="))?;
    let decoded = B64.decode(encoded).ok()?;
    let text = String::from_utf8(decoded).ok()?;
    let (category, message) = text.split_once('\n')?;
    Some(Flash {
        category: category.to_string(),
        message: message.to_string(),
    })
}
