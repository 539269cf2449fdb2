//! CORS layer configuration.

use std::time::Duration;

use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::CorsLayer;

use kydohub_core::config::app::CorsConfig;
use kydohub_core::config::cookies::CookieConfig;

use super::request_id::REQUEST_ID_HEADER;

/// Builds a credentialed CORS layer for the configured browser origins.
pub fn build_cors_layer(config: &CorsConfig, cookies: &CookieConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter(|o| o.as_str() != "*")
        .filter_map(|o| o.parse().ok())
        .collect();

    let mut headers = vec![
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        HeaderName::from_static(REQUEST_ID_HEADER),
        HeaderName::from_static("x-client"),
    ];
    if let Ok(csrf) = HeaderName::try_from(cookies.csrf_header.as_str()) {
        headers.push(csrf);
    }

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(headers)
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .allow_credentials(true)
        .max_age(Duration::from_secs(config.max_age_seconds))
}
