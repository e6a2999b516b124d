//! The describe endpoint: multipart image in, scene description out

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::{IntoResponse, Response};

use super::ApiState;
use crate::Error;
use crate::ingest;

/// Handle a describe request
///
/// Per-request state machine, terminal on the first response write:
/// preflight short-circuit, method gate, credential gate, ingest, inference,
/// error mapping.
pub async fn describe(State(state): State<Arc<ApiState>>, request: Request) -> Response {
    // Preflight is its own branch, evaluated before the POST-only gate so
    // OPTIONS never dead-ends in a 405.
    if request.method() == Method::OPTIONS {
        return preflight();
    }

    if request.method() != Method::POST {
        return text_response(
            StatusCode::METHOD_NOT_ALLOWED,
            "Method Not Allowed. Use POST.".to_string(),
        );
    }

    // Credential gate comes before any body I/O so an unconfigured server
    // never wastes parsing work.
    let Some(describer) = state.describer.clone() else {
        return text_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Server error: missing GEMINI_API_KEY environment variable.".to_string(),
        );
    };

    let content_type = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(ToOwned::to_owned);

    let body = request.into_body().into_data_stream();

    let image = match ingest::ingest(content_type.as_deref(), body, state.max_image_bytes).await
    {
        Ok(Some(image)) => image,
        Ok(None) => {
            return text_response(
                StatusCode::BAD_REQUEST,
                "Bad Request: No image uploaded. Please include an \"image\" field in the form data."
                    .to_string(),
            );
        }
        Err(e) => return error_response(&e),
    };

    tracing::debug!(bytes = image.len(), mime = %image.mime_type, "image ingested");

    match describer.describe(&image).await {
        Ok(text) => text_response(StatusCode::OK, text),
        Err(e) => error_response(&e),
    }
}

/// Map a pipeline error to its HTTP status
fn error_response(error: &Error) -> Response {
    let (status, body) = match error {
        Error::RequestFormat(msg) => (StatusCode::BAD_REQUEST, format!("Bad Request: {msg}")),
        Error::PayloadTooLarge(limit) => (
            StatusCode::PAYLOAD_TOO_LARGE,
            format!("Payload Too Large: image exceeds the {limit} byte limit."),
        ),
        Error::Auth(_) => (
            StatusCode::UNAUTHORIZED,
            "Unauthorized: Invalid API key.".to_string(),
        ),
        e => (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Server error: {e}"),
        ),
    };

    tracing::warn!(status = %status, error = %error, "describe request failed");
    text_response(status, body)
}

/// Plain-text response carrying the open allow-origin header
fn text_response(status: StatusCode, body: String) -> Response {
    (
        status,
        [(header::ACCESS_CONTROL_ALLOW_ORIGIN, "*")],
        body,
    )
        .into_response()
}

/// CORS preflight response
fn preflight() -> Response {
    const HEADERS: [(HeaderName, &str); 4] = [
        (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
        (header::ACCESS_CONTROL_ALLOW_METHODS, "GET"),
        (header::ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type"),
        (header::ACCESS_CONTROL_MAX_AGE, "3600"),
    ];

    (StatusCode::NO_CONTENT, HEADERS).into_response()
}
