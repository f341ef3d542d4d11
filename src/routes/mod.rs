//! HTTP routes and response helpers

pub mod auth_routes;
pub mod user;

use bytes::Bytes;
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, error, info};

use crate::types::GatewayError;

pub use auth_routes::{handle_login, handle_register, LoginRequest, RegisterRequest};
pub use user::{handle_user, UserResponse};

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

/// Error type request bodies must convert into
pub type BodyError = Box<dyn std::error::Error + Send + Sync>;

/// Largest accepted JSON request body
pub const MAX_BODY_BYTES: usize = 10240;

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    full_body(Bytes::new())
}

pub fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());

    let mut response = Response::new(full_body(json));
    *response.status_mut() = status;
    response.headers_mut().insert(
        hyper::header::CONTENT_TYPE,
        hyper::header::HeaderValue::from_static("application/json"),
    );
    response
}

pub fn empty_response(status: StatusCode) -> Response<BoxBody> {
    let mut response = Response::new(empty_body());
    *response.status_mut() = status;
    response
}

pub fn not_found_response(path: &str) -> Response<BoxBody> {
    json_response(
        StatusCode::NOT_FOUND,
        &serde_json::json!({ "error": "Not Found", "path": path }),
    )
}

/// Turn an error into a response, logging it according to its kind
pub fn error_response(err: &GatewayError) -> Response<BoxBody> {
    if err.is_fault() {
        error!("Request failed: {}", err);
    } else if matches!(err, GatewayError::AccessDenied) {
        debug!("Access denied");
    } else {
        info!("Request rejected: {}", err);
    }

    let status = err.status_code();
    match err.client_body() {
        Some(body) => json_response(status, &body),
        None => empty_response(status),
    }
}

/// Read and deserialize a JSON request body
///
/// Reading stops as soon as the body exceeds `MAX_BODY_BYTES`.
pub async fn parse_json_body<T, B>(req: Request<B>) -> Result<T, GatewayError>
where
    T: DeserializeOwned,
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let body = Limited::new(req.into_body(), MAX_BODY_BYTES)
        .collect()
        .await
        .map_err(|e| {
            if e.downcast_ref::<LengthLimitError>().is_some() {
                GatewayError::BadRequest("Request body too large".into())
            } else {
                GatewayError::BadRequest(format!("Failed to read body: {}", e))
            }
        })?;

    Ok(serde_json::from_slice(&body.to_bytes())?)
}
