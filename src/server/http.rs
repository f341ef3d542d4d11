//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. Every request passes
//! through the same pipeline: CORS preflight, authentication gate, access
//! policy, then the route handler.

use bytes::Bytes;
use hyper::body::Body;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_METHOD,
};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{debug, error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::auth::{
    is_request_allowed, required_access, Argon2Verifier, AuthFlow, AuthGate, CredentialVerifier,
    TokenService,
};
use crate::config::Args;
use crate::routes::{self, empty_response, BodyError, BoxBody};
use crate::store::UserStore;
use crate::types::{GatewayError, Result};

/// Shared application state
pub struct AppState {
    pub listen: SocketAddr,
    pub gate: AuthGate,
    pub flow: AuthFlow,
    /// Value of Access-Control-Allow-Origin
    pub cors_origin: HeaderValue,
}

impl AppState {
    /// Build state from configuration and a user store
    pub fn new(args: &Args, users: Arc<dyn UserStore>) -> Result<Self> {
        let tokens = TokenService::new(&args.jwt_secret()?)?;
        Self::from_parts(
            args.listen,
            tokens,
            users,
            Arc::new(Argon2Verifier),
            &args.cors_origin,
        )
    }

    pub fn from_parts(
        listen: SocketAddr,
        tokens: TokenService,
        users: Arc<dyn UserStore>,
        verifier: Arc<dyn CredentialVerifier>,
        cors_origin: &str,
    ) -> Result<Self> {
        let cors_origin = HeaderValue::from_str(cors_origin)
            .map_err(|e| GatewayError::Config(format!("Invalid CORS origin: {}", e)))?;

        Ok(Self {
            listen,
            gate: AuthGate::new(tokens.clone(), Arc::clone(&users)),
            flow: AuthFlow::new(users, verifier, tokens),
            cors_origin,
        })
    }
}

/// Start the HTTP server; returns on Ctrl-C
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.listen).await?;
    info!("Listening on {}", state.listen);

    loop {
        let accepted = tokio::select! {
            accepted = listener.accept() => accepted,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                return Ok(());
            }
        };

        match accepted {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { Ok::<_, hyper::Error>(handle_request(state, addr, req).await) }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Handle one request end to end
pub async fn handle_request<B>(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<B>,
) -> Response<BoxBody>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let span = info_span!(
        "request",
        id = %Uuid::new_v4(),
        peer = %addr,
        method = %req.method(),
        path = %req.uri().path(),
    );

    async move {
        let mut response = match route_request(&state, req).await {
            Ok(response) => response,
            Err(err) => routes::error_response(&err),
        };
        response
            .headers_mut()
            .insert(ACCESS_CONTROL_ALLOW_ORIGIN, state.cors_origin.clone());
        info!(status = response.status().as_u16(), "request completed");
        response
    }
    .instrument(span)
    .await
}

async fn route_request<B>(state: &AppState, req: Request<B>) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    // Only a real preflight skips the gate; a bare OPTIONS is policed like any other method
    if method == Method::OPTIONS && req.headers().contains_key(ACCESS_CONTROL_REQUEST_METHOD) {
        return Ok(preflight_response());
    }

    // The context lives only as long as this request
    let auth = state.gate.authenticate(req.headers()).await?;
    debug!(status = auth.label(), "authentication gate");

    if !is_request_allowed(required_access(&method, &path), auth.is_authenticated()) {
        return Err(GatewayError::AccessDenied);
    }

    match (&method, path.as_str()) {
        (&Method::POST, "/auth/login") => routes::handle_login(req, &state.flow).await,
        (&Method::POST, "/auth/register") => routes::handle_register(req, &state.flow).await,
        (&Method::GET, "/user") => match auth.context() {
            Some(ctx) => Ok(routes::handle_user(ctx)),
            None => {
                warn!("Protected route reached without a context");
                Err(GatewayError::AccessDenied)
            }
        },
        _ => Ok(routes::not_found_response(&path)),
    }
}

/// CORS preflight response
fn preflight_response() -> Response<BoxBody> {
    let mut response = empty_response(StatusCode::OK);
    let headers = response.headers_mut();
    headers.insert(
        ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static("GET, POST, PUT, DELETE"),
    );
    headers.insert(
        ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static("Content-Type, Authorization"),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryUserStore;
    use http_body_util::{BodyExt, Full};
    use hyper::body::Frame;
    use hyper::header::AUTHORIZATION;
    use serde_json::Value;
    use std::convert::Infallible;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use std::time::Duration;

    const SECRET: &str = "test-secret-that-is-at-least-32-characters-long";

    fn test_state() -> (Arc<AppState>, Arc<MemoryUserStore>) {
        let store = Arc::new(MemoryUserStore::new());
        let state = AppState::from_parts(
            "127.0.0.1:0".parse().unwrap(),
            TokenService::new(SECRET).unwrap(),
            store.clone(),
            Arc::new(Argon2Verifier),
            "http://localhost:4200",
        )
        .unwrap();
        (Arc::new(state), store)
    }

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    fn post_json(path: &str, body: Value) -> Request<Full<Bytes>> {
        Request::builder()
            .method(Method::POST)
            .uri(path)
            .header("Content-Type", "application/json")
            .body(Full::new(Bytes::from(body.to_string())))
            .unwrap()
    }

    fn get(path: &str, auth: Option<&str>) -> Request<Full<Bytes>> {
        let mut builder = Request::builder().method(Method::GET).uri(path);
        if let Some(value) = auth {
            builder = builder.header(AUTHORIZATION, value);
        }
        builder.body(Full::new(Bytes::new())).unwrap()
    }

    async fn send(state: &Arc<AppState>, req: Request<Full<Bytes>>) -> (StatusCode, Bytes) {
        let response = handle_request(Arc::clone(state), peer(), req).await;
        let status = response.status();
        let body = response.into_body().collect().await.unwrap().to_bytes();
        (status, body)
    }

    async fn register_alice(state: &Arc<AppState>) -> String {
        let (status, body) = send(
            state,
            post_json(
                "/auth/register",
                serde_json::json!({ "name": "Alice", "email": "a@x.com", "password": "pw123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["name"], "Alice");
        json["token"].as_str().unwrap().to_string()
    }

    #[tokio::test]
    async fn test_register_then_access_protected_route() {
        let (state, _) = test_state();
        let token = register_alice(&state).await;

        let (status, body) = send(&state, get("/user", Some(&format!("Bearer {}", token)))).await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["email"], "a@x.com");
        assert_eq!(json["name"], "Alice");
        assert_eq!(json["authorities"], serde_json::json!(["ROLE_USER"]));
    }

    #[tokio::test]
    async fn test_garbage_token_denied() {
        let (state, _) = test_state();
        register_alice(&state).await;

        let (status, body) = send(&state, get("/user", Some("Bearer garbage"))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_missing_header_denied() {
        let (state, _) = test_state();
        let (status, _) = send(&state, get("/user", None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_route_requires_authentication() {
        let (state, _) = test_state();
        let (status, _) = send(&state, get("/anything", None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let token = register_alice(&state).await;
        let (status, _) = send(&state, get("/anything", Some(&format!("Bearer {}", token)))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (state, _) = test_state();
        register_alice(&state).await;

        let (status, body) = send(
            &state,
            post_json(
                "/auth/login",
                serde_json::json!({ "email": "a@x.com", "password": "wrongpw" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_login_success() {
        let (state, _) = test_state();
        register_alice(&state).await;

        let (status, body) = send(
            &state,
            post_json(
                "/auth/login",
                serde_json::json!({ "email": "a@x.com", "password": "pw123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["name"], "Alice");
        assert!(json["token"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (state, _) = test_state();
        let (status, _) = send(
            &state,
            post_json(
                "/auth/login",
                serde_json::json!({ "email": "nobody@x.com", "password": "pw123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_duplicate_register() {
        let (state, _) = test_state();
        register_alice(&state).await;

        let (status, body) = send(
            &state,
            post_json(
                "/auth/register",
                serde_json::json!({ "name": "Alice", "email": "a@x.com", "password": "pw456" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_json() {
        let (state, _) = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth/login")
            .body(Full::new(Bytes::from("not json")))
            .unwrap();
        let (status, body) = send(&state, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_oversized_body_rejected() {
        let (state, _) = test_state();
        let padding = "x".repeat(routes::MAX_BODY_BYTES);
        let (status, body) = send(
            &state,
            post_json(
                "/auth/login",
                serde_json::json!({ "email": "a@x.com", "password": padding }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    /// Yields one large chunk, then never finishes
    struct EndlessBody {
        sent: bool,
    }

    impl Body for EndlessBody {
        type Data = Bytes;
        type Error = Infallible;

        fn poll_frame(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
        ) -> Poll<Option<std::result::Result<Frame<Bytes>, Infallible>>> {
            if self.sent {
                return Poll::Pending;
            }
            self.sent = true;
            Poll::Ready(Some(Ok(Frame::data(Bytes::from(vec![b'x'; 1024 * 1024])))))
        }
    }

    #[tokio::test]
    async fn test_body_read_stops_at_limit() {
        let (state, _) = test_state();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/auth/register")
            .body(EndlessBody { sent: false })
            .unwrap();

        let response = tokio::time::timeout(
            Duration::from_secs(2),
            handle_request(Arc::clone(&state), peer(), req),
        )
        .await
        .expect("oversized body was read to the end");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_login_empty_password_is_bad_credentials() {
        let (state, _) = test_state();
        register_alice(&state).await;

        let (status, body) = send(
            &state,
            post_json(
                "/auth/login",
                serde_json::json!({ "email": "a@x.com", "password": "" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_register_empty_name_has_no_body() {
        let (state, _) = test_state();
        let (status, body) = send(
            &state,
            post_json(
                "/auth/register",
                serde_json::json!({ "name": "", "email": "a@x.com", "password": "pw123" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_deleted_user_token_is_internal_error() {
        let (state, store) = test_state();
        let token = register_alice(&state).await;
        store.remove("a@x.com");

        let (status, body) = send(&state, get("/user", Some(&format!("Bearer {}", token)))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "Internal Server Error");
    }

    #[tokio::test]
    async fn test_cors_headers() {
        let (state, _) = test_state();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/user")
            .header(ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handle_request(Arc::clone(&state), peer(), req).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
            "http://localhost:4200"
        );
        assert_eq!(
            response.headers().get(ACCESS_CONTROL_ALLOW_METHODS).unwrap(),
            "GET, POST, PUT, DELETE"
        );
    }

    #[tokio::test]
    async fn test_bare_options_goes_through_gate() {
        let (state, _) = test_state();
        let req = Request::builder()
            .method(Method::OPTIONS)
            .uri("/user")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let response = handle_request(Arc::clone(&state), peer(), req).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(ACCESS_CONTROL_ALLOW_METHODS).is_none());
    }

    #[test]
    fn test_invalid_cors_origin() {
        let result = AppState::from_parts(
            "127.0.0.1:0".parse().unwrap(),
            TokenService::new(SECRET).unwrap(),
            Arc::new(MemoryUserStore::new()),
            Arc::new(Argon2Verifier),
            "bad\norigin",
        );
        assert!(matches!(result, Err(GatewayError::Config(_))));
    }
}
