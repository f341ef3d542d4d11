//! HTTP routes for authentication
//!
//! - POST /auth/login    - Authenticate and get a token
//! - POST /auth/register - Create an account and get a token
//!
//! Both routes are public; every other route goes through the access policy.

use bytes::Bytes;
use hyper::body::Body;
use hyper::{Request, Response, StatusCode};
use serde::Deserialize;

use super::{json_response, parse_json_body, BodyError, BoxBody};
use crate::auth::AuthFlow;
use crate::types::Result;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

/// POST /auth/login
pub async fn handle_login<B>(req: Request<B>, flow: &AuthFlow) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let body: LoginRequest = parse_json_body(req).await?;
    let response = flow.login(&body.email, &body.password).await?;
    Ok(json_response(StatusCode::OK, &response))
}

/// POST /auth/register
pub async fn handle_register<B>(req: Request<B>, flow: &AuthFlow) -> Result<Response<BoxBody>>
where
    B: Body<Data = Bytes>,
    B::Error: Into<BodyError>,
{
    let body: RegisterRequest = parse_json_body(req).await?;
    let response = flow
        .register(&body.email, &body.password, &body.name)
        .await?;
    Ok(json_response(StatusCode::OK, &response))
}
