//! GET /user - the authenticated caller's own record

use hyper::{Response, StatusCode};
use serde::Serialize;

use super::{json_response, BoxBody};
use crate::auth::AuthContext;

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub email: String,
    pub name: String,
    pub authorities: Vec<String>,
}

pub fn handle_user(ctx: &AuthContext) -> Response<BoxBody> {
    json_response(
        StatusCode::OK,
        &UserResponse {
            email: ctx.identity.email.clone(),
            name: ctx.identity.name.clone(),
            authorities: ctx.capabilities.iter().map(|c| c.to_string()).collect(),
        },
    )
}
