//! Authentication endpoints.

use axum::{Json, Router, extract::State, response::Response, routing::post};
use recipebox_common::AppResult;
use recipebox_core::{SigninInput, SignupInput};
use serde::{Deserialize, Serialize};

use crate::{
    middleware::AppState,
    response::{ApiResponse, created},
};

/// Signup request.
#[allow(missing_docs)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub email: String,
    pub name: String,
    pub password: String,
}

/// Signin request.
#[allow(missing_docs)]
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SigninRequest {
    pub email: String,
    pub password: String,
}

/// Credentials issued on signup and signin.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub id: i64,
    pub name: String,
    pub token: String,
}

/// Create a new user account.
async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> AppResult<Response> {
    let user = state
        .user_service
        .signup(SignupInput {
            email: req.email,
            name: req.name,
            password: req.password,
        })
        .await?;

    Ok(created(TokenResponse {
        id: user.id,
        name: user.name,
        token: user.token.unwrap_or_default(),
    }))
}

/// Sign in to an existing account.
async fn signin(
    State(state): State<AppState>,
    Json(req): Json<SigninRequest>,
) -> AppResult<ApiResponse<TokenResponse>> {
    let user = state
        .user_service
        .signin(SigninInput {
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok(ApiResponse::ok(TokenResponse {
        id: user.id,
        name: user.name,
        token: user.token.unwrap_or_default(),
    }))
}

/// Account signup and signin.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
}
