//! Recipe endpoints.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
};
use recipebox_common::AppResult;
use recipebox_core::CreateRecipeInput;
use recipebox_db::entities::recipe;
use serde::Serialize;

use super::ListQuery;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, created, ok},
};

/// Recipe response.
#[allow(missing_docs)]
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeResponse {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub ingredients: serde_json::Value,
    pub steps: serde_json::Value,
    pub image_url: Option<String>,
    pub created_at: String,
    pub updated_at: Option<String>,
}

impl From<recipe::Model> for RecipeResponse {
    fn from(r: recipe::Model) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            title: r.title,
            description: r.description,
            ingredients: r.ingredients,
            steps: r.steps,
            image_url: r.image_url,
            created_at: r.created_at.to_rfc3339(),
            updated_at: r.updated_at.map(|t| t.to_rfc3339()),
        }
    }
}

/// Post a recipe.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateRecipeInput>,
) -> AppResult<Response> {
    let recipe = state.recipe_service.create(user.id, input).await?;
    Ok(created(RecipeResponse::from(recipe)))
}

/// Show a recipe.
async fn show(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<ApiResponse<RecipeResponse>> {
    let recipe = state.recipe_service.get(id).await?;
    Ok(ApiResponse::ok(recipe.into()))
}

/// Delete a recipe.
async fn delete(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<StatusCode> {
    state.recipe_service.delete(&user, id).await?;
    Ok(ok())
}

/// Recipes posted by a user.
async fn by_user(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<RecipeResponse>>> {
    let recipes = state
        .recipe_service
        .list_by_user(user_id, query.clamped_limit(), query.until_id)
        .await?;

    Ok(ApiResponse::ok(recipes.into_iter().map(Into::into).collect()))
}

/// Recipe CRUD and per-user recipe listing.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/recipes", post(create))
        .route("/recipes/{id}", get(show).delete(delete))
        .route("/users/{id}/recipes", get(by_user))
}
