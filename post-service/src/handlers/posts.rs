use crate::dtos::{CreatePostRequest, PostResponse};
use crate::models::Post;
use crate::services::{record_post_created, StoreError};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use service_core::error::AppError;
use validator::Validate;

pub async fn list_posts(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let posts = state.store.find_all().await.map_err(|e| match e {
        StoreError::Decode(err) => {
            AppError::DatabaseError("Failed to decode posts".to_string(), err)
        }
        other => AppError::DatabaseError("Failed to fetch posts".to_string(), other.into()),
    })?;

    let posts: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(posts))
}

pub async fn create_post(
    State(state): State<AppState>,
    payload: Result<Json<CreatePostRequest>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(request) = payload.map_err(|rejection| {
        AppError::BadRequest(
            "Invalid request body".to_string(),
            Some(rejection.body_text()),
        )
    })?;
    request.validate()?;

    let mut post = Post::new(request.contents, request.user);
    let id = state
        .store
        .insert_one(&mut post)
        .await
        .map_err(|e| AppError::DatabaseError("Failed to create post".to_string(), e.into()))?;

    record_post_created();
    tracing::info!(post_id = %id, "Post created");

    Ok((StatusCode::CREATED, Json(PostResponse::from(post))))
}
