use crate::models::{Post, User};
use chrono::SecondsFormat;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Body of `POST /posts`.
///
/// Unknown fields such as a client-supplied `id` or `createdAt` are ignored;
/// both are always assigned by the server.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, message = "contents must not be empty"))]
    pub contents: String,
    pub user: User,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: String,
    pub contents: String,
    pub user: User,
    pub created_at: String,
}

impl From<Post> for PostResponse {
    fn from(post: Post) -> Self {
        Self {
            id: post.id.map(|id| id.to_hex()).unwrap_or_default(),
            contents: post.contents,
            user: post.user,
            created_at: post.created_at.to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }
}
