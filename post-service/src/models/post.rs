use chrono::{DateTime, Utc};
use mongodb::bson::{oid::ObjectId, DateTime as BsonDateTime};
use serde::{Deserialize, Serialize};

/// Author metadata embedded in every post.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub name: String,
    pub platform: String,
    #[serde(default)]
    pub is_admin: bool,
}

/// A post as stored in the `posts` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Post {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub contents: String,
    pub user: User,
    #[serde(
        rename = "createdAt",
        with = "mongodb::bson::serde_helpers::chrono_datetime_as_bson_datetime"
    )]
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// An unsaved post stamped with the current time.
    ///
    /// The timestamp is truncated to BSON's millisecond precision so the value
    /// handed back to the caller is exactly the one that gets stored. It is
    /// read from the wall clock, so ordering across posts is not monotonic.
    pub fn new(contents: String, user: User) -> Self {
        Self {
            id: None,
            contents,
            user,
            created_at: BsonDateTime::now().to_chrono(),
        }
    }
}
