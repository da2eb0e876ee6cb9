pub mod posts;

pub use posts::{CreatePostRequest, PostResponse};
