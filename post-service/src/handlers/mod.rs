pub mod health;
pub mod posts;
pub mod status;

pub use health::{health_check, metrics_endpoint, readiness_check};
pub use posts::{create_post, list_posts};
pub use status::{not_found, root};
