pub mod database;
pub mod metrics;
pub mod mock;
pub mod store;

pub use database::{MongoDb, POSTS_COLLECTION};
pub use self::metrics::{get_metrics, init_metrics, record_post_created};
pub use mock::MockPostStore;
pub use store::{PostStore, StoreError};
