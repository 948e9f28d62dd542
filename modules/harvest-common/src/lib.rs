pub mod config;
pub mod error;
pub mod normalize;
pub mod types;

pub use config::{Config, PollPolicy, StorageConfig};
pub use error::HarvestError;
pub use normalize::{normalize_item, normalize_items, CommentField, FIELD_ALIASES};
pub use types::*;
