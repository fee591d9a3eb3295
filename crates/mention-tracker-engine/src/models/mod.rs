pub mod config;
pub mod span;

pub use config::MentionConfig;
pub use span::{MentionState, Span, UserId};
