//! Conversion of mentions to and from their exchange and persisted forms.
//!
//! - **`exchange`**: the canonical string sent to a backend, every mention
//!   replaced by `@<user_id> `
//! - **`persisted`**: the flat per-span record stored alongside a draft

pub mod exchange;
pub mod persisted;

pub use exchange::{EXCHANGE_TRIGGER, parse_exchange, serialize};
pub use persisted::{PersistedSpan, from_persisted, records_from_json, records_to_json, to_persisted};

#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("Persisted mentions are not a JSON array: {0}")]
    Json(#[from] serde_json::Error),
}
