pub mod editing;
pub mod error;
pub mod io;
pub mod models;
pub mod text;

#[cfg(test)]
pub mod tests;

// Re-export key types for easier usage
pub use editing::{compose::*, engine::*, patch::*, store::*};
pub use error::MentionError;
pub use io::*;
pub use models::{config::*, span::*};
pub use text::{Filtered, LengthFilter};
