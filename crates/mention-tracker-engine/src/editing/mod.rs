/*!
 * # Mention Editing Core
 *
 * Tracks which ranges of a host-owned text buffer are mentions of users and
 * keeps them consistent while the user types, selects and deletes.
 *
 * ## Architecture Overview
 *
 * ### 1. The Host Owns the Text
 * - The engine never holds the buffer; it only tracks **spans** over it
 * - Every edit is reported as a before-edit / after-edit / commit triple
 * - Offsets are UTF-16 code units, the unit text widgets report positions in
 *
 * ### 2. Spans Are Atomic
 * - Edits before a span shift it, edits that swallow it remove it
 * - Carets never land inside a span and selections never cut one
 * - Backspace at a span's end marks it, a second backspace deletes all of it
 *
 * ### 3. One Façade
 * - **`MentionEngine`** sequences the components and notifies a
 *   **`MentionObserver`** whenever highlights need repainting
 * - **`ComposeBox`** is a minimal host that owns a `String` and drives the
 *   engine the way a text widget would
 *
 * ## Module Structure
 *
 * - **`store`**: `SpanStore`, the ordered set of spans and its invariants
 * - **`adjust`**: offset adjustment of spans around an edit
 * - **`selection`**: selection correction around spans
 * - **`deletion`**: the Normal / Marked / Clear state machine
 * - **`engine`**: the `MentionEngine` façade
 * - **`compose`**: the `ComposeBox` reference host
 * - **`patch`**: values handed back to the host
 *
 * ## Usage Pattern
 *
 * ```rust
 * use mention_tracker_engine::{ComposeBox, MentionConfig};
 *
 * let mut compose = ComposeBox::new(MentionConfig::default());
 * compose.type_text("Hi ").unwrap();
 * compose.insert_mention(42, "alice").unwrap();
 * compose.type_text("how are you").unwrap();
 * assert_eq!(compose.text(), "Hi @alice how are you");
 *
 * // first backspace after the mention only marks it...
 * compose.select(10, 10);
 * compose.backspace().unwrap();
 * assert_eq!(compose.text(), "Hi @alice how are you");
 *
 * // ...the second removes it whole
 * compose.backspace().unwrap();
 * assert_eq!(compose.text(), "Hi how are you");
 * assert!(compose.engine().store().is_empty());
 * ```
 */

pub mod adjust;
pub mod compose;
pub mod deletion;
pub mod engine;
pub mod patch;
pub mod selection;
pub mod store;

pub use adjust::{Adjustment, EditDescriptor, EditKind};
pub use compose::ComposeBox;
pub use engine::{MentionEngine, MentionObserver};
pub use patch::{BackspaceOutcome, Highlight, HighlightKind, LoadReport, MentionInsertion, SkippedSpan};
pub use selection::correct_selection;
pub use store::SpanStore;
