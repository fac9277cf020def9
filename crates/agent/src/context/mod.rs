//! Context assembly for one turn.
//!
//! | Part | Source | Trim strategy |
//! |------|--------|---------------|
//! | System prompt | built-in instructions + session context | never trimmed |
//! | History | caller-supplied prior messages | oldest dropped beyond the window |
//! | User turn | attachments + message text | unreadable attachments skipped |

pub mod assembler;
pub mod history;

pub use assembler::{AssembledTurn, MessageAssembler, UNREADABLE_TURN_NOTE, wrap_attachment_text};
pub use history::window;
