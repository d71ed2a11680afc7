//! Session domain module.
//!
//! This module contains all intake-session domain models and the session
//! state machine.
//!
//! # Module Structure
//!
//! - `model`: The session state machine (`IntakeSession`, `OpenQuestion`)
//! - `entry`: Conversation log types (`ConversationEntry`, `UploadedFile`)
//! - `screen`: Screen state (`Screen`)
//! - `progress`: Progress metrics (`Progress`)
//! - `product`: Product context (`ProductContext`)
//! - `draft`: Answer composition (`AnswerDraft`)

mod draft;
mod entry;
mod model;
mod product;
mod progress;
mod screen;

// Re-export public API
pub use draft::AnswerDraft;
pub use entry::{ConversationEntry, UploadedFile};
pub use model::{IntakeSession, OpenQuestion};
pub use product::ProductContext;
pub use progress::Progress;
pub use screen::Screen;
