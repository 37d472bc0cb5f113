//! Command-driven toolbar state and block-type toggles for structured text
//! editors.
//!
//! The crate sits between a user-facing control strip and a block-structured
//! document editor. It keeps a small set of indicator flags (bold, italic,
//! underline, strikethrough, undo/redo availability) synchronized with the
//! editor's selection and history, and implements the block-type toggle
//! operations: heading levels, paragraph, ordered and unordered lists.
//!
//! The pieces, bottom up:
//!
//! - [`subscription::Teardown`]: idempotent disposal tokens for listener and
//!   command registrations, mergeable into one.
//! - [`command`]: command identities, typed payloads and the priority-ordered
//!   command bus with short-circuit dispatch.
//! - [`document`]: the keyed block tree (paragraphs, headings, lists) with
//!   formatted text spans.
//! - [`editor`]: the transactional editor shell with update listeners,
//!   snapshot history and the built-in command handlers, plus the selection
//!   model and readers.
//! - [`toolbar`]: the projection of editor state into the indicator flags and
//!   the toggle actions themselves.

pub mod command;
pub mod document;
pub mod editor;
pub mod error;
pub mod subscription;
pub mod toolbar;

pub use command::{
    CommandBus, CommandHandler, CommandId, CommandPayload, PRIORITY_CRITICAL, PRIORITY_EDITOR,
    PRIORITY_HIGH, PRIORITY_LOW, PRIORITY_NORMAL,
};
pub use document::{
    Block, BlockKind, Document, FormatSet, HeadingLevel, ListItem, ListKind, NodeKey, Span,
    TextFormat,
};
pub use editor::selection::{NodeSelection, Point, RangeSelection, Selection};
pub use editor::{Editor, EditorState, UpdateListener};
pub use error::EditorError;
pub use subscription::Teardown;
pub use toolbar::Toolbar;
