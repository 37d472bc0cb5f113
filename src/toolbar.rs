//! Toolbar state projection and block-type toggles.
//!
//! A [`Toolbar`] mirrors the editor's selection and history state into six
//! boolean indicator flags, and exposes the toggle actions a control strip
//! wires its buttons to. Attaching registers one update listener and three
//! low-priority command handlers, all merged into a single teardown; the
//! flags never outlive the toolbar and re-attaching never leaks a duplicate
//! registration.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::command::{CommandId, CommandPayload, PRIORITY_LOW};
use crate::document::{HeadingLevel, ListKind, NodeKey, TextFormat};
use crate::editor::selection::{has_format, selected_blocks, top_level_block, Selection};
use crate::editor::structure::{replace_block_with_paragraph, set_blocks_type, BlockTarget};
use crate::editor::{Editor, EditorState};
use crate::error::EditorError;
use crate::subscription::Teardown;

#[derive(Default)]
struct Flags {
    can_undo: Cell<bool>,
    can_redo: Cell<bool>,
    bold: Cell<bool>,
    italic: Cell<bool>,
    underline: Cell<bool>,
    strikethrough: Cell<bool>,
}

/// The toolbar engine: six projected indicator flags plus the toggle
/// actions. Dropping (or [`Toolbar::detach`]ing) it removes every
/// registration it made.
pub struct Toolbar {
    flags: Rc<Flags>,
    subscriptions: Teardown,
}

impl Toolbar {
    /// Attach to an editor: register the update listener and the
    /// `SELECTION_CHANGE` / `CAN_UNDO` / `CAN_REDO` handlers.
    ///
    /// The command handlers run at low priority and always report the
    /// command unhandled, so other consumers still observe these commands.
    pub fn attach(editor: &mut Editor) -> Result<Self, EditorError> {
        let flags = Rc::new(Flags::default());

        let on_update = {
            let flags = Rc::clone(&flags);
            editor.register_update_listener(Rc::new(move |editor: &Editor| {
                editor.read(|state| project_format_flags(&flags, state));
            }))
        };
        let on_selection_change = {
            let flags = Rc::clone(&flags);
            editor.register_command(
                CommandId::SelectionChange,
                PRIORITY_LOW,
                Rc::new(move |editor: &mut Editor, _payload: &CommandPayload| {
                    editor.read(|state| project_format_flags(&flags, state));
                    false
                }),
            )?
        };
        let on_can_undo = {
            let flags = Rc::clone(&flags);
            editor.register_command(
                CommandId::CanUndo,
                PRIORITY_LOW,
                Rc::new(move |_editor: &mut Editor, payload: &CommandPayload| {
                    if let CommandPayload::Flag(value) = payload {
                        flags.can_undo.set(*value);
                    }
                    false
                }),
            )?
        };
        let on_can_redo = {
            let flags = Rc::clone(&flags);
            editor.register_command(
                CommandId::CanRedo,
                PRIORITY_LOW,
                Rc::new(move |_editor: &mut Editor, payload: &CommandPayload| {
                    if let CommandPayload::Flag(value) = payload {
                        flags.can_redo.set(*value);
                    }
                    false
                }),
            )?
        };

        Ok(Self {
            flags,
            subscriptions: Teardown::merge([
                on_update,
                on_selection_change,
                on_can_undo,
                on_can_redo,
            ]),
        })
    }

    /// Drop every registration this toolbar made. Idempotent; also happens
    /// on drop.
    pub fn detach(&mut self) {
        self.subscriptions.dispose();
    }

    pub fn can_undo(&self) -> bool {
        self.flags.can_undo.get()
    }

    pub fn can_redo(&self) -> bool {
        self.flags.can_redo.get()
    }

    pub fn is_bold(&self) -> bool {
        self.flags.bold.get()
    }

    pub fn is_italic(&self) -> bool {
        self.flags.italic.get()
    }

    pub fn is_underline(&self) -> bool {
        self.flags.underline.get()
    }

    pub fn is_strikethrough(&self) -> bool {
        self.flags.strikethrough.get()
    }

    pub fn dispatch_undo(&self, editor: &mut Editor) -> bool {
        editor.dispatch_command(CommandId::Undo, CommandPayload::None)
    }

    pub fn dispatch_redo(&self, editor: &mut Editor) -> bool {
        editor.dispatch_command(CommandId::Redo, CommandPayload::None)
    }

    /// Toggle an inline format over the current selection.
    pub fn toggle_format(&self, editor: &mut Editor, format: TextFormat) -> bool {
        editor.dispatch_command(CommandId::FormatText, CommandPayload::Format(format))
    }

    /// Toggle the anchor's top-level block into or out of a list of `kind`.
    ///
    /// The decision is anchor-based: a selection spanning list and non-list
    /// content resolves solely by the anchor's current block, so the outcome
    /// is a single predictable action rather than mixed per-block behavior.
    pub fn toggle_list(&self, editor: &mut Editor, kind: ListKind) -> bool {
        let decision: Result<Option<CommandId>, EditorError> = editor.read(|state| {
            let Some(Selection::Range(range)) = state.selection().cloned() else {
                return Ok(None);
            };
            let key = top_level_block(state.document(), &range)?;
            let anchored_in_list = state
                .document()
                .block(key)
                .is_some_and(|block| block.is_list());
            Ok(Some(if anchored_in_list {
                CommandId::RemoveList
            } else {
                match kind {
                    ListKind::Unordered => CommandId::InsertUnorderedList,
                    ListKind::Ordered => CommandId::InsertOrderedList,
                }
            }))
        });
        match decision {
            Ok(Some(command)) => editor.dispatch_command(command, CommandPayload::None),
            Ok(None) => false,
            Err(err) => {
                debug!(%err, "list toggle skipped");
                false
            }
        }
    }

    /// Toggle the selected blocks to a heading of `level`, where `0` means
    /// "convert to paragraph". Levels outside `0..=6` are rejected, and a
    /// selection that resolves to no blocks is a no-op returning `false`.
    ///
    /// For levels 1-6 the decision is made per selected block against a
    /// snapshot of the block kinds taken before any mutation: a block that
    /// was already a heading at the target level is downgraded to a
    /// paragraph, while any other block converts the entire selection to the
    /// target heading. Later snapshot entries still apply after earlier ones
    /// mutated the tree, so the outcome over a mixed selection depends on
    /// document order; that order dependence is part of the contract.
    pub fn toggle_heading(&self, editor: &mut Editor, level: u8) -> bool {
        let target = if level == 0 {
            None
        } else {
            match HeadingLevel::new(level) {
                Some(target) => Some(target),
                None => {
                    debug!(level, "heading level out of range");
                    return false;
                }
            }
        };

        let selected = editor.read(|state| {
            let range = state.selection().and_then(Selection::as_range).cloned()?;
            let snapshot: Vec<(NodeKey, Option<HeadingLevel>)> =
                selected_blocks(state.document(), &range)
                    .into_iter()
                    .map(|key| {
                        let level = state.document().block(key).and_then(|b| b.heading_level());
                        (key, level)
                    })
                    .collect();
            (!snapshot.is_empty()).then_some((range, snapshot))
        });
        let Some((range, snapshot)) = selected else {
            return false;
        };

        let result = editor.update(|state| {
            let Some(target) = target else {
                set_blocks_type(state, &range, BlockTarget::Paragraph);
                return Ok(());
            };

            for (key, snapshot_level) in snapshot {
                if state.document().block(key).is_none() {
                    // Vacated by a list conversion earlier in the loop.
                    continue;
                }
                match snapshot_level {
                    Some(current) if current == target => {
                        replace_block_with_paragraph(state, key);
                    }
                    _ => set_blocks_type(state, &range, BlockTarget::Heading(target)),
                }
            }
            Ok(())
        });

        match result {
            Ok(()) => true,
            Err(err) => {
                debug!(%err, "heading toggle dropped");
                false
            }
        }
    }
}

/// Project the four format flags from the current selection. Non-range
/// selections leave the flags untouched, so a transient node selection does
/// not make the indicators flicker.
fn project_format_flags(flags: &Flags, state: &EditorState) {
    let Some(Selection::Range(range)) = state.selection() else {
        return;
    };
    let document = state.document();
    flags
        .bold
        .set(has_format(document, range, TextFormat::Bold));
    flags
        .italic
        .set(has_format(document, range, TextFormat::Italic));
    flags
        .underline
        .set(has_format(document, range, TextFormat::Underline));
    flags
        .strikethrough
        .set(has_format(document, range, TextFormat::Strikethrough));
}

#[cfg(test)]
#[path = "toolbar_tests.rs"]
mod toolbar_tests;
