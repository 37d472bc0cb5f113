//! Command identities and the priority-ordered command bus.
//!
//! A command names a user intent; dispatching one walks the registered
//! handlers from highest to lowest priority until a handler reports the
//! command as handled. Handlers receive the editor as an explicit context
//! object and may dispatch further commands re-entrantly.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use crate::document::TextFormat;
use crate::editor::Editor;
use crate::error::EditorError;
use crate::subscription::Teardown;

/// Identity of a dispatchable command. Value equality decides which handlers
/// a dispatch reaches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CommandId {
    /// The active selection changed without a full state transition.
    SelectionChange,
    /// Undo availability changed; carries a [`CommandPayload::Flag`].
    CanUndo,
    /// Redo availability changed; carries a [`CommandPayload::Flag`].
    CanRedo,
    Undo,
    Redo,
    /// Toggle a text format over the selection; carries a
    /// [`CommandPayload::Format`].
    FormatText,
    InsertUnorderedList,
    InsertOrderedList,
    RemoveList,
}

/// Typed payload attached to a dispatch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CommandPayload {
    None,
    Flag(bool),
    Format(TextFormat),
}

pub const PRIORITY_EDITOR: i32 = 0;
pub const PRIORITY_LOW: i32 = 1;
pub const PRIORITY_NORMAL: i32 = 2;
pub const PRIORITY_HIGH: i32 = 3;
pub const PRIORITY_CRITICAL: i32 = 4;

/// Registrations outside `0..PRIORITY_LIMIT` are rejected.
const PRIORITY_LIMIT: i32 = 1 << 16;

/// A command handler. Returning `true` marks the command handled and stops
/// propagation to lower-priority handlers.
pub type CommandHandler = Rc<dyn Fn(&mut Editor, &CommandPayload) -> bool>;

struct Registration {
    seq: u64,
    priority: i32,
    handler: CommandHandler,
}

type HandlerTable = HashMap<CommandId, Vec<Registration>>;

/// Registry of command handlers, keyed by command identity.
///
/// The table lives behind an `Rc` so teardown tokens can unregister without
/// holding a borrow of the editor; a token outliving the bus is harmless.
pub struct CommandBus {
    table: Rc<RefCell<HandlerTable>>,
    next_seq: Cell<u64>,
}

impl CommandBus {
    pub fn new() -> Self {
        Self {
            table: Rc::new(RefCell::new(HashMap::new())),
            next_seq: Cell::new(0),
        }
    }

    /// Register `handler` for `command` at the given priority.
    ///
    /// Fails with [`EditorError::InvalidPriority`] if the priority falls
    /// outside the accepted range.
    pub fn register(
        &self,
        command: CommandId,
        priority: i32,
        handler: CommandHandler,
    ) -> Result<Teardown, EditorError> {
        if !(0..PRIORITY_LIMIT).contains(&priority) {
            return Err(EditorError::InvalidPriority(priority));
        }
        Ok(self.register_at(command, priority, handler))
    }

    /// Registration path for the editor's own handlers, whose priorities are
    /// the named constants and need no range check.
    pub(crate) fn register_at(
        &self,
        command: CommandId,
        priority: i32,
        handler: CommandHandler,
    ) -> Teardown {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.table
            .borrow_mut()
            .entry(command)
            .or_default()
            .push(Registration {
                seq,
                priority,
                handler,
            });

        let table = Rc::downgrade(&self.table);
        Teardown::new(move || {
            let Some(table) = table.upgrade() else {
                return;
            };
            let mut table = table.borrow_mut();
            let drained = match table.get_mut(&command) {
                Some(entries) => {
                    entries.retain(|registration| registration.seq != seq);
                    entries.is_empty()
                }
                None => false,
            };
            if drained {
                table.remove(&command);
            }
        })
    }

    /// The handlers for `command` in dispatch order: descending priority,
    /// ties broken by registration order. A snapshot, so handlers registered
    /// or removed mid-dispatch do not affect the dispatch in flight.
    pub(crate) fn snapshot(&self, command: CommandId) -> Vec<CommandHandler> {
        let table = self.table.borrow();
        let Some(entries) = table.get(&command) else {
            return Vec::new();
        };
        let mut ordered: Vec<(i32, u64, CommandHandler)> = entries
            .iter()
            .map(|r| (r.priority, r.seq, Rc::clone(&r.handler)))
            .collect();
        ordered.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));
        ordered.into_iter().map(|(_, _, handler)| handler).collect()
    }
}

impl Default for CommandBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "command_tests.rs"]
mod command_tests;
