//! The host editor shell: state, transactions, listeners, history.
//!
//! All access to the document goes through scoped transactions: [`Editor::read`]
//! for read-only passes and [`Editor::update`] for mutations. An update either
//! commits as a whole or rolls back to the pre-transaction state, so observers
//! never see a partially mutated tree. Committed document changes feed a
//! snapshot history whose availability is broadcast through the `CAN_UNDO` and
//! `CAN_REDO` commands.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use tracing::{debug, trace};

use crate::command::{
    CommandBus, CommandHandler, CommandId, CommandPayload, PRIORITY_EDITOR,
};
use crate::document::{Document, ListKind};
use crate::error::EditorError;
use crate::subscription::Teardown;

pub mod selection;
pub(crate) mod structure;

use selection::Selection;

/// One snapshot of everything a transaction can touch: the document plus the
/// active selection.
#[derive(Clone, Debug, PartialEq)]
pub struct EditorState {
    document: Document,
    selection: Option<Selection>,
}

impl EditorState {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            selection: None,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn selection(&self) -> Option<&Selection> {
        self.selection.as_ref()
    }

    pub fn set_selection(&mut self, selection: Option<Selection>) {
        self.selection = selection;
    }

    pub(crate) fn selection_mut(&mut self) -> &mut Option<Selection> {
        &mut self.selection
    }
}

/// A read-only pass over the editor after a committed state transition.
pub type UpdateListener = Rc<dyn Fn(&Editor)>;

struct ListenerTable {
    entries: Rc<RefCell<Vec<(u64, UpdateListener)>>>,
    next_seq: Cell<u64>,
}

impl ListenerTable {
    fn new() -> Self {
        Self {
            entries: Rc::new(RefCell::new(Vec::new())),
            next_seq: Cell::new(0),
        }
    }

    fn register(&self, listener: UpdateListener) -> Teardown {
        let seq = self.next_seq.get();
        self.next_seq.set(seq + 1);
        self.entries.borrow_mut().push((seq, listener));
        let entries = Rc::downgrade(&self.entries);
        Teardown::new(move || {
            if let Some(entries) = entries.upgrade() {
                entries.borrow_mut().retain(|(s, _)| *s != seq);
            }
        })
    }

    fn snapshot(&self) -> Vec<UpdateListener> {
        self.entries
            .borrow()
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect()
    }
}

#[derive(Default)]
struct History {
    undo: Vec<EditorState>,
    redo: Vec<EditorState>,
    /// Last (can_undo, can_redo) pair broadcast through the capability
    /// commands, to avoid redundant dispatches.
    notified: (bool, bool),
}

/// The document editor. Passed explicitly into every command handler as the
/// context object; there is no ambient editor singleton.
pub struct Editor {
    state: EditorState,
    bus: CommandBus,
    listeners: ListenerTable,
    history: History,
    /// Keeps the built-in command handlers registered for the editor's
    /// lifetime.
    _core: Teardown,
}

impl Editor {
    pub fn new(document: Document) -> Self {
        let mut editor = Self {
            state: EditorState::new(document),
            bus: CommandBus::new(),
            listeners: ListenerTable::new(),
            history: History::default(),
            _core: Teardown::noop(),
        };
        editor._core = editor.install_core_handlers();
        editor
    }

    /// The built-in handlers every editor carries: history navigation, text
    /// formatting and the list mutations. All registered at editor priority
    /// and all claim their command.
    fn install_core_handlers(&mut self) -> Teardown {
        let undo = self.bus.register_at(
            CommandId::Undo,
            PRIORITY_EDITOR,
            Rc::new(|editor: &mut Editor, _payload: &CommandPayload| {
                editor.undo();
                true
            }),
        );
        let redo = self.bus.register_at(
            CommandId::Redo,
            PRIORITY_EDITOR,
            Rc::new(|editor: &mut Editor, _payload: &CommandPayload| {
                editor.redo();
                true
            }),
        );
        let format = self.bus.register_at(
            CommandId::FormatText,
            PRIORITY_EDITOR,
            Rc::new(|editor: &mut Editor, payload: &CommandPayload| {
                if let CommandPayload::Format(format) = payload {
                    let format = *format;
                    if let Err(err) = editor.update(|state| {
                        structure::toggle_text_format(state, format);
                        Ok(())
                    }) {
                        debug!(%err, "format command dropped");
                    }
                }
                true
            }),
        );
        let unordered = self.bus.register_at(
            CommandId::InsertUnorderedList,
            PRIORITY_EDITOR,
            Rc::new(|editor: &mut Editor, _payload: &CommandPayload| {
                editor.apply_list_command(|state| structure::insert_list(state, ListKind::Unordered));
                true
            }),
        );
        let ordered = self.bus.register_at(
            CommandId::InsertOrderedList,
            PRIORITY_EDITOR,
            Rc::new(|editor: &mut Editor, _payload: &CommandPayload| {
                editor.apply_list_command(|state| structure::insert_list(state, ListKind::Ordered));
                true
            }),
        );
        let remove = self.bus.register_at(
            CommandId::RemoveList,
            PRIORITY_EDITOR,
            Rc::new(|editor: &mut Editor, _payload: &CommandPayload| {
                editor.apply_list_command(structure::remove_list);
                true
            }),
        );
        Teardown::merge([undo, redo, format, unordered, ordered, remove])
    }

    fn apply_list_command(&mut self, mutate: impl FnOnce(&mut EditorState)) {
        if let Err(err) = self.update(|state| {
            mutate(state);
            Ok(())
        }) {
            debug!(%err, "list command dropped");
        }
    }

    /// Run a read-only pass over the current state.
    pub fn read<R>(&self, f: impl FnOnce(&EditorState) -> R) -> R {
        f(&self.state)
    }

    /// Run a mutation transaction.
    ///
    /// If the closure fails, the pre-transaction state is restored and the
    /// error is returned; nothing is observable. On commit, a document
    /// change records the pre-state for undo, re-broadcasts the history
    /// capabilities if they changed, and notifies update listeners.
    /// Selection-only changes notify listeners without touching history.
    pub fn update(
        &mut self,
        f: impl FnOnce(&mut EditorState) -> Result<(), EditorError>,
    ) -> Result<(), EditorError> {
        let before = self.state.clone();
        match f(&mut self.state) {
            Ok(()) => {
                if self.state == before {
                    return Ok(());
                }
                if self.state.document != before.document {
                    self.history.undo.push(before);
                    self.history.redo.clear();
                    self.sync_history_flags();
                }
                self.notify_update();
                Ok(())
            }
            Err(err) => {
                debug!(%err, "update rolled back");
                self.state = before;
                Err(err)
            }
        }
    }

    /// Host-style selection change without a full state transition: set the
    /// selection and announce it through `SELECTION_CHANGE`.
    pub fn select(&mut self, selection: Option<Selection>) {
        self.state.selection = selection;
        self.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    }

    /// Dispatch `command` to its handlers in priority order. Returns whether
    /// any handler claimed it.
    pub fn dispatch_command(&mut self, command: CommandId, payload: CommandPayload) -> bool {
        let handlers = self.bus.snapshot(command);
        trace!(?command, handlers = handlers.len(), "dispatching command");
        for handler in handlers {
            if (*handler)(self, &payload) {
                return true;
            }
        }
        false
    }

    /// Register a command handler; see [`CommandBus::register`].
    pub fn register_command(
        &mut self,
        command: CommandId,
        priority: i32,
        handler: CommandHandler,
    ) -> Result<Teardown, EditorError> {
        self.bus.register(command, priority, handler)
    }

    /// Register a listener invoked after every committed state transition.
    pub fn register_update_listener(&mut self, listener: UpdateListener) -> Teardown {
        self.listeners.register(listener)
    }

    pub fn can_undo(&self) -> bool {
        !self.history.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.history.redo.is_empty()
    }

    fn undo(&mut self) {
        let Some(previous) = self.history.undo.pop() else {
            return;
        };
        trace!("undo");
        self.history
            .redo
            .push(std::mem::replace(&mut self.state, previous));
        self.sync_history_flags();
        self.notify_update();
    }

    fn redo(&mut self) {
        let Some(next) = self.history.redo.pop() else {
            return;
        };
        trace!("redo");
        self.history
            .undo
            .push(std::mem::replace(&mut self.state, next));
        self.sync_history_flags();
        self.notify_update();
    }

    fn sync_history_flags(&mut self) {
        let current = (self.can_undo(), self.can_redo());
        if current == self.history.notified {
            return;
        }
        let previous = std::mem::replace(&mut self.history.notified, current);
        if current.0 != previous.0 {
            self.dispatch_command(CommandId::CanUndo, CommandPayload::Flag(current.0));
        }
        if current.1 != previous.1 {
            self.dispatch_command(CommandId::CanRedo, CommandPayload::Flag(current.1));
        }
    }

    fn notify_update(&mut self) {
        for listener in self.listeners.snapshot() {
            (*listener)(self);
        }
    }
}

#[cfg(test)]
#[path = "editor_tests.rs"]
mod editor_tests;
