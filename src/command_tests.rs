use std::cell::{Cell, RefCell};
use std::rc::Rc;

use super::*;
use crate::document::Document;
use crate::editor::Editor;

fn editor() -> Editor {
    Editor::new(Document::new())
}

fn recording(log: &Rc<RefCell<Vec<i32>>>, tag: i32, handled: bool) -> CommandHandler {
    let log = Rc::clone(log);
    Rc::new(move |_editor: &mut Editor, _payload: &CommandPayload| {
        log.borrow_mut().push(tag);
        handled
    })
}

#[test]
fn dispatch_without_handlers_is_unhandled() {
    let mut editor = editor();
    assert!(!editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None));
}

#[test]
fn handlers_run_in_descending_priority_order() {
    let mut editor = editor();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _a = editor
        .register_command(CommandId::SelectionChange, 5, recording(&log, 5, false))
        .unwrap();
    let _b = editor
        .register_command(CommandId::SelectionChange, 1, recording(&log, 1, false))
        .unwrap();
    let _c = editor
        .register_command(CommandId::SelectionChange, 3, recording(&log, 3, false))
        .unwrap();

    let handled = editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    assert!(!handled);
    assert_eq!(*log.borrow(), vec![5, 3, 1]);
}

#[test]
fn handled_command_stops_propagation() {
    let mut editor = editor();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _a = editor
        .register_command(CommandId::SelectionChange, 5, recording(&log, 5, true))
        .unwrap();
    let _b = editor
        .register_command(CommandId::SelectionChange, 3, recording(&log, 3, false))
        .unwrap();
    let _c = editor
        .register_command(CommandId::SelectionChange, 1, recording(&log, 1, false))
        .unwrap();

    let handled = editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    assert!(handled);
    assert_eq!(*log.borrow(), vec![5]);
}

#[test]
fn equal_priorities_keep_registration_order() {
    let mut editor = editor();
    let log = Rc::new(RefCell::new(Vec::new()));
    let _a = editor
        .register_command(CommandId::SelectionChange, 2, recording(&log, 1, false))
        .unwrap();
    let _b = editor
        .register_command(CommandId::SelectionChange, 2, recording(&log, 2, false))
        .unwrap();

    editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    assert_eq!(*log.borrow(), vec![1, 2]);
}

#[test]
fn out_of_range_priorities_are_rejected() {
    let mut editor = editor();
    let noop: CommandHandler = Rc::new(|_editor, _payload| false);

    let err = editor
        .register_command(CommandId::SelectionChange, -1, Rc::clone(&noop))
        .unwrap_err();
    assert_eq!(err, crate::error::EditorError::InvalidPriority(-1));

    let err = editor
        .register_command(CommandId::SelectionChange, 1 << 20, noop)
        .unwrap_err();
    assert_eq!(err, crate::error::EditorError::InvalidPriority(1 << 20));
}

#[test]
fn reentrant_dispatch_of_same_command_nests() {
    let mut editor = editor();
    let calls = Rc::new(Cell::new(0));
    let nested = Rc::new(Cell::new(false));
    let handler: CommandHandler = {
        let calls = Rc::clone(&calls);
        let nested = Rc::clone(&nested);
        Rc::new(move |editor: &mut Editor, _payload: &CommandPayload| {
            calls.set(calls.get() + 1);
            if !nested.get() {
                nested.set(true);
                editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
            }
            false
        })
    };
    let _t = editor
        .register_command(CommandId::SelectionChange, PRIORITY_LOW, handler)
        .unwrap();

    editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    assert_eq!(calls.get(), 2);
}

#[test]
fn teardown_unregisters_exactly_one_registration() {
    let mut editor = editor();
    let log = Rc::new(RefCell::new(Vec::new()));
    let mut keep = editor
        .register_command(CommandId::SelectionChange, 2, recording(&log, 1, false))
        .unwrap();
    let _other = editor
        .register_command(CommandId::SelectionChange, 1, recording(&log, 2, false))
        .unwrap();

    keep.dispose();
    keep.dispose();
    editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    assert_eq!(*log.borrow(), vec![2]);
}

#[test]
fn merged_teardown_runs_each_constituent_once() {
    let mut editor = editor();
    let log = Rc::new(RefCell::new(Vec::new()));
    let a = editor
        .register_command(CommandId::SelectionChange, 2, recording(&log, 1, false))
        .unwrap();
    let b = editor
        .register_command(CommandId::SelectionChange, 1, recording(&log, 2, false))
        .unwrap();

    let mut merged = crate::subscription::Teardown::merge([a, b]);
    merged.dispose();
    merged.dispose();

    editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    assert!(log.borrow().is_empty());
}

#[test]
fn dropping_a_teardown_unregisters() {
    let mut editor = editor();
    let log = Rc::new(RefCell::new(Vec::new()));
    {
        let _t = editor
            .register_command(CommandId::SelectionChange, 1, recording(&log, 1, false))
            .unwrap();
    }
    editor.dispatch_command(CommandId::SelectionChange, CommandPayload::None);
    assert!(log.borrow().is_empty());
}
