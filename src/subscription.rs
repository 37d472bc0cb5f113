//! Disposable registration tokens.
//!
//! Every listener or command registration hands back a [`Teardown`] that
//! reverses exactly that registration. [`Teardown::merge`] folds any number
//! of them into one token, so a component can drop all of its registrations
//! atomically when it unmounts.

use std::fmt;

/// A zero-argument teardown action that runs at most once.
///
/// Disposing is idempotent: the second and later calls are no-ops. Dropping
/// an undisposed token disposes it, so holding the token is what keeps the
/// registration alive.
pub struct Teardown {
    action: Option<Box<dyn FnOnce()>>,
}

impl fmt::Debug for Teardown {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Teardown")
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

impl Teardown {
    pub fn new(action: impl FnOnce() + 'static) -> Self {
        Self {
            action: Some(Box::new(action)),
        }
    }

    /// A token that tears nothing down.
    pub fn noop() -> Self {
        Self { action: None }
    }

    /// Combine several teardowns into one.
    ///
    /// Disposing the result disposes every constituent exactly once, in
    /// reverse registration order. Constituents that were already disposed
    /// individually are skipped silently.
    pub fn merge(parts: impl IntoIterator<Item = Teardown>) -> Self {
        let mut parts: Vec<Teardown> = parts.into_iter().collect();
        Teardown::new(move || {
            for part in parts.iter_mut().rev() {
                part.dispose();
            }
        })
    }

    /// Run the teardown action if it has not run yet.
    pub fn dispose(&mut self) {
        if let Some(action) = self.action.take() {
            action();
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.action.is_none()
    }
}

impl Drop for Teardown {
    fn drop(&mut self) {
        self.dispose();
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    fn recording(log: &Rc<RefCell<Vec<&'static str>>>, name: &'static str) -> Teardown {
        let log = Rc::clone(log);
        Teardown::new(move || log.borrow_mut().push(name))
    }

    #[test]
    fn dispose_runs_action_once() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut teardown = recording(&log, "a");
        teardown.dispose();
        teardown.dispose();
        assert_eq!(*log.borrow(), vec!["a"]);
        assert!(teardown.is_disposed());
    }

    #[test]
    fn drop_disposes_pending_action() {
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let _teardown = recording(&log, "a");
        }
        assert_eq!(*log.borrow(), vec!["a"]);
    }

    #[test]
    fn merge_disposes_in_reverse_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut merged = Teardown::merge([
            recording(&log, "first"),
            recording(&log, "second"),
            recording(&log, "third"),
        ]);
        merged.dispose();
        assert_eq!(*log.borrow(), vec!["third", "second", "first"]);
    }

    #[test]
    fn merged_teardown_is_idempotent() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut merged = Teardown::merge([recording(&log, "a"), recording(&log, "b")]);
        merged.dispose();
        merged.dispose();
        assert_eq!(log.borrow().len(), 2);
    }

    #[test]
    fn debug_output_reports_disposal_state() {
        let mut teardown = Teardown::new(|| {});
        assert_eq!(format!("{teardown:?}"), "Teardown { disposed: false }");
        teardown.dispose();
        assert_eq!(format!("{teardown:?}"), "Teardown { disposed: true }");
    }

    #[test]
    fn merge_skips_already_disposed_constituents() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut early = recording(&log, "early");
        early.dispose();
        let mut merged = Teardown::merge([early, recording(&log, "late")]);
        merged.dispose();
        assert_eq!(*log.borrow(), vec!["early", "late"]);
    }
}
