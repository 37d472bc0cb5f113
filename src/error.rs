use thiserror::Error;

/// Failures surfaced by the editor shell and the toolbar engine.
///
/// All of these are handled locally by the toolbar actions (which degrade to
/// a no-op); only [`crate::editor::Editor::update`] propagates them to its
/// caller, after rolling the state back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditorError {
    /// A command handler was registered with a priority outside the accepted
    /// range. Rejected at registration time, never coerced.
    #[error("command priority {0} is outside the accepted range")]
    InvalidPriority(i32),

    /// The selection anchor does not resolve to any top-level block, e.g.
    /// because the selection still references a node from an earlier state.
    #[error("selection anchor has no top-level block ancestor")]
    NoTopLevelAncestor,

    /// An update transaction could not complete. The pre-transaction state
    /// has been restored; no partial mutation is observable.
    #[error("update transaction failed: {0}")]
    TransactionFailure(String),
}
