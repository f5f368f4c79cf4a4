//! Query state machine values.

use serde::{Deserialize, Serialize};

/// Lifecycle state of a query.
///
/// State transitions:
/// - Init -> Started -> Finished
/// - Init -> Finished (terminal transition driven directly, e.g. cancel before send)
///
/// Ordering follows the lifecycle, so `state >= Started` means "has been started".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryState {
    /// Constructed, not yet submitted.
    Init,

    /// Submitted to the engine; holds a correlation token.
    Started,

    /// Terminal.
    Finished,
}

impl QueryState {
    pub fn is_terminal(self) -> bool {
        matches!(self, QueryState::Finished)
    }
}

/// Terminal outcome of a finished query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Answered,
    Errored,
    Canceled,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn states_are_ordered_by_lifecycle() {
        assert!(QueryState::Init < QueryState::Started);
        assert!(QueryState::Started < QueryState::Finished);
        assert!(QueryState::Finished.is_terminal());
        assert!(!QueryState::Started.is_terminal());
    }
}
