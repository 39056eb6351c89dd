//! Saga stages.

use serde::{Deserialize, Serialize};

/// Where a saga is, or where it stopped.
///
/// Stage transitions:
/// ```text
/// Validating ──► CheckingStock ──┬──► PlacingOrder ──► Notifying ──► Completed
///                                └──► Rejected
/// any stage before Notifying ──► Aborted (via SagaError)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SagaStage {
    /// The request is being checked before anything is sent.
    #[default]
    Validating,

    /// Waiting on the stock responder.
    CheckingStock,

    /// Handing the order off.
    PlacingOrder,

    /// The order is out; telling the user.
    Notifying,

    /// Order handed off (terminal state).
    Completed,

    /// Stock was insufficient (terminal state).
    Rejected,
}

impl SagaStage {
    /// Returns true once the order has been handed off. Nothing after
    /// this point can be undone, so later failures never change the outcome.
    pub fn is_past_point_of_no_return(&self) -> bool {
        matches!(self, SagaStage::Notifying | SagaStage::Completed)
    }

    /// Returns true if this is a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SagaStage::Completed | SagaStage::Rejected)
    }

    /// Returns the stage name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            SagaStage::Validating => "Validating",
            SagaStage::CheckingStock => "CheckingStock",
            SagaStage::PlacingOrder => "PlacingOrder",
            SagaStage::Notifying => "Notifying",
            SagaStage::Completed => "Completed",
            SagaStage::Rejected => "Rejected",
        }
    }
}

impl std::fmt::Display for SagaStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_stage_is_validating() {
        assert_eq!(SagaStage::default(), SagaStage::Validating);
    }

    #[test]
    fn test_point_of_no_return() {
        assert!(!SagaStage::Validating.is_past_point_of_no_return());
        assert!(!SagaStage::CheckingStock.is_past_point_of_no_return());
        assert!(!SagaStage::PlacingOrder.is_past_point_of_no_return());
        assert!(SagaStage::Notifying.is_past_point_of_no_return());
        assert!(SagaStage::Completed.is_past_point_of_no_return());
        assert!(!SagaStage::Rejected.is_past_point_of_no_return());
    }

    #[test]
    fn test_terminal_stages() {
        assert!(!SagaStage::CheckingStock.is_terminal());
        assert!(!SagaStage::Notifying.is_terminal());
        assert!(SagaStage::Completed.is_terminal());
        assert!(SagaStage::Rejected.is_terminal());
    }

    #[test]
    fn test_display() {
        assert_eq!(SagaStage::CheckingStock.to_string(), "CheckingStock");
        assert_eq!(SagaStage::Completed.to_string(), "Completed");
    }
}
