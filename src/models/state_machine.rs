// Message exchange state machine with validation

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lifecycle of a single send/reply exchange
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    Idle,
    Sending,
    AwaitingReply,
    Success,
    Failed,
}

impl ExchangeState {
    /// Loading indicator: true exactly while a request is outstanding
    pub fn is_loading(&self) -> bool {
        matches!(self, ExchangeState::Sending | ExchangeState::AwaitingReply)
    }
}

impl Default for ExchangeState {
    fn default() -> Self {
        ExchangeState::Idle
    }
}

#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("Invalid exchange transition from {from:?} to {to:?}")]
    InvalidTransition {
        from: ExchangeState,
        to: ExchangeState,
    },
}

/// Validates if an exchange can move from one state to another
pub fn can_transition(from: ExchangeState, to: ExchangeState) -> bool {
    match (from, to) {
        (ExchangeState::Idle, ExchangeState::Sending) => true,
        (ExchangeState::Idle, ExchangeState::Idle) => true,

        (ExchangeState::Sending, ExchangeState::AwaitingReply) => true,
        (ExchangeState::Sending, ExchangeState::Failed) => true,

        (ExchangeState::AwaitingReply, ExchangeState::Success) => true,
        (ExchangeState::AwaitingReply, ExchangeState::Failed) => true,

        // Both outcomes settle back to Idle
        (ExchangeState::Success, ExchangeState::Idle) => true,
        (ExchangeState::Failed, ExchangeState::Idle) => true,

        _ => false,
    }
}

/// Validates and performs a state transition
pub fn transition_state(
    current: ExchangeState,
    target: ExchangeState,
) -> Result<ExchangeState, StateTransitionError> {
    if !can_transition(current, target) {
        return Err(StateTransitionError::InvalidTransition {
            from: current,
            to: target,
        });
    }

    Ok(target)
}
