use crate::{Error, Result};
use tracing::{debug, info, warn};

/// States of one conversation turn. `Streaming` covers the provider call;
/// each tool round detours through `ExecutingTools` and back.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnState {
    Idle,
    Streaming,
    ExecutingTools,
    Finished,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TurnEvent {
    Begin,
    ModelRequestedTools,
    ToolsCompleted,
    StreamEnded,
    ErrorOccurred,
}

pub struct TurnStateMachine {
    state: TurnState,
}

impl TurnStateMachine {
    pub fn new() -> Self {
        Self {
            state: TurnState::Idle,
        }
    }

    pub fn current_state(&self) -> &TurnState {
        &self.state
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.state, TurnState::Finished | TurnState::Failed)
    }

    pub fn transition(&mut self, event: TurnEvent) -> Result<()> {
        let old_state = self.state.clone();

        let new_state = match (&self.state, &event) {
            (TurnState::Idle, TurnEvent::Begin) => TurnState::Streaming,
            (TurnState::Streaming, TurnEvent::ModelRequestedTools) => TurnState::ExecutingTools,
            (TurnState::Streaming, TurnEvent::StreamEnded) => TurnState::Finished,
            (TurnState::Streaming, TurnEvent::ErrorOccurred) => TurnState::Failed,
            (TurnState::ExecutingTools, TurnEvent::ToolsCompleted) => TurnState::Streaming,
            (TurnState::ExecutingTools, TurnEvent::ErrorOccurred) => TurnState::Failed,
            (TurnState::Idle, TurnEvent::ErrorOccurred) => TurnState::Failed,
            _ => {
                warn!(
                    "Invalid turn transition from {:?} with event {:?}",
                    self.state, event
                );
                return Err(Error::InvalidTransition {
                    current: format!("{:?}", self.state),
                    requested: format!("{:?}", event),
                });
            }
        };

        if old_state != new_state {
            info!(
                "Turn state transition: {:?} -> {:?} (event: {:?})",
                old_state, new_state, event
            );
        } else {
            debug!(
                "Turn staying in state {:?} after event {:?}",
                old_state, event
            );
        }

        self.state = new_state;
        Ok(())
    }
}

impl Default for TurnStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_reply_path() {
        let mut fsm = TurnStateMachine::new();
        assert_eq!(*fsm.current_state(), TurnState::Idle);

        fsm.transition(TurnEvent::Begin).unwrap();
        assert_eq!(*fsm.current_state(), TurnState::Streaming);

        fsm.transition(TurnEvent::StreamEnded).unwrap();
        assert_eq!(*fsm.current_state(), TurnState::Finished);
        assert!(fsm.is_terminal());
    }

    #[test]
    fn test_tool_round_trip() {
        let mut fsm = TurnStateMachine::new();
        fsm.transition(TurnEvent::Begin).unwrap();

        fsm.transition(TurnEvent::ModelRequestedTools).unwrap();
        assert_eq!(*fsm.current_state(), TurnState::ExecutingTools);

        fsm.transition(TurnEvent::ToolsCompleted).unwrap();
        assert_eq!(*fsm.current_state(), TurnState::Streaming);
        assert!(!fsm.is_terminal());

        fsm.transition(TurnEvent::StreamEnded).unwrap();
        assert!(fsm.is_terminal());
    }

    #[test]
    fn test_provider_failure_terminates_turn() {
        let mut fsm = TurnStateMachine::new();
        fsm.transition(TurnEvent::Begin).unwrap();
        fsm.transition(TurnEvent::ErrorOccurred).unwrap();

        assert_eq!(*fsm.current_state(), TurnState::Failed);
        assert!(fsm.is_terminal());
    }

    #[test]
    fn test_invalid_transition_is_rejected() {
        let mut fsm = TurnStateMachine::new();

        let err = fsm.transition(TurnEvent::ToolsCompleted).unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(*fsm.current_state(), TurnState::Idle);
    }

    #[test]
    fn test_no_transitions_out_of_terminal_states() {
        let mut fsm = TurnStateMachine::new();
        fsm.transition(TurnEvent::Begin).unwrap();
        fsm.transition(TurnEvent::StreamEnded).unwrap();

        assert!(fsm.transition(TurnEvent::Begin).is_err());
        assert!(fsm.transition(TurnEvent::ModelRequestedTools).is_err());
    }
}
