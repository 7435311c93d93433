// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Transitions are pure functions: deterministic, no side effects. Whatever
//! a transition decides is carried out by the caller.
//!
//! # Mealy Machine
//!
//! Output depends on both current state and input:
//! ```text
//! (State, Input) → (State, Output)
//! ```
//!
//! The reconciler is driven by one such machine, [`Presence`], whose output
//! is the [`Action`] to apply against the store.
//!
//! # Example
//!
//! ```rust
//! use cim_ipam::state_machine::{Action, Presence, PresenceInput, StateMachine};
//!
//! let observed = Presence::Absent;
//! let (next, action) = observed
//!     .transition(&PresenceInput::present(false))
//!     .unwrap();
//! assert_eq!(next, Presence::Present);
//! assert_eq!(action, Action::Create);
//! ```

pub mod presence;

pub use presence::{Action, Presence, PresenceInput};

/// Result of a state transition
pub type TransitionResult<S> = Result<S, TransitionError>;

/// Errors that can occur during state transitions
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The input is not meaningful in the current state
    #[error("Invalid transition from {from} on {input}")]
    InvalidTransition { from: String, input: String },
}

/// Trait for finite state machines
///
/// Implement this trait to define a state machine with typed states,
/// inputs, and outputs.
pub trait StateMachine: Sized + Clone {
    /// Input type that triggers transitions
    type Input;

    /// Output type produced by transitions (use () if none)
    type Output;

    /// Attempt to transition to a new state given an input
    ///
    /// # Returns
    /// - Ok((new_state, output)) if transition is valid
    /// - Err(TransitionError) if transition is invalid
    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)>;

    /// Check if a transition is valid without performing it
    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }
}
