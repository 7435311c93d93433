// Copyright (c) 2025 - Cowboy AI, Inc.
//! Presence State Machine
//!
//! Two states per resource identity, observed in the store:
//!
//! - Absent: no record under the natural key
//! - Present: exactly one record under the natural key
//!
//! The input is the desired presence plus whether the observed record
//! differs from the desired one. The output is the single store action
//! that moves observed toward desired.
//!
//! | observed | desired | drifted | next    | action |
//! |----------|---------|---------|---------|--------|
//! | Absent   | Present | -       | Present | Create |
//! | Present  | Present | yes     | Present | Update |
//! | Present  | Present | no      | Present | Noop   |
//! | Present  | Absent  | -       | Absent  | Delete |
//! | Absent   | Absent  | -       | Absent  | Noop   |

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{StateMachine, TransitionError, TransitionResult};

/// Whether a resource exists under its natural key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {
    Absent,
    Present,
}

impl fmt::Display for Presence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Presence::Absent => f.write_str("absent"),
            Presence::Present => f.write_str("present"),
        }
    }
}

/// Desired presence, plus drift between observed and desired records
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceInput {
    pub desired: Presence,
    /// Any mutable field differs (only meaningful when both sides are present)
    pub drifted: bool,
}

impl PresenceInput {
    pub fn present(drifted: bool) -> Self {
        Self {
            desired: Presence::Present,
            drifted,
        }
    }

    pub fn absent() -> Self {
        Self {
            desired: Presence::Absent,
            drifted: false,
        }
    }
}

impl fmt::Display for PresenceInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.drifted {
            write!(f, "desired {} (drifted)", self.desired)
        } else {
            write!(f, "desired {}", self.desired)
        }
    }
}

/// Store action decided by a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Update,
    Delete,
    Noop,
}

impl Action {
    /// Whether applying this action writes to the store
    pub fn mutates(&self) -> bool {
        !matches!(self, Action::Noop)
    }

    /// Whether preconditions must hold before applying this action
    pub fn needs_validation(&self) -> bool {
        matches!(self, Action::Create | Action::Update)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Action::Create => "create",
            Action::Update => "update",
            Action::Delete => "delete",
            Action::Noop => "noop",
        };
        f.write_str(name)
    }
}

impl StateMachine for Presence {
    type Input = PresenceInput;
    type Output = Action;

    fn transition(&self, input: &Self::Input) -> TransitionResult<(Self, Self::Output)> {
        use Presence::*;

        match (self, input.desired, input.drifted) {
            (Absent, Present, false) => Ok((Present, Action::Create)),
            (Present, Present, true) => Ok((Present, Action::Update)),
            (Present, Present, false) => Ok((Present, Action::Noop)),
            (Present, Absent, _) => Ok((Absent, Action::Delete)),
            (Absent, Absent, _) => Ok((Absent, Action::Noop)),

            // Nothing observed, so nothing can have drifted
            (Absent, Present, true) => Err(TransitionError::InvalidTransition {
                from: self.to_string(),
                input: input.to_string(),
            }),
        }
    }
}
