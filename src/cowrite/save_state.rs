//! The dirty/save state machine of an open document.
//!
//! ```text
//!            EditOccurred                 TimerFired / SaveRequested
//!   Clean ───────────────▶ Dirty ──────────────────────────────▶ Saving
//!     ▲                     ▲  ▲                                   │
//!     │                     │  └──────── EditOccurred ─────────────┤
//!     │                     │                                      │
//!     │                 EditOccurred       SaveCompleted(err)      │
//!     │                     │   ┌──────────────────────────────────┤
//!     │                     │   ▼                                  │
//!     │                    Failed                                  │
//!     └──────────────────────────────── SaveCompleted(ok) ─────────┘
//! ```
//!
//! The machine is pure: it only decides what should happen next and hands
//! back an [`Effect`]. Timers and persistence live in the caller.

use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SaveState {
    /// Buffer matches the last persisted state.
    #[default]
    Clean,
    /// Edited since the last successful save.
    Dirty,
    /// A save has been triggered and not yet completed.
    Saving,
    /// The last save failed. Behaves like `Dirty`; the buffer is kept.
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    EditOccurred,
    TimerFired,
    SaveRequested,
    SaveCompleted { succeeded: bool },
}

/// What the caller must do in response to an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// (Re)start the debounce timer, superseding any pending one.
    ArmTimer,
    /// Persist the buffer as it is right now.
    Persist,
}

/// The user-visible save indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveStatus {
    Saved,
    Saving,
    Error,
}

impl SaveStatus {
    pub fn label(self) -> &'static str {
        match self {
            SaveStatus::Saved => "Saved",
            SaveStatus::Saving => "Saving...",
            SaveStatus::Error => "Error saving!",
        }
    }
}

impl fmt::Display for SaveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Default)]
pub struct SaveMachine {
    state: SaveState,
}

impl SaveMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> SaveState {
        self.state
    }

    pub fn status(&self) -> SaveStatus {
        match self.state {
            SaveState::Clean => SaveStatus::Saved,
            SaveState::Dirty | SaveState::Saving => SaveStatus::Saving,
            SaveState::Failed => SaveStatus::Error,
        }
    }

    /// Unsaved edits are pending (including a failed save).
    pub fn is_dirty(&self) -> bool {
        matches!(self.state, SaveState::Dirty | SaveState::Failed)
    }

    /// Back to `Clean`, used after a document has been (re)loaded.
    pub fn reset(&mut self) {
        self.state = SaveState::Clean;
    }

    pub fn handle(&mut self, event: SessionEvent) -> Option<Effect> {
        use SaveState::*;

        let (next, effect) = match (self.state, event) {
            (_, SessionEvent::EditOccurred) => (Dirty, Some(Effect::ArmTimer)),

            (Dirty | Failed, SessionEvent::TimerFired) => (Saving, Some(Effect::Persist)),
            (state, SessionEvent::TimerFired) => (state, None),

            (_, SessionEvent::SaveRequested) => (Saving, Some(Effect::Persist)),

            (Saving, SessionEvent::SaveCompleted { succeeded: true }) => (Clean, None),
            // Edits that arrived while saving still need their own save
            (Dirty, SessionEvent::SaveCompleted { succeeded: true }) => (Dirty, None),
            (_, SessionEvent::SaveCompleted { succeeded: false }) => (Failed, None),
            (state, SessionEvent::SaveCompleted { succeeded: true }) => (state, None),
        };

        if next != self.state {
            tracing::trace!(from = ?self.state, to = ?next, ?event, "save state transition");
        }
        self.state = next;
        effect
    }
}
