//! Process-wide popover slot.
//!
//! At most one definition popover is visible at a time. Requesting the
//! anchor that is already active toggles it off; any other anchor
//! replaces the active one; a dismiss clears the slot.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;

/// The currently shown word and the anchor element it hangs off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActiveWord {
    pub word: String,
    pub anchor: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DispatchOutcome {
    Shown,
    Hidden,
}

#[derive(Clone, Default)]
pub struct Dispatcher {
    slot: Arc<RwLock<Option<ActiveWord>>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self, word: &str, anchor: &str) -> DispatchOutcome {
        let mut slot = self.slot.write();
        match slot.as_ref() {
            Some(active) if active.anchor == anchor => {
                *slot = None;
                DispatchOutcome::Hidden
            }
            _ => {
                *slot = Some(ActiveWord {
                    word: word.to_string(),
                    anchor: anchor.to_string(),
                });
                DispatchOutcome::Shown
            }
        }
    }

    pub fn dismiss(&self) {
        *self.slot.write() = None;
    }

    pub fn active(&self) -> Option<ActiveWord> {
        self.slot.read().clone()
    }
}
