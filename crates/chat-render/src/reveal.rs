//! Draw-cursor reveal animator.
//!
//! Each event owns one [`RevealState`], advanced only here and read by
//! the layout pass. The cursor accumulates fractionally so sub-one-
//! character-per-tick speeds still progress, and completion latches:
//! once a message is fully drawn its text length is never consulted
//! again, so a later visibility change cannot un-complete it.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::RevealSpeed;

/// Animation phase of one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealPhase {
    Pending,
    InProgress,
    Complete,
}

/// Progressive-disclosure position within a message's displayed text.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RevealState {
    cursor: f32,
    complete: bool,
}

impl Default for RevealState {
    fn default() -> Self {
        Self::new()
    }
}

impl RevealState {
    pub fn new() -> Self {
        Self {
            cursor: 0.0,
            complete: false,
        }
    }

    /// Current cursor for layout gating. Complete messages pin the
    /// cursor to infinity so every unit stays revealed.
    pub fn cursor(&self) -> f32 {
        if self.complete {
            f32::INFINITY
        } else {
            self.cursor
        }
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn phase(&self) -> RevealPhase {
        if self.complete {
            RevealPhase::Complete
        } else if self.cursor == 0.0 {
            RevealPhase::Pending
        } else {
            RevealPhase::InProgress
        }
    }

    /// Advance by one tick against the current displayed text length.
    ///
    /// `text_len` is re-read every tick while in progress (a visibility
    /// toggle may change it) but ignored once complete.
    pub fn advance(&mut self, speed: RevealSpeed, tick: Duration, text_len: usize) {
        if self.complete {
            return;
        }
        match speed {
            RevealSpeed::Instant => self.finish(),
            RevealSpeed::CharsPerSec(cps) => {
                self.cursor += cps.max(0.0) * tick.as_secs_f32();
                if self.cursor >= text_len as f32 {
                    self.finish();
                }
            }
        }
    }

    fn finish(&mut self) {
        self.complete = true;
        self.cursor = f32::INFINITY;
    }
}
