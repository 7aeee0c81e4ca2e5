// SPDX-License-Identifier: GPL-3.0
// auto_load.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use log::{debug, info};

use crate::media_probe::MediaStatus;

/// The states of the auto-load sequencer. Being in `MediaPresentAttempted` is the
/// load attempt latch: it is only left once the media is observed absent.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AutoLoadState {
    NoMedia,
    MediaPresentUnattempted,
    MediaPresentAttempted,
}

/// What the caller must do after a poll tick.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum AutoLoadAction {
    None,

    /// Mount the physical disc, as an image request with an empty path.
    Mount,
}

/// Computes the next state from the current one, the live media status and
/// whether the drive already has something loaded.
pub fn next_state(
    state: AutoLoadState,
    media: MediaStatus,
    loaded: bool,
) -> (AutoLoadState, AutoLoadAction) {

    if !media.present {
        return (AutoLoadState::NoMedia, AutoLoadAction::None);
    }

    match state {
        AutoLoadState::MediaPresentAttempted => {
            (AutoLoadState::MediaPresentAttempted, AutoLoadAction::None)
        },
        _ if !loaded && media.allows_auto_load() => {
            (AutoLoadState::MediaPresentAttempted, AutoLoadAction::Mount)
        },
        _ => (AutoLoadState::MediaPresentUnattempted, AutoLoadAction::None),
    }
}

/// This struct owns the auto-load state of one drive.
pub struct AutoLoadSequencer {

    // Current state, including the attempt latch.
    state: AutoLoadState,
}

/// Implementation functions for the auto-load sequencer.
impl AutoLoadSequencer {

    /// Creates a new sequencer that has not seen any media yet.
    pub fn new() -> Self {
        AutoLoadSequencer {
            state: AutoLoadState::NoMedia,
        }
    }

    /// Advances the sequencer by one poll tick.
    pub fn tick(&mut self, media: MediaStatus, loaded: bool) -> AutoLoadAction {
        let (state, action) = next_state(self.state, media, loaded);

        if state != self.state {
            debug!("Auto-load state {:?} -> {:?}", self.state, state);
        }
        if action == AutoLoadAction::Mount {
            info!("Compatible disc inserted ({:?}), attempting auto-load", media.media_type);
        }

        self.state = state;
        action
    }

    /// Returns the current state.
    pub fn state(&self) -> AutoLoadState {
        self.state
    }

    /// Returns whether a mount has been attempted for the current insertion.
    pub fn load_attempted(&self) -> bool {
        self.state == AutoLoadState::MediaPresentAttempted
    }
}
