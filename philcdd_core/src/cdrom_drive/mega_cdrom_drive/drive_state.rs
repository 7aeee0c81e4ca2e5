// SPDX-License-Identifier: GPL-3.0
// drive_state.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use philcdd_utility::{Msf, RAW_SECTOR_SIZE, lba_to_msf};

use crate::{
    cd_image::ImageSource,
    toc::{Toc, Track, TrackType},
};

/// Where the mounted disc is read from.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DiscSource {
    Physical,
    Image,
}

/// This struct holds everything the drive knows about the mounted disc and its
/// play position.
pub struct DriveState {

    // Whether a disc is mounted, and from where.
    loaded: bool,
    source: Option<DiscSource>,

    // The layout of the mounted disc.
    toc: Toc,

    // The play position.
    current_track_index: usize,
    current_lba: i32,

    // Set while the position is not inside an audio track, which mutes CDDA reads.
    is_data: bool,

    // The audio position, and the bytes already delivered of the current frame.
    audio_read_lba: i32,
    audio_offset: usize,

    // The image, when one is the mounted source.
    image: Option<Box<dyn ImageSource>>,
}

/// Implementation functions for the drive state.
impl DriveState {

    /// Creates a new, unloaded drive state.
    pub fn new() -> Self {
        DriveState {
            loaded: false,
            source: None,
            toc: Toc::new(),
            current_track_index: 0,
            current_lba: 0,
            is_data: true,
            audio_read_lba: 0,
            audio_offset: 0,
            image: None,
        }
    }

    /// Drops the mounted disc and returns to the initial state.
    pub(super) fn unload(&mut self) {
        *self = DriveState::new();
    }

    /// Mounts a physical disc with the supplied table of contents.
    pub(super) fn load_physical(&mut self, toc: Toc) {
        self.unload();
        self.toc = toc;
        self.source = Some(DiscSource::Physical);
        self.loaded = true;
    }

    /// Mounts an image, taking its table of contents.
    pub(super) fn load_image(&mut self, image: Box<dyn ImageSource>) {
        self.unload();
        self.toc = image.toc().clone();
        self.image = Some(image);
        self.source = Some(DiscSource::Image);
        self.loaded = true;
    }

    /// Returns the image, if one is mounted.
    pub(super) fn image_mut(&mut self) -> Option<&mut (dyn ImageSource + 'static)> {
        self.image.as_deref_mut()
    }

    /// Returns the length of the next audio transfer. The first transfer after a
    /// seek or resume covers two frames, later ones a single frame.
    pub(super) fn next_audio_length(&mut self) -> usize {
        let audio_length = RAW_SECTOR_SIZE * 2 - self.audio_offset;
        self.audio_offset = RAW_SECTOR_SIZE;
        audio_length
    }

    /// Moves the audio position on by one frame.
    pub(super) fn step_audio_read_lba(&mut self) {
        self.audio_read_lba += 1;
    }

    /// Moves the play position to the supplied address.
    pub fn seek(&mut self, lba: i32) {
        self.current_lba = lba;
        self.current_track_index = self.toc.track_index_for_lba(lba);
        self.audio_read_lba = lba;
        self.audio_offset = 0;
        self.is_data = true;
    }

    /// Plays one sector, moving to the next track when the current one ends.
    /// Returns false once the position is past the final track.
    pub fn advance(&mut self) -> bool {
        let Some(track) = self.current_track().copied() else {
            return false;
        };

        if track.track_type == TrackType::Audio && self.current_lba >= track.start_lba {
            self.is_data = false;
        }

        self.current_lba += 1;
        self.audio_read_lba += 1;

        if self.current_lba > track.end_lba {
            self.current_track_index += 1;
            self.is_data = true;
        }

        true
    }

    /// Stops audio output while keeping the position.
    pub fn pause(&mut self) {
        self.is_data = true;
    }

    /// Restarts audio output with a fresh two-frame transfer.
    pub fn resume(&mut self) {
        self.audio_offset = 0;
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn source(&self) -> Option<DiscSource> {
        self.source
    }

    pub fn toc(&self) -> &Toc {
        &self.toc
    }

    pub fn current_track_index(&self) -> usize {
        self.current_track_index
    }

    /// Returns the track holding the play position, if it is on the disc.
    pub fn current_track(&self) -> Option<&Track> {
        self.toc.track(self.current_track_index)
    }

    pub fn current_lba(&self) -> i32 {
        self.current_lba
    }

    /// Returns the play position as the absolute time the drive reports.
    pub fn current_msf(&self) -> Msf {
        lba_to_msf(self.current_lba)
    }

    pub fn is_data(&self) -> bool {
        self.is_data
    }

    pub fn audio_read_lba(&self) -> i32 {
        self.audio_read_lba
    }
}
