// SPDX-License-Identifier: GPL-3.0
// fake_host_drive.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    cell::{Cell, RefCell},
    io,
    rc::Rc,
};

use super::{DriveId, HostDrive, MediaType, RawTrack};

/// Scriptable state shared between a test and the fake drive it hands out.
pub(crate) struct FakeMedia {
    pub present: Cell<bool>,
    pub media_type: Cell<MediaType>,
    pub tracks: RefCell<Vec<RawTrack>>,
    pub fail_toc: Cell<bool>,
    pub fail_reads: Cell<bool>,
    pub fill_byte: Cell<u8>,
    pub toc_reads: Cell<u32>,
    pub sector_reads: RefCell<Vec<(i32, usize)>>,
}

/// This struct is a host drive whose media can be changed by the test holding
/// the other end of the shared state.
#[derive(Clone)]
pub(crate) struct FakeHostDrive {
    pub media: Rc<FakeMedia>,
}

impl FakeHostDrive {

    /// Creates a fake drive with the tray empty.
    pub fn new() -> Self {
        FakeHostDrive {
            media: Rc::new(FakeMedia {
                present: Cell::new(false),
                media_type: Cell::new(MediaType::None),
                tracks: RefCell::new(vec![]),
                fail_toc: Cell::new(false),
                fail_reads: Cell::new(false),
                fill_byte: Cell::new(0xAA),
                toc_reads: Cell::new(0),
                sector_reads: RefCell::new(vec![]),
            }),
        }
    }

    /// Inserts a disc of the given type with the given track listing.
    pub fn insert(&self, media_type: MediaType, tracks: Vec<RawTrack>) {
        self.media.present.set(true);
        self.media.media_type.set(media_type);
        *self.media.tracks.borrow_mut() = tracks;
    }

    /// Removes the disc.
    pub fn eject(&self) {
        self.media.present.set(false);
        self.media.media_type.set(MediaType::None);
    }

    /// Returns the number of sector reads served so far.
    pub fn sector_read_count(&self) -> usize {
        self.media.sector_reads.borrow().len()
    }
}

/// The three-track disc used throughout the tests.
pub(crate) fn three_track_disc() -> Vec<RawTrack> {
    vec![
        RawTrack { start_lba: 0, end_lba: 99, is_data: true },
        RawTrack { start_lba: 100, end_lba: 199, is_data: false },
        RawTrack { start_lba: 200, end_lba: 299, is_data: false },
    ]
}

impl HostDrive for FakeHostDrive {

    fn has_media(&self, _drive: DriveId) -> bool {
        self.media.present.get()
    }

    fn media_type(&self, _drive: DriveId) -> MediaType {
        if self.media.present.get() {
            self.media.media_type.get()
        } else {
            MediaType::None
        }
    }

    fn read_toc(&self, _drive: DriveId, max_tracks: usize) -> io::Result<Vec<RawTrack>> {
        self.media.toc_reads.set(self.media.toc_reads.get() + 1);
        if self.media.fail_toc.get() {
            return Err(io::Error::other("toc read failed"));
        }

        Ok(self.media.tracks.borrow().iter().take(max_tracks).copied().collect())
    }

    fn read_sector(&self, _drive: DriveId, lba: i32, buffer: &mut [u8]) -> io::Result<usize> {
        self.media.sector_reads.borrow_mut().push((lba, buffer.len()));
        if self.media.fail_reads.get() || !self.media.present.get() {
            return Ok(0);
        }

        buffer.fill(self.media.fill_byte.get());
        Ok(buffer.len())
    }
}
