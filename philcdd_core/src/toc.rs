// SPDX-License-Identifier: GPL-3.0
// toc.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use log::{info, warn};

use crate::{
    error::CddError,
    host_drive::{DriveId, HostDrive, RawTrack},
};

/// The fixed capacity of a table of contents.
pub const MAX_TRACKS: usize = 100;

/// The number of tracks requested from the host when reading a physical disc.
pub const PHYSICAL_TRACK_REQUEST: usize = 99;

/// Distinguishes data tracks from CDDA tracks.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum TrackType {
    Data,
    Audio,
}

/// A single track, covering `start_lba..=end_lba`.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Track {
    pub start_lba: i32,
    pub end_lba: i32,
    pub track_type: TrackType,
}

impl Track {

    /// Returns whether the address falls inside this track.
    pub fn contains(&self, lba: i32) -> bool {
        lba >= self.start_lba && lba <= self.end_lba
    }
}

impl From<RawTrack> for Track {
    fn from(raw: RawTrack) -> Self {
        Track {
            start_lba: raw.start_lba,
            end_lba: raw.end_lba,
            track_type: if raw.is_data { TrackType::Data } else { TrackType::Audio },
        }
    }
}

/// This struct models the table of contents of the loaded disc. It is only ever
/// replaced as a whole.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Toc {

    // Tracks in disc order.
    tracks: Vec<Track>,

    // First address past the final track.
    disc_end_lba: i32,
}

impl Toc {

    /// Creates an empty table of contents.
    pub fn new() -> Self {
        Toc {
            tracks: vec![],
            disc_end_lba: 0,
        }
    }

    /// Creates a table of contents from tracks in disc order. The disc end is
    /// derived from the final track.
    pub fn from_tracks(tracks: Vec<Track>) -> Result<Self, CddError> {
        if tracks.is_empty() {
            return Err(CddError::InvalidToc("no tracks"));
        }
        if tracks.len() > MAX_TRACKS {
            return Err(CddError::InvalidToc("too many tracks"));
        }
        if tracks.iter().any(|track| track.end_lba < track.start_lba) {
            return Err(CddError::InvalidToc("track ends before it starts"));
        }
        if tracks.windows(2).any(|pair| pair[1].start_lba <= pair[0].end_lba) {
            return Err(CddError::InvalidToc("tracks out of order or overlapping"));
        }

        let disc_end_lba = tracks[tracks.len() - 1].end_lba + 1;

        Ok(Toc {
            tracks,
            disc_end_lba,
        })
    }

    /// Returns the number of tracks.
    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    /// Returns the first address past the final track.
    pub fn disc_end_lba(&self) -> i32 {
        self.disc_end_lba
    }

    /// Returns all tracks in disc order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Returns the track at the given zero-based index.
    pub fn track(&self, index: usize) -> Option<&Track> {
        self.tracks.get(index)
    }

    /// Returns whether the table holds no tracks.
    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Returns the index of the track holding the address. Addresses before the
    /// first track map to it, and addresses past the disc end map to the track
    /// count, which names no track.
    pub fn track_index_for_lba(&self, lba: i32) -> usize {
        self.tracks
            .iter()
            .position(|track| lba <= track.end_lba)
            .unwrap_or(self.tracks.len())
    }
}

/// Reads the table of contents of the physical disc in a drive. On failure the
/// caller keeps whatever table it already had.
pub fn build_toc(host: &dyn HostDrive, drive: DriveId) -> Result<Toc, CddError> {

    let raw_tracks = match host.read_toc(drive, PHYSICAL_TRACK_REQUEST) {
        Ok(raw_tracks) => raw_tracks,
        Err(error) => {
            warn!("TOC query failed on drive {drive}: {error}");
            return Err(CddError::NoToc(drive));
        }
    };

    if raw_tracks.is_empty() {
        warn!("Drive {drive} reported no tracks");
        return Err(CddError::NoToc(drive));
    }

    if raw_tracks.windows(2).any(|pair| pair[1].start_lba < pair[0].start_lba) {
        warn!("Drive {drive} reported tracks out of order");
        return Err(CddError::NoToc(drive));
    }

    // Copied as reported. Only the ordering is checked, since the host derives
    // each end from the following start.
    let tracks: Vec<Track> = raw_tracks
        .into_iter()
        .take(PHYSICAL_TRACK_REQUEST)
        .map(Track::from)
        .collect();

    for (number, track) in tracks.iter().enumerate() {
        info!(
            "Physical track {}: start {} end {} type {:?}",
            number + 1,
            track.start_lba,
            track.end_lba,
            track.track_type
        );
    }

    let disc_end_lba = tracks[tracks.len() - 1].end_lba + 1;
    info!("Physical disc TOC read: last track {} disc end {}", tracks.len(), disc_end_lba);

    Ok(Toc {
        tracks,
        disc_end_lba,
    })
}
