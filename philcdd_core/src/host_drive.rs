// SPDX-License-Identifier: GPL-3.0
// host_drive.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    fmt,
    io,
};

/// This module contains a host drive backed by a block device or raw sector dump.
pub mod block_host_drive;

/// This module contains a scriptable host drive used by the unit tests.
#[cfg(test)]
pub(crate) mod fake_host_drive;

/// Identifies one of the host's optical drives by index.
#[derive(Copy, Clone, PartialEq, Eq, Hash, Debug)]
pub struct DriveId(pub u8);

impl DriveId {

    /// The first optical drive on the host.
    pub const PRIMARY: DriveId = DriveId(0);
}

impl fmt::Display for DriveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The kind of disc the host reports as inserted.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum MediaType {

    /// No disc, or the drive has not settled yet.
    None,

    /// A Mega CD disc.
    TargetDisc,

    /// A disc with no recognisable system header, such as a plain audio CD.
    UnknownDisc,

    /// A disc recognised as belonging to some other system.
    OtherDisc,
}

/// One entry of the raw track listing returned by the host.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct RawTrack {
    pub start_lba: i32,
    pub end_lba: i32,
    pub is_data: bool,
}

/// This trait provides an implementation-opaque way of querying and reading the
/// host's optical drives. Every call names the drive it targets.
pub trait HostDrive {

    /// Implementations must report whether a disc is currently inserted.
    fn has_media(&self, drive: DriveId) -> bool;

    /// Implementations must report the kind of disc currently inserted.
    fn media_type(&self, drive: DriveId) -> MediaType;

    /// Implementations must return up to `max_tracks` entries of the disc's track
    /// listing, in disc order.
    fn read_toc(&self, drive: DriveId, max_tracks: usize) -> io::Result<Vec<RawTrack>>;

    /// Implementations must fill `buffer` from the given address and return the
    /// number of bytes read. A buffer length that is a multiple of the raw sector
    /// size requests audio frames, anything else requests data. Zero bytes read
    /// counts as a failure.
    fn read_sector(&self, drive: DriveId, lba: i32, buffer: &mut [u8]) -> io::Result<usize>;
}
