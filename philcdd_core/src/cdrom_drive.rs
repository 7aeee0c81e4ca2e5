// SPDX-License-Identifier: GPL-3.0
// cdrom_drive.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::path::{Path, PathBuf};

use philcdd_utility::{DATA_SECTOR_SIZE, RAW_SECTOR_SIZE};

use crate::{
    bios::{BIOS_CANDIDATES, BiosFallbackPolicy},
    error::CddError,
    host_drive::DriveId,
};

/// This module contains the default CD drive implementation, including the state
/// it keeps about the loaded disc. There may be others in future.
pub mod mega_cdrom_drive;

/// The size of the buffer handed to a data sector read.
pub const DATA_BUFFER_SIZE: usize = DATA_SECTOR_SIZE;

/// The size of the buffer handed to an audio read, which covers up to two frames.
pub const CDDA_BUFFER_SIZE: usize = RAW_SECTOR_SIZE * 2;

/// This struct holds the settings a drive is created with.
#[derive(Clone, Debug)]
pub struct DriveConfig {

    // The host drive to pass through.
    pub drive_id: DriveId,

    // When the well-known BIOS locations are searched.
    pub bios_fallback: BiosFallbackPolicy,

    // The well-known BIOS locations, in search order.
    pub bios_candidates: Vec<PathBuf>,
}

impl DriveConfig {

    /// Creates the default configuration for the primary host drive.
    pub fn new() -> Self {
        DriveConfig {
            drive_id: DriveId::PRIMARY,
            bios_fallback: BiosFallbackPolicy::EmptyPathOrMedia,
            bios_candidates: BIOS_CANDIDATES.iter().map(PathBuf::from).collect(),
        }
    }
}

/// This trait provides an implementation-opaque way of calling CD drive methods
/// from the console core.
pub trait CdromDrive {

    /// Implementations must use this to check the host drive once per tick, and
    /// mount newly inserted discs.
    fn poll(&mut self);

    /// Implementations must mount the image at the supplied path. An empty path
    /// mounts the physical disc instead.
    fn set_image(&mut self, path: &Path) -> Result<(), CddError>;

    /// Implementations must fill the buffer with the data sector at the current
    /// position.
    fn read_data(&mut self, buffer: &mut [u8; DATA_BUFFER_SIZE]);

    /// Implementations must fill the buffer with audio from the current audio
    /// position and return how many bytes of it are valid.
    fn read_cdda(&mut self, buffer: &mut [u8; CDDA_BUFFER_SIZE]) -> usize;

    /// Implementations must report whether a disc is mounted.
    fn is_loaded(&self) -> bool;
}
