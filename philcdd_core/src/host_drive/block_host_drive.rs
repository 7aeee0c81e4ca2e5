// SPDX-License-Identifier: GPL-3.0
// block_host_drive.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    cell::Cell,
    fs::{self, File, Metadata, OpenOptions},
    io::{self, Read, Seek, SeekFrom},
    os::unix::fs::{FileTypeExt, OpenOptionsExt},
    path::{Path, PathBuf},
    thread,
    time::Duration,
};

use log::debug;
use philcdd_utility::{DATA_SECTOR_SIZE, RAW_SECTOR_SIZE};

use super::{DriveId, HostDrive, MediaType, RawTrack};
use crate::media_probe::identify_disc;

/// This module contains the Linux CD-ROM ioctls used on real optical drives.
mod cdrom_ioctl;

/// The number of drive slots probed by default.
const DEFAULT_DRIVE_COUNT: u8 = 4;

/// How many times a busy device is retried before a read is abandoned.
const BUSY_RETRIES: u32 = 3000;

/// How long to wait between busy retries.
const BUSY_RETRY_DELAY: Duration = Duration::from_millis(1);

/// What a configured device path turned out to be.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
enum DeviceKind {

    /// An optical drive, queried through CD-ROM ioctls.
    Optical,

    /// A raw dump of 2048-byte sectors standing in for a data disc.
    Dump,
}

/// This struct exposes the host's optical drives, or raw 2048-byte sector dumps
/// standing in for them. Block devices get their presence, track listing and
/// audio frames from the CD-ROM ioctls. A dump is present while it holds a
/// sector, reports the whole file as one data track, and has no audio. The
/// device is reopened on every call, so media changes are always observed live,
/// but the disc type is identified once per insertion.
pub struct BlockHostDrive {

    // Device path for each drive index.
    device_paths: Vec<PathBuf>,

    // Disc type of the current insertion for each drive, once identified.
    disc_types: Vec<Cell<Option<MediaType>>>,
}

/// Implementation functions for the block-device host drive.
impl BlockHostDrive {

    /// Creates a new host drive mapping drive N to /dev/srN.
    pub fn new() -> Self {
        BlockHostDrive {
            device_paths: (0..DEFAULT_DRIVE_COUNT)
                .map(|index| PathBuf::from(format!("/dev/sr{index}")))
                .collect(),
            disc_types: (0..DEFAULT_DRIVE_COUNT).map(|_| Cell::new(None)).collect(),
        }
    }

    /// Points the given drive index at a different device or image dump.
    pub fn set_device_path(&mut self, drive: DriveId, path: &Path) {
        let index = drive.0 as usize;
        if index >= self.device_paths.len() {
            self.device_paths.resize(index + 1, PathBuf::new());
            self.disc_types.resize_with(index + 1, || Cell::new(None));
        }
        self.device_paths[index] = path.to_path_buf();
        self.disc_types[index].set(None);
    }

    /// Returns the device path for a drive, if one is configured.
    pub fn device_path(&self, drive: DriveId) -> Option<&Path> {
        self.device_paths
            .get(drive.0 as usize)
            .map(PathBuf::as_path)
            .filter(|path| !path.as_os_str().is_empty())
    }

    /// Works out what the device path of a drive currently points at.
    fn device_kind(&self, drive: DriveId) -> Option<(DeviceKind, Metadata)> {
        let metadata = fs::metadata(self.device_path(drive)?).ok()?;
        let file_type = metadata.file_type();

        if file_type.is_block_device() {
            Some((DeviceKind::Optical, metadata))
        } else if file_type.is_file() {
            Some((DeviceKind::Dump, metadata))
        } else {
            None
        }
    }

    /// Opens the device for a drive without waiting for the tray.
    fn open(&self, drive: DriveId) -> io::Result<File> {
        match self.device_path(drive) {
            Some(path) => OpenOptions::new()
                .read(true)
                .custom_flags(libc::O_NONBLOCK)
                .open(path),
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no device configured")),
        }
    }

    /// Checks presence without reading the disc.
    fn media_present(&self, drive: DriveId) -> bool {
        match self.device_kind(drive) {
            Some((DeviceKind::Optical, _)) => self
                .open(drive)
                .and_then(|file| cdrom_ioctl::drive_status(&file))
                .is_ok_and(|status| status == cdrom_ioctl::CDS_DISC_OK),
            Some((DeviceKind::Dump, metadata)) => metadata.len() >= DATA_SECTOR_SIZE as u64,
            None => false,
        }
    }

    fn disc_type_slot(&self, drive: DriveId) -> Option<&Cell<Option<MediaType>>> {
        self.disc_types.get(drive.0 as usize)
    }

    /// Reads data from the given sector, retrying while the device reports busy.
    fn read_data(&self, drive: DriveId, lba: i32, buffer: &mut [u8]) -> io::Result<usize> {
        if lba < 0 {
            return Ok(0);
        }

        let mut file = self.open(drive)?;
        file.seek(SeekFrom::Start(lba as u64 * DATA_SECTOR_SIZE as u64))?;

        let length = buffer.len().min(DATA_SECTOR_SIZE);
        let mut retries = BUSY_RETRIES;
        loop {
            match file.read(&mut buffer[..length]) {
                Ok(bytes_read) => return Ok(bytes_read),
                Err(error) if is_busy(&error) && retries > 0 => {
                    retries -= 1;
                    thread::sleep(BUSY_RETRY_DELAY);
                }
                Err(error) => {
                    debug!("Read error on drive {drive} at LBA {lba}: {error}");
                    return Err(error);
                }
            }
        }
    }
}

/// Returns whether an error just means the device has not settled yet.
fn is_busy(error: &io::Error) -> bool {
    matches!(
        error.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::ResourceBusy | io::ErrorKind::Interrupted
    )
}

/// Implementation functions to be called from anything that understands what
/// a HostDrive object is.
impl HostDrive for BlockHostDrive {

    /// Presence comes from the drive status, so no sector is read. Seeing the
    /// drive empty ends the current insertion.
    fn has_media(&self, drive: DriveId) -> bool {
        let present = self.media_present(drive);
        if !present {
            if let Some(slot) = self.disc_type_slot(drive) {
                slot.set(None);
            }
        }

        present
    }

    /// The disc type is derived from its system headers on the first call of
    /// each insertion, and remembered until the disc is removed.
    fn media_type(&self, drive: DriveId) -> MediaType {
        if !self.has_media(drive) {
            return MediaType::None;
        }
        if let Some(media_type) = self.disc_type_slot(drive).and_then(Cell::get) {
            return media_type;
        }

        let media_type = identify_disc(|lba, buffer| {
            matches!(self.read_data(drive, lba, buffer), Ok(bytes_read) if bytes_read > 0)
        });
        debug!("Drive {drive} holds {media_type:?}");

        if let Some(slot) = self.disc_type_slot(drive) {
            slot.set(Some(media_type));
        }

        media_type
    }

    /// Optical drives report their real track listing. A dump is one data track
    /// covering the whole file.
    fn read_toc(&self, drive: DriveId, max_tracks: usize) -> io::Result<Vec<RawTrack>> {
        match self.device_kind(drive) {
            Some((DeviceKind::Optical, _)) => {
                let file = self.open(drive)?;
                cdrom_ioctl::read_toc(&file, max_tracks)
            },
            Some((DeviceKind::Dump, metadata)) => {
                let sector_count = (metadata.len() / DATA_SECTOR_SIZE as u64).min(i32::MAX as u64) as i32;
                if sector_count == 0 || max_tracks == 0 {
                    return Ok(vec![]);
                }

                Ok(vec![RawTrack {
                    start_lba: 0,
                    end_lba: sector_count - 1,
                    is_data: true,
                }])
            },
            None => Err(io::Error::new(io::ErrorKind::NotFound, "no device present")),
        }
    }

    /// Reads a data sector, or audio frames when the buffer is a whole number of
    /// raw sectors. Audio frames only exist on optical drives.
    fn read_sector(&self, drive: DriveId, lba: i32, buffer: &mut [u8]) -> io::Result<usize> {
        let is_audio = !buffer.is_empty() && buffer.len() % RAW_SECTOR_SIZE == 0;
        if !is_audio {
            return self.read_data(drive, lba, buffer);
        }

        match self.device_kind(drive) {
            Some((DeviceKind::Optical, _)) => {
                let file = self.open(drive)?;
                cdrom_ioctl::read_audio(&file, lba, buffer).inspect_err(|error| {
                    debug!("Audio read error on drive {drive} at LBA {lba}: {error}");
                })
            },
            _ => Err(io::Error::new(
                io::ErrorKind::Unsupported,
                "audio frames are only readable from an optical drive",
            )),
        }
    }
}
