// SPDX-License-Identifier: GPL-3.0
// cdrom_ioctl.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    fs::File,
    io,
    os::fd::AsRawFd,
};

use libc::{c_int, c_ulong};
use log::debug;
use philcdd_utility::RAW_SECTOR_SIZE;

use crate::host_drive::RawTrack;

// Request numbers and values from the Linux CD-ROM interface.
const CDROMREADTOCHDR: c_ulong = 0x5305;
const CDROMREADTOCENTRY: c_ulong = 0x5306;
const CDROMREADAUDIO: c_ulong = 0x530E;
const CDROM_DRIVE_STATUS: c_ulong = 0x5326;
const CDROM_LBA: u8 = 0x01;
const CDROM_LEADOUT: u8 = 0xAA;
const CDROM_DATA_TRACK: u8 = 0x04;

/// The drive status reported when a disc is inserted and readable.
pub(super) const CDS_DISC_OK: c_int = 4;

/// The first and last track numbers of the disc.
#[repr(C)]
#[derive(Default)]
struct TocHeader {
    first_track: u8,
    last_track: u8,
}

/// One table of contents entry, always requested in LBA form.
#[repr(C)]
#[derive(Default)]
#[allow(dead_code)]
struct TocEntry {
    track: u8,

    // Address type in the low nibble, control bits in the high nibble.
    adr_ctrl: u8,
    format: u8,
    lba: c_int,
    data_mode: u8,
}

impl TocEntry {
    fn is_data(&self) -> bool {
        (self.adr_ctrl >> 4) & CDROM_DATA_TRACK != 0
    }
}

/// A request for consecutive CDDA frames. Only the kernel reads it.
#[repr(C)]
#[allow(dead_code)]
struct ReadAudio {
    lba: c_int,
    addr_format: u8,
    frame_count: c_int,
    buffer: *mut u8,
}

/// Turns a negative ioctl result into the OS error behind it.
fn check(result: c_int) -> io::Result<c_int> {
    if result < 0 {
        Err(io::Error::last_os_error())
    } else {
        Ok(result)
    }
}

/// Returns the drive status, which is `CDS_DISC_OK` once a disc can be read.
pub(super) fn drive_status(file: &File) -> io::Result<c_int> {

    // SAFETY: the status request takes a slot number by value and writes nothing.
    check(unsafe { libc::ioctl(file.as_raw_fd(), CDROM_DRIVE_STATUS as _, 0 as c_int) })
}

fn read_toc_entry(file: &File, track: u8) -> io::Result<TocEntry> {
    let mut entry = TocEntry {
        track,
        format: CDROM_LBA,
        ..Default::default()
    };

    // SAFETY: entry is a properly laid out cdrom_tocentry the kernel fills in.
    check(unsafe {
        libc::ioctl(file.as_raw_fd(), CDROMREADTOCENTRY as _, &mut entry as *mut TocEntry)
    })?;

    Ok(entry)
}

/// Reads up to `max_tracks` tracks. Each track ends one sector before the next
/// one starts, and the last one before the lead-out. Unreadable entries are
/// skipped.
pub(super) fn read_toc(file: &File, max_tracks: usize) -> io::Result<Vec<RawTrack>> {
    let mut header = TocHeader::default();

    // SAFETY: header is a properly laid out cdrom_tochdr the kernel fills in.
    check(unsafe {
        libc::ioctl(file.as_raw_fd(), CDROMREADTOCHDR as _, &mut header as *mut TocHeader)
    })?;

    let mut entries = vec![];
    for track in header.first_track..=header.last_track {
        match read_toc_entry(file, track) {
            Ok(entry) => entries.push(entry),
            Err(error) => debug!("Skipping TOC entry {track}: {error}"),
        }
    }
    let lead_out = read_toc_entry(file, CDROM_LEADOUT)?;

    let tracks = entries
        .iter()
        .enumerate()
        .take(max_tracks)
        .map(|(position, entry)| RawTrack {
            start_lba: entry.lba,
            end_lba: entries.get(position + 1).map_or(lead_out.lba, |next| next.lba) - 1,
            is_data: entry.is_data(),
        })
        .collect();

    Ok(tracks)
}

/// Reads as many whole CDDA frames as fit in the buffer.
pub(super) fn read_audio(file: &File, lba: i32, buffer: &mut [u8]) -> io::Result<usize> {
    let frame_count = buffer.len() / RAW_SECTOR_SIZE;
    let mut request = ReadAudio {
        lba,
        addr_format: CDROM_LBA,
        frame_count: frame_count as c_int,
        buffer: buffer.as_mut_ptr(),
    };

    // SAFETY: the buffer holds frame_count whole frames and outlives the call.
    check(unsafe {
        libc::ioctl(file.as_raw_fd(), CDROMREADAUDIO as _, &mut request as *mut ReadAudio)
    })?;

    Ok(frame_count * RAW_SECTOR_SIZE)
}
