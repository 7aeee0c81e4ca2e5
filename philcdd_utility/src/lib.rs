// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// This crate contains useful utility functions for CD addressing that can be used
// throughout the codebase.

/// The number of user data bytes in a Mode 1 data sector.
pub const DATA_SECTOR_SIZE: usize = 2048;

/// The number of bytes in a raw sector, which is also the size of one CDDA frame.
pub const RAW_SECTOR_SIZE: usize = 2352;

/// The number of sectors (frames) per second of disc time.
pub const FRAMES_PER_SECOND: i32 = 75;

/// The number of seconds per minute of disc time.
pub const SECONDS_PER_MINUTE: i32 = 60;

/// The two second lead-in that separates absolute MSF time from LBA zero.
pub const LEAD_IN_FRAMES: i32 = 150;

/// This struct represents a minute/second/frame disc address.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct Msf {
    pub minute: u8,
    pub second: u8,
    pub frame: u8,
}

impl Msf {

    /// Creates a new MSF address from its three components.
    pub fn new(minute: u8, second: u8, frame: u8) -> Self {
        Msf {
            minute,
            second,
            frame,
        }
    }

    /// Converts this address to a frame count, without any lead-in adjustment.
    pub fn to_frames(self) -> i32 {
        (self.minute as i32) * SECONDS_PER_MINUTE * FRAMES_PER_SECOND
            + (self.second as i32) * FRAMES_PER_SECOND
            + (self.frame as i32)
    }

    /// Converts a frame count to an address. Negative counts clamp to zero and
    /// minutes saturate at 255.
    pub fn from_frames(frames: i32) -> Self {
        let frames = frames.max(0);
        let minute = (frames / FRAMES_PER_SECOND) / SECONDS_PER_MINUTE;

        Msf {
            minute: minute.min(u8::MAX as i32) as u8,
            second: ((frames / FRAMES_PER_SECOND) % SECONDS_PER_MINUTE) as u8,
            frame: (frames % FRAMES_PER_SECOND) as u8,
        }
    }

    /// Parses the `mm:ss:ff` form used by cue sheets.
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split(':');
        let minute = parts.next()?.parse::<u8>().ok()?;
        let second = parts.next()?.parse::<u8>().ok()?;
        let frame = parts.next()?.parse::<u8>().ok()?;

        if parts.next().is_some()
            || second as i32 >= SECONDS_PER_MINUTE
            || frame as i32 >= FRAMES_PER_SECOND
        {
            return None;
        }

        Some(Msf::new(minute, second, frame))
    }
}

/// Converts a logical block address to the absolute MSF time the drive reports,
/// which includes the lead-in.
pub fn lba_to_msf(lba: i32) -> Msf {
    Msf::from_frames(lba + LEAD_IN_FRAMES)
}

/// Returns the number of whole raw sectors spanned by the supplied byte length.
#[inline(always)]
pub fn raw_sectors_in(length: usize) -> usize {
    length / RAW_SECTOR_SIZE
}
