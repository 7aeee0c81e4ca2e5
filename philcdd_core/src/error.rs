// SPDX-License-Identifier: GPL-3.0
// error.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    io,
    path::PathBuf,
};

use crate::host_drive::DriveId;

/// Enumerates the ways a drive operation can fail. The `Display` trait prints the
/// equivalent long message.
#[derive(thiserror::Error, Debug)]
pub enum CddError {
    #[error("no table of contents could be read from drive {0}")]
    NoToc(DriveId),
    #[error("no CD BIOS image could be found")]
    BiosNotFound,
    #[error("sector read failed on drive {drive} at LBA {lba}")]
    TransientRead { drive: DriveId, lba: i32 },
    #[error("no compatible media present in drive {0}")]
    NoMedia(DriveId),
    #[error("unsupported image type: {}", .0.display())]
    UnsupportedImage(PathBuf),
    #[error("malformed cue sheet: {0}")]
    CueSheet(String),
    #[error("invalid table of contents: {0}")]
    InvalidToc(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}
