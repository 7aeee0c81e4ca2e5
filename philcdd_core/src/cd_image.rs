// SPDX-License-Identifier: GPL-3.0
// cd_image.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    io,
    path::Path,
};

use crate::{
    error::CddError,
    toc::Toc,
};

/// This module contains the cue sheet and ISO image implementation.
pub mod cue_image;

use cue_image::CueImage;

/// This trait provides an implementation-opaque way of reading sectors from a
/// disc image, so that different image formats can be supported.
pub trait ImageSource {

    /// Implementations must return the table of contents of the image.
    fn toc(&self) -> &Toc;

    /// Implementations must fill the buffer with the user data of the data
    /// sector at the given address.
    fn read_data(&mut self, lba: i32, buffer: &mut [u8]) -> io::Result<()>;

    /// Implementations must fill the buffer with consecutive CDDA frames starting
    /// at the given address. Frames past the end of the image read as silence.
    fn read_audio(&mut self, lba: i32, buffer: &mut [u8]) -> io::Result<()>;
}

/// Opens a disc image, choosing the format from the file extension.
pub fn open_image(path: &Path) -> Result<Box<dyn ImageSource>, CddError> {
    let extension = path
        .extension()
        .and_then(|extension| extension.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("cue") => Ok(Box::new(CueImage::open_cue(path)?)),
        Some("iso") => Ok(Box::new(CueImage::open_iso(path)?)),
        _ => Err(CddError::UnsupportedImage(path.to_path_buf())),
    }
}
