// SPDX-License-Identifier: GPL-3.0
// mega_cdrom_drive.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

/// This module contains the state of the mounted disc and the play position.
pub mod drive_state;

use std::path::{Path, PathBuf};

use log::{debug, info, trace, warn};
use philcdd_utility::raw_sectors_in;

use super::{CDDA_BUFFER_SIZE, CdromDrive, DATA_BUFFER_SIZE, DriveConfig};
use crate::{
    auto_load::{AutoLoadAction, AutoLoadSequencer},
    bios::{BiosLoader, BiosResolver},
    cd_image::{ImageSource, open_image},
    error::CddError,
    host_drive::HostDrive,
    media_probe::probe,
    toc::{TrackType, build_toc},
};
use drive_state::{DiscSource, DriveState};

/// This struct models the Mega CD drive, reading either from a disc image or
/// from a physical disc in a host drive.
pub struct MegaCdromDrive<H: HostDrive> {

    // The host drive passed through, and the settings we were created with.
    host: H,
    config: DriveConfig,

    // The mounted disc and play position.
    state: DriveState,

    // Decides when an inserted disc is mounted.
    sequencer: AutoLoadSequencer,

    // Finds and loads the CD BIOS on each mount.
    bios_resolver: BiosResolver,
    bios_loader: Box<dyn BiosLoader>,

    // The most recent non-empty image path, which locates the BIOS.
    last_path: Option<PathBuf>,
}

/// Implementation functions for the drive itself.
impl<H: HostDrive> MegaCdromDrive<H> {

    /// Creates a new drive with nothing mounted.
    pub fn new(host: H, config: DriveConfig, bios_loader: Box<dyn BiosLoader>) -> Self {
        MegaCdromDrive {
            host,
            bios_resolver: BiosResolver::with_candidates(config.bios_candidates.clone()),
            config,
            state: DriveState::new(),
            sequencer: AutoLoadSequencer::new(),
            bios_loader,
            last_path: None,
        }
    }

    /// Mounts an image that has already been opened. The BIOS is left as is.
    pub fn mount_image(&mut self, image: Box<dyn ImageSource>) {
        info!("Image mounted, last track {}", image.toc().track_count());
        self.state.load_image(image);
    }

    pub fn state(&self) -> &DriveState {
        &self.state
    }

    /// Gives access to the play position controls.
    pub fn state_mut(&mut self) -> &mut DriveState {
        &mut self.state
    }

    pub fn sequencer(&self) -> &AutoLoadSequencer {
        &self.sequencer
    }

    pub fn last_path(&self) -> Option<&Path> {
        self.last_path.as_deref()
    }

    /// Reads from the physical disc, failing on an error or an empty read.
    fn read_physical(&self, lba: i32, buffer: &mut [u8]) -> Result<(), CddError> {
        let drive = self.config.drive_id;
        match self.host.read_sector(drive, lba, buffer) {
            Ok(bytes_read) if bytes_read > 0 => Ok(()),
            Ok(_) => Err(CddError::TransientRead { drive, lba }),
            Err(error) => {
                debug!("Host read error on drive {drive}: {error}");
                Err(CddError::TransientRead { drive, lba })
            }
        }
    }

    /// Mounts the physical disc from its table of contents.
    fn mount_physical(&mut self) -> Result<(), CddError> {
        let drive = self.config.drive_id;
        if !probe(&self.host, drive).allows_auto_load() {
            return Err(CddError::NoMedia(drive));
        }

        let toc = build_toc(&self.host, drive)?;
        info!(
            "Physical CD mounted via TOC, last track {} disc end {}",
            toc.track_count(),
            toc.disc_end_lba()
        );
        self.state.load_physical(toc);

        Ok(())
    }
}

/// Implementation functions to be called from anything that understands what
/// a CdromDrive object is.
impl<H: HostDrive> CdromDrive for MegaCdromDrive<H> {

    /// Unloads a physical disc once it is gone, then lets the sequencer decide
    /// whether to mount one. A failed mount is not retried until the disc is
    /// removed and inserted again.
    fn poll(&mut self) {
        let drive = self.config.drive_id;
        let media = probe(&self.host, drive);

        if !media.present && self.state.source() == Some(DiscSource::Physical) {
            info!("Physical disc removed from drive {drive}, unloading");
            self.state.unload();
        }

        if self.sequencer.tick(media, self.state.is_loaded()) == AutoLoadAction::Mount {
            if let Err(error) = self.set_image(Path::new("")) {
                warn!("Auto-load from drive {drive} failed: {error}");
            }
        }
    }

    /// Loads the BIOS, then mounts either the image or, for an empty path, the
    /// physical disc. The previous disc is only replaced once the new one has
    /// been read, so any failure leaves it mounted.
    fn set_image(&mut self, path: &Path) -> Result<(), CddError> {
        let path_is_empty = path.as_os_str().is_empty();
        if !path_is_empty {
            self.last_path = Some(path.to_path_buf());
        }

        let media = probe(&self.host, self.config.drive_id);
        let extended = self
            .config
            .bios_fallback
            .allows_extended_search(path_is_empty, media.present);
        self.bios_resolver
            .resolve(self.bios_loader.as_mut(), self.last_path.as_deref(), extended)?;

        if path_is_empty {
            self.mount_physical()
        } else {
            let image = open_image(path)?;
            self.mount_image(image);
            Ok(())
        }
    }

    /// A physical disc of the target format always wins over the image.
    /// Positions outside a data track produce no read.
    fn read_data(&mut self, buffer: &mut [u8; DATA_BUFFER_SIZE]) {
        let is_data_track = self
            .state
            .current_track()
            .is_some_and(|track| track.track_type == TrackType::Data);
        let lba = self.state.current_lba();
        if !is_data_track || lba < 0 {
            return;
        }

        if probe(&self.host, self.config.drive_id).allows_data_passthrough() {
            trace!("Data read of LBA {lba} from physical disc");
            if let Err(error) = self.read_physical(lba, buffer) {
                debug!("{error}, returning an empty sector");
                buffer.fill(0);
            }
            return;
        }

        match self.state.image_mut() {
            Some(image) => {
                if let Err(error) = image.read_data(lba, buffer) {
                    debug!("Image data read of LBA {lba} failed: {error}");
                    buffer.fill(0);
                }
            },
            None => buffer.fill(0),
        }
    }

    /// Audio comes from a compatible physical disc when there is one, and from
    /// the image otherwise. A failed read produces silence. Multi-frame reads
    /// stream sequentially, so they move the audio position on by one.
    fn read_cdda(&mut self, buffer: &mut [u8; CDDA_BUFFER_SIZE]) -> usize {
        let audio_length = self.state.next_audio_length();
        if self.state.is_data() {
            return audio_length;
        }

        let lba = self.state.audio_read_lba();
        let streaming = raw_sectors_in(audio_length) > 1;
        let output = &mut buffer[..audio_length];

        if probe(&self.host, self.config.drive_id).allows_audio_passthrough() {
            trace!("Audio read of LBA {lba} from physical disc");
            match self.read_physical(lba, output) {
                Ok(()) => {
                    if streaming {
                        self.state.step_audio_read_lba();
                    }
                },
                Err(error) => {
                    debug!("{error}, returning silence");
                    output.fill(0);
                },
            }
            return audio_length;
        }

        let read_result = match self.state.image_mut() {
            Some(image) => image.read_audio(lba, output),
            None => {
                output.fill(0);
                return audio_length;
            },
        };

        match read_result {
            Ok(()) => {
                if streaming {
                    self.state.step_audio_read_lba();
                }
            },
            Err(error) => {
                debug!("Image audio read of LBA {lba} failed: {error}");
                output.fill(0);
            },
        }

        audio_length
    }

    fn is_loaded(&self) -> bool {
        self.state.is_loaded()
    }
}
