// SPDX-License-Identifier: GPL-3.0
// main.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// This file is the core of the basic client - it exists merely as a CLI-based
// program to watch a host CD drive, mount discs and images, and report what the
// emulated drive sees. In due course, it will be driven by a full console core.

use std::{path::PathBuf, thread, time::Duration};

use clap::Parser;
use log::{error, info};
use philcdd_core::{
    bios::{BiosFallbackPolicy, FileBiosLoader},
    cdrom_drive::{
        CDDA_BUFFER_SIZE, CdromDrive, DATA_BUFFER_SIZE, DriveConfig,
        mega_cdrom_drive::MegaCdromDrive,
    },
    host_drive::{DriveId, block_host_drive::BlockHostDrive},
    toc::TrackType,
};

#[derive(Parser)]
#[command(
    version,
    about = "A basic barebones UI for the PhilCDD disc passthrough drive",
    long_about = None
)]
struct PhilCddArgs {
    #[arg(
        long = "cd",
        help = "An optional CD Cue or ISO file, mounted instead of the host disc",
        id = "Image file"
    )]
    cd: Option<PathBuf>,

    #[arg(
        long = "device",
        help = "The block device (or raw sector dump) standing in for the host drive",
        id = "Device"
    )]
    device: Option<PathBuf>,

    #[arg(
        long = "drive",
        help = "The host drive index to pass through",
        default_value_t = 0
    )]
    drive: u8,

    #[arg(
        long = "polls",
        help = "How many poll ticks to run before exiting",
        default_value_t = 10
    )]
    polls: u32,

    #[arg(
        long = "interval-ms",
        help = "Delay between poll ticks in milliseconds",
        default_value_t = 500
    )]
    interval_ms: u64,

    #[arg(
        long = "strict-bios-fallback",
        help = "Only search the well-known BIOS locations when no image path is given"
    )]
    strict_bios_fallback: bool,
}

fn main() {
    colog::init();

    let philcdd_args = PhilCddArgs::parse();
    let drive_id = DriveId(philcdd_args.drive);

    let mut host = BlockHostDrive::new();
    if let Some(device) = &philcdd_args.device {
        host.set_device_path(drive_id, device);
    }

    let mut config = DriveConfig::new();
    config.drive_id = drive_id;
    if philcdd_args.strict_bios_fallback {
        config.bios_fallback = BiosFallbackPolicy::EmptyPathOnly;
    }

    let mut cdrom_drive = MegaCdromDrive::new(host, config, Box::new(FileBiosLoader::new()));

    if let Some(image_path) = &philcdd_args.cd {
        if let Err(error) = cdrom_drive.set_image(image_path) {
            error!("Could not mount {}: {error}", image_path.display());
        }
    }

    let mut was_loaded = cdrom_drive.is_loaded();
    if was_loaded {
        report_first_sectors(&mut cdrom_drive);
    }

    for _ in 0..philcdd_args.polls {
        cdrom_drive.poll();

        let loaded = cdrom_drive.is_loaded();
        if loaded && !was_loaded {
            report_first_sectors(&mut cdrom_drive);
        } else if !loaded && was_loaded {
            info!("Disc unloaded");
        }
        was_loaded = loaded;

        thread::sleep(Duration::from_millis(philcdd_args.interval_ms));
    }
}

/// Logs the disc layout, and reads the first sector of the first data track and
/// a frame of the first audio track.
fn report_first_sectors(cdrom_drive: &mut MegaCdromDrive<BlockHostDrive>) {
    let tracks = cdrom_drive.state().toc().tracks().to_vec();
    for (number, track) in tracks.iter().enumerate() {
        info!(
            "Track {}: {:?} {}..={}",
            number + 1,
            track.track_type,
            track.start_lba,
            track.end_lba
        );
    }

    if let Some(track) = tracks.iter().find(|track| track.track_type == TrackType::Data) {
        let mut sector = [0_u8; DATA_BUFFER_SIZE];
        cdrom_drive.state_mut().seek(track.start_lba);
        cdrom_drive.read_data(&mut sector);

        let header = String::from_utf8_lossy(&sector[..16]).into_owned();
        let msf = cdrom_drive.state().current_msf();
        info!(
            "First data sector at {:02}:{:02}:{:02}, header: {header:?}",
            msf.minute,
            msf.second,
            msf.frame
        );
    }

    if let Some(track) = tracks.iter().find(|track| track.track_type == TrackType::Audio) {
        let mut frames = [0_u8; CDDA_BUFFER_SIZE];
        cdrom_drive.state_mut().seek(track.start_lba);
        cdrom_drive.state_mut().advance();
        let length = cdrom_drive.read_cdda(&mut frames);
        let silent = frames[..length].iter().all(|&byte| byte == 0);

        info!("First audio transfer: {length} bytes, silent: {silent}");
    }

    cdrom_drive.state_mut().seek(0);
}
