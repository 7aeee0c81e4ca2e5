// SPDX-License-Identifier: GPL-3.0
// tests.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{fs, path::Path};

use philcdd_utility::{DATA_SECTOR_SIZE, RAW_SECTOR_SIZE};

use super::CueImage;
use crate::{
    cd_image::{ImageSource, open_image},
    error::CddError,
    toc::{Track, TrackType},
};

// Tests for cue sheet and ISO images.

/// Writes a track file whose sectors each hold their own index, behind a
/// 16 byte header filled with 0xEE.
fn write_track_file(path: &Path, sector_size: usize, sectors: usize, first_value: u8) {
    let mut contents = vec![0_u8; sector_size * sectors];
    for (index, sector) in contents.chunks_mut(sector_size).enumerate() {
        sector.fill(first_value + index as u8);
        if sector_size == RAW_SECTOR_SIZE {
            sector[..16].fill(0xEE);
        }
    }
    fs::write(path, contents).unwrap();
}

fn track(start_lba: i32, end_lba: i32, track_type: TrackType) -> Track {
    Track { start_lba, end_lba, track_type }
}

#[test]
fn test_single_file_cue_layout() {

    let directory = tempfile::tempdir().unwrap();
    write_track_file(&directory.path().join("game.bin"), RAW_SECTOR_SIZE, 20, 0);
    let cue = directory.path().join("game.cue");
    fs::write(&cue, concat!(
        "FILE \"game.bin\" BINARY\n",
        "  TRACK 01 MODE1/2352\n",
        "    INDEX 01 00:00:00\n",
        "  TRACK 02 AUDIO\n",
        "    INDEX 00 00:00:08\n",
        "    INDEX 01 00:00:10\n",
        "  TRACK 03 AUDIO\n",
        "    INDEX 01 00:00:15\n",
    )).unwrap();

    let image = CueImage::open_cue(&cue).unwrap();

    assert_eq!(image.toc().tracks(), &[
        track(0, 9, TrackType::Data),
        track(10, 14, TrackType::Audio),
        track(15, 19, TrackType::Audio),
    ]);
    assert_eq!(image.toc().disc_end_lba(), 20);
}

#[test]
fn test_mode1_2352_data_read_skips_sector_header() {

    let directory = tempfile::tempdir().unwrap();
    write_track_file(&directory.path().join("game.bin"), RAW_SECTOR_SIZE, 10, 0);
    let cue = directory.path().join("game.cue");
    fs::write(&cue, "FILE game.bin BINARY\nTRACK 01 MODE1/2352\nINDEX 01 00:00:00\n").unwrap();

    let mut image = CueImage::open_cue(&cue).unwrap();
    let mut buffer = [0_u8; DATA_SECTOR_SIZE];
    image.read_data(3, &mut buffer).unwrap();

    assert!(buffer.iter().all(|&byte| byte == 3));
}

#[test]
fn test_audio_read_pads_past_end_with_silence() {

    let directory = tempfile::tempdir().unwrap();
    write_track_file(&directory.path().join("audio.bin"), RAW_SECTOR_SIZE, 4, 1);
    let cue = directory.path().join("audio.cue");
    fs::write(&cue, "FILE \"audio.bin\" BINARY\nTRACK 01 AUDIO\nINDEX 01 00:00:00\n").unwrap();

    let mut image = CueImage::open_cue(&cue).unwrap();
    let mut buffer = [0x55_u8; RAW_SECTOR_SIZE * 2];
    image.read_audio(3, &mut buffer).unwrap();

    assert_eq!(buffer[RAW_SECTOR_SIZE - 1], 4);
    assert!(buffer[RAW_SECTOR_SIZE..].iter().all(|&byte| byte == 0));
}

#[test]
fn test_multi_file_cue_with_pregap() {

    let directory = tempfile::tempdir().unwrap();
    write_track_file(&directory.path().join("track01.bin"), DATA_SECTOR_SIZE, 4, 0);
    write_track_file(&directory.path().join("track02.bin"), RAW_SECTOR_SIZE, 3, 0x40);
    let cue = directory.path().join("game.cue");
    fs::write(&cue, concat!(
        "FILE \"track01.bin\" BINARY\n",
        "  TRACK 01 MODE1/2048\n",
        "    INDEX 01 00:00:00\n",
        "FILE \"track02.bin\" BINARY\n",
        "  TRACK 02 AUDIO\n",
        "    PREGAP 00:02:00\n",
        "    INDEX 01 00:00:00\n",
    )).unwrap();

    let mut image = CueImage::open_cue(&cue).unwrap();

    assert_eq!(image.toc().tracks(), &[
        track(0, 153, TrackType::Data),
        track(154, 156, TrackType::Audio),
    ]);
    assert_eq!(image.toc().disc_end_lba(), 157);

    let mut buffer = [0_u8; RAW_SECTOR_SIZE];
    image.read_audio(155, &mut buffer).unwrap();
    assert_eq!(buffer[100], 0x41);
}

#[test]
fn test_missing_track_is_rejected() {

    let directory = tempfile::tempdir().unwrap();
    write_track_file(&directory.path().join("game.bin"), RAW_SECTOR_SIZE, 4, 0);
    let cue = directory.path().join("game.cue");
    fs::write(&cue, "FILE game.bin BINARY\nTRACK 02 AUDIO\nINDEX 01 00:00:00\n").unwrap();

    assert!(matches!(CueImage::open_cue(&cue), Err(CddError::CueSheet(_))));
}

#[test]
fn test_wave_files_are_rejected() {

    let directory = tempfile::tempdir().unwrap();
    write_track_file(&directory.path().join("track.wav"), RAW_SECTOR_SIZE, 4, 0);
    let cue = directory.path().join("game.cue");
    fs::write(&cue, "FILE track.wav WAVE\nTRACK 01 AUDIO\nINDEX 01 00:00:00\n").unwrap();

    assert!(matches!(CueImage::open_cue(&cue), Err(CddError::CueSheet(_))));
}

#[test]
fn test_open_image_reads_iso() {

    let directory = tempfile::tempdir().unwrap();
    let iso = directory.path().join("game.ISO");
    write_track_file(&iso, DATA_SECTOR_SIZE, 3, 7);

    let mut image = open_image(&iso).unwrap();
    let mut buffer = [0_u8; DATA_SECTOR_SIZE];
    image.read_data(2, &mut buffer).unwrap();

    assert_eq!(image.toc().tracks(), &[track(0, 2, TrackType::Data)]);
    assert_eq!(buffer[0], 9);
    assert!(image.read_data(3, &mut buffer).is_err());
}

#[test]
fn test_open_image_rejects_chd() {

    let result = open_image(Path::new("/games/foo/game.chd"));

    assert!(matches!(result, Err(CddError::UnsupportedImage(_))));
}

#[test]
fn test_unstored_pregap_reads_as_silence() {

    let directory = tempfile::tempdir().unwrap();
    write_track_file(&directory.path().join("audio.bin"), RAW_SECTOR_SIZE, 20, 0);
    let cue = directory.path().join("audio.cue");
    fs::write(&cue, concat!(
        "FILE \"audio.bin\" BINARY\n",
        "  TRACK 01 AUDIO\n",
        "    INDEX 01 00:00:00\n",
        "  TRACK 02 AUDIO\n",
        "    PREGAP 00:00:05\n",
        "    INDEX 01 00:00:10\n",
    )).unwrap();

    let mut image = CueImage::open_cue(&cue).unwrap();

    assert_eq!(image.toc().tracks(), &[
        track(0, 14, TrackType::Audio),
        track(15, 24, TrackType::Audio),
    ]);

    // The last stored frame of track 1, then the first frame of the gap.
    let mut buffer = [0x55_u8; RAW_SECTOR_SIZE * 2];
    image.read_audio(9, &mut buffer).unwrap();
    assert_eq!(buffer[100], 9);
    assert!(buffer[RAW_SECTOR_SIZE..].iter().all(|&byte| byte == 0));

    // The last frame of the gap, then the first frame of track 2.
    let mut buffer = [0x55_u8; RAW_SECTOR_SIZE * 2];
    image.read_audio(14, &mut buffer).unwrap();
    assert!(buffer[..RAW_SECTOR_SIZE].iter().all(|&byte| byte == 0));
    assert_eq!(buffer[RAW_SECTOR_SIZE + 100], 10);

    let mut sector = [0_u8; DATA_SECTOR_SIZE];
    assert!(image.read_data(12, &mut sector).is_err());
}
