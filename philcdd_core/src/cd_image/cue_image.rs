// SPDX-License-Identifier: GPL-3.0
// cue_image.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    fs::{self, File},
    io::{self, BufReader, Read, Seek, SeekFrom},
    path::{Path, PathBuf},
};

use log::{debug, info};
use philcdd_utility::{DATA_SECTOR_SIZE, Msf, RAW_SECTOR_SIZE};

use super::ImageSource;
use crate::{
    error::CddError,
    toc::{PHYSICAL_TRACK_REQUEST, Toc, Track, TrackType},
};

/// This struct models a disc image made of one or more binary track files, and
/// abstracts the cue sheet layout away from the drive.
pub struct CueImage {

    // One buffered reader per FILE entry.
    track_files: Vec<BufReader<File>>,

    // Where each track's sectors live, in the same order as the TOC.
    track_list: Vec<CueTrack>,

    // The logical layout of the disc.
    toc: Toc,
}

/// This struct records where the sectors of a track are stored.
#[derive(Copy, Clone)]
struct CueTrack {

    // Index into the track file list.
    file_index: usize,

    // Bytes per stored sector.
    sector_size: usize,

    // Offset of the user data inside each stored sector.
    data_offset: usize,

    // File offset of the track's first sector.
    file_offset: u64,

    // First address of the track.
    start_lba: i32,

    // Last address backed by the file. Anything after it, up to the next
    // track, is a pregap no file stores.
    stored_end_lba: i32,
}

/// A track as declared in the cue sheet, before disc addresses are assigned.
struct CueEntry {
    file_index: usize,
    track_type: TrackType,
    sector_size: usize,
    data_offset: usize,
    pregap: i32,
    index1: Option<i32>,
}

/// Maps a cue sheet track mode to its type, stored sector size and user data offset.
fn parse_track_mode(mode: &str) -> Option<(TrackType, usize, usize)> {
    match mode.to_ascii_uppercase().as_str() {
        "MODE1/2048" => Some((TrackType::Data, DATA_SECTOR_SIZE, 0)),
        "MODE1/2352" => Some((TrackType::Data, RAW_SECTOR_SIZE, 16)),
        "MODE2/2352" => Some((TrackType::Data, RAW_SECTOR_SIZE, 24)),
        "AUDIO" => Some((TrackType::Audio, RAW_SECTOR_SIZE, 0)),
        _ => None,
    }
}

/// Splits the FILE command arguments into the file name and file type.
fn parse_file_command(arguments: &str) -> Option<(&str, &str)> {
    let arguments = arguments.trim();
    if let Some(quoted) = arguments.strip_prefix('"') {
        let end = quoted.find('"')?;
        Some((&quoted[..end], quoted[end + 1..].trim()))
    } else {
        let mut parts = arguments.splitn(2, char::is_whitespace);
        Some((parts.next()?, parts.next().unwrap_or("").trim()))
    }
}

/// Parses an MSF argument into a frame count.
fn parse_frames(text: &str, line: &str) -> Result<i32, CddError> {
    Msf::parse(text)
        .map(Msf::to_frames)
        .ok_or_else(|| CddError::CueSheet(format!("bad time in '{line}'")))
}

/// Implementation functions for CueImage.
impl CueImage {

    /// Opens a cue sheet and every track file it names.
    pub fn open_cue(path: &Path) -> Result<Self, CddError> {
        let sheet = fs::read_to_string(path)?;
        let directory = path.parent().map(Path::to_path_buf).unwrap_or_default();

        info!("Opening cue sheet {}", path.display());

        let mut track_files = vec![];
        let mut file_sizes = vec![];
        let mut entries: Vec<CueEntry> = vec![];

        for line in sheet.lines() {
            let line = line.trim();
            let (command, arguments) = match line.split_once(char::is_whitespace) {
                Some((command, arguments)) => (command, arguments.trim()),
                None => (line, ""),
            };

            match command.to_ascii_uppercase().as_str() {
                "FILE" => {
                    let (name, file_type) = parse_file_command(arguments)
                        .ok_or_else(|| CddError::CueSheet(format!("bad FILE line '{line}'")))?;
                    if !file_type.eq_ignore_ascii_case("BINARY") {
                        return Err(CddError::CueSheet(format!("unsupported file type '{file_type}'")));
                    }

                    let file_path: PathBuf = directory.join(name);
                    let file = File::open(&file_path)?;
                    file_sizes.push(file.metadata()?.len());
                    track_files.push(BufReader::new(file));

                    debug!("Opened track file {}", file_path.display());
                },
                "TRACK" => {
                    if entries.len() == PHYSICAL_TRACK_REQUEST {
                        break;
                    }

                    let mut parts = arguments.split_whitespace();
                    let number = parts.next().and_then(|number| number.parse::<usize>().ok());
                    if number != Some(entries.len() + 1) {
                        return Err(CddError::CueSheet(format!("missing tracks before '{line}'")));
                    }
                    if track_files.is_empty() {
                        return Err(CddError::CueSheet(format!("'{line}' precedes any FILE")));
                    }

                    let (track_type, sector_size, data_offset) = parts
                        .next()
                        .and_then(parse_track_mode)
                        .ok_or_else(|| CddError::CueSheet(format!("unsupported track mode in '{line}'")))?;

                    entries.push(CueEntry {
                        file_index: track_files.len() - 1,
                        track_type,
                        sector_size,
                        data_offset,
                        pregap: 0,
                        index1: None,
                    });
                },
                "PREGAP" => {
                    let frames = parse_frames(arguments, line)?;
                    if let Some(entry) = entries.last_mut() {
                        entry.pregap += frames;
                    }
                },
                "INDEX" => {
                    let Some(entry) = entries.last_mut() else {
                        continue;
                    };
                    let mut parts = arguments.split_whitespace();
                    let index = parts.next().and_then(|index| index.parse::<u8>().ok());
                    let frames = parse_frames(parts.next().unwrap_or(""), line)?;

                    // Only INDEX 01 places a track. Earlier indexes are pregap held
                    // in the file, which becomes the tail of the previous track.
                    if index == Some(1) {
                        entry.index1 = Some(frames);
                    }
                },
                _ => (),
            }
        }

        let (tracks, track_list) = Self::layout(&entries, &file_sizes)?;
        let toc = Toc::from_tracks(tracks)?;

        info!("Cue image mounted, last track {} disc end {}", toc.track_count(), toc.disc_end_lba());

        Ok(CueImage {
            track_files,
            track_list,
            toc,
        })
    }

    /// Opens a bare ISO image as a single Mode 1 data track.
    pub fn open_iso(path: &Path) -> Result<Self, CddError> {
        let file = File::open(path)?;
        let sector_count = (file.metadata()?.len() / DATA_SECTOR_SIZE as u64).min(i32::MAX as u64) as i32;
        if sector_count == 0 {
            return Err(CddError::InvalidToc("image holds no sectors"));
        }

        let toc = Toc::from_tracks(vec![Track {
            start_lba: 0,
            end_lba: sector_count - 1,
            track_type: TrackType::Data,
        }])?;

        info!("ISO image mounted, {} sectors", sector_count);

        Ok(CueImage {
            track_files: vec![BufReader::new(file)],
            track_list: vec![CueTrack {
                file_index: 0,
                sector_size: DATA_SECTOR_SIZE,
                data_offset: 0,
                file_offset: 0,
                start_lba: 0,
                stored_end_lba: sector_count - 1,
            }],
            toc,
        })
    }

    /// Assigns disc addresses to the declared tracks. Files follow each other on
    /// disc, and a pregap not stored in any file shifts everything after it. A
    /// track runs up to the start of the next one, so the layout has no holes,
    /// and such a pregap sits at the end of the track before it.
    fn layout(entries: &[CueEntry], file_sizes: &[u64]) -> Result<(Vec<Track>, Vec<CueTrack>), CddError> {
        if entries.is_empty() {
            return Err(CddError::CueSheet("no tracks".to_string()));
        }

        let mut starts = Vec::with_capacity(entries.len());
        let mut track_list = Vec::with_capacity(entries.len());
        let mut file_base = 0;
        let mut pregap_total = 0;
        let mut disc_end_lba = 0;

        for (position, entry) in entries.iter().enumerate() {
            let index1 = entry
                .index1
                .ok_or_else(|| CddError::CueSheet(format!("track {} has no INDEX 01", position + 1)))?;

            // Moving to a new file places it after everything before it.
            if position > 0 && entries[position - 1].file_index != entry.file_index {
                let previous = &entries[position - 1];
                file_base += (file_sizes[previous.file_index] / previous.sector_size as u64) as i32;
            }

            pregap_total += entry.pregap;
            let start_lba = file_base + index1 + pregap_total;
            starts.push(start_lba);

            track_list.push(CueTrack {
                file_index: entry.file_index,
                sector_size: entry.sector_size,
                data_offset: entry.data_offset,
                file_offset: index1 as u64 * entry.sector_size as u64,
                start_lba,
                stored_end_lba: 0,
            });

            let file_frames = (file_sizes[entry.file_index] / entry.sector_size as u64) as i32;
            disc_end_lba = file_base + file_frames + pregap_total;
        }

        for (position, cue_track) in track_list.iter_mut().enumerate() {
            cue_track.stored_end_lba = match entries.get(position + 1) {
                Some(next) => starts[position + 1] - next.pregap - 1,
                None => disc_end_lba - 1,
            };
        }

        let tracks = entries
            .iter()
            .enumerate()
            .map(|(position, entry)| Track {
                start_lba: starts[position],
                end_lba: starts.get(position + 1).copied().unwrap_or(disc_end_lba) - 1,
                track_type: entry.track_type,
            })
            .collect();

        Ok((tracks, track_list))
    }

    /// Returns the storage record of the track holding the address.
    fn track_for(&self, lba: i32) -> io::Result<&CueTrack> {
        let index = self.toc.track_index_for_lba(lba);
        match self.track_list.get(index) {
            Some(track) if lba >= track.start_lba => Ok(track),
            _ => Err(io::Error::new(io::ErrorKind::InvalidInput, format!("LBA {lba} is outside the image"))),
        }
    }

    /// Reads one audio frame. Frames in an unstored pregap are silent, and so
    /// is anything past the end of the file.
    fn read_audio_frame(&mut self, track: CueTrack, lba: i32, frame: &mut [u8]) -> io::Result<()> {
        if lba > track.stored_end_lba {
            frame.fill(0);
            return Ok(());
        }

        let offset = track.file_offset + (lba - track.start_lba) as u64 * RAW_SECTOR_SIZE as u64;
        let file = &mut self.track_files[track.file_index];
        file.seek(SeekFrom::Start(offset))?;

        let mut filled = 0;
        while filled < frame.len() {
            match file.read(&mut frame[filled..]) {
                Ok(0) => break,
                Ok(bytes_read) => filled += bytes_read,
                Err(error) if error.kind() == io::ErrorKind::Interrupted => (),
                Err(error) => return Err(error),
            }
        }
        frame[filled..].fill(0);

        Ok(())
    }
}

/// Implementation functions to be called from anything that understands what
/// an ImageSource object is.
impl ImageSource for CueImage {

    fn toc(&self) -> &Toc {
        &self.toc
    }

    /// Reads the user data of one stored sector.
    fn read_data(&mut self, lba: i32, buffer: &mut [u8]) -> io::Result<()> {
        let track = *self.track_for(lba)?;
        if lba > track.stored_end_lba {
            return Err(io::Error::new(io::ErrorKind::InvalidInput, format!("LBA {lba} is in an unstored pregap")));
        }
        let offset = track.file_offset
            + (lba - track.start_lba) as u64 * track.sector_size as u64
            + track.data_offset as u64;
        let length = buffer.len().min(DATA_SECTOR_SIZE);
        let file = &mut self.track_files[track.file_index];

        file.seek(SeekFrom::Start(offset))?;
        file.read_exact(&mut buffer[..length])
    }

    /// Reads consecutive frames, each from the track holding its own address.
    /// Only the first address has to be on the disc.
    fn read_audio(&mut self, lba: i32, buffer: &mut [u8]) -> io::Result<()> {
        self.track_for(lba)?;

        for (frame_index, frame) in buffer.chunks_mut(RAW_SECTOR_SIZE).enumerate() {
            let frame_lba = lba + frame_index as i32;
            match self.track_for(frame_lba).ok().copied() {
                Some(track) => self.read_audio_frame(track, frame_lba, frame)?,
                None => frame.fill(0),
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests;
