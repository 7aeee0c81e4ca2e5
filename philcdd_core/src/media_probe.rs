// SPDX-License-Identifier: GPL-3.0
// media_probe.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use philcdd_utility::DATA_SECTOR_SIZE;

use crate::host_drive::{DriveId, HostDrive, MediaType};

/// The system identifier found on Mega CD discs.
const MEGA_CD_SIGNATURE: &[u8] = b"SEGADISCSYSTEM";

/// The system identifier found on Saturn discs.
const SATURN_SIGNATURE: &[u8] = b"SEGA SEGASATURN";

/// The licence string found in the PlayStation licence sector.
const PLAYSTATION_SIGNATURE: &[u8] = b"Sony Computer Entertainment";

/// The ISO9660 standard identifier, found at offset 1 of the volume descriptor.
const ISO9660_SIGNATURE: &[u8] = b"CD001";

/// The sector holding the ISO9660 primary volume descriptor.
const VOLUME_DESCRIPTOR_LBA: i32 = 16;

/// The sector holding the PlayStation licence string.
const PLAYSTATION_LICENCE_LBA: i32 = 4;

/// A snapshot of what the host reports for one drive.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub struct MediaStatus {
    pub present: bool,
    pub media_type: MediaType,
}

impl MediaStatus {

    /// The status of an empty or unsettled drive.
    pub const ABSENT: MediaStatus = MediaStatus {
        present: false,
        media_type: MediaType::None,
    };

    /// Data sectors are only read from a physical disc of the target format.
    pub fn allows_data_passthrough(&self) -> bool {
        self.present && self.media_type == MediaType::TargetDisc
    }

    /// Audio sectors are read from target discs and from unrecognised discs,
    /// which covers plain audio CDs.
    pub fn allows_audio_passthrough(&self) -> bool {
        self.present
            && matches!(self.media_type, MediaType::TargetDisc | MediaType::UnknownDisc)
    }

    /// The same discs that allow audio passthrough may be mounted automatically.
    pub fn allows_auto_load(&self) -> bool {
        self.allows_audio_passthrough()
    }
}

/// Queries the live state of a drive. A drive claiming media but unable to name
/// its type is still settling, and is reported as absent until it does.
pub fn probe(host: &dyn HostDrive, drive: DriveId) -> MediaStatus {
    if !host.has_media(drive) {
        return MediaStatus::ABSENT;
    }

    match host.media_type(drive) {
        MediaType::None => MediaStatus::ABSENT,
        media_type => MediaStatus {
            present: true,
            media_type,
        },
    }
}

/// Classifies a disc from its system headers. The closure must fill the buffer
/// with the data of the requested sector and report whether that succeeded.
pub fn identify_disc<F>(mut read_sector: F) -> MediaType
where
    F: FnMut(i32, &mut [u8]) -> bool,
{
    let mut sector = [0_u8; DATA_SECTOR_SIZE];

    // Boot sector first.
    if read_sector(0, &mut sector) {
        if sector.starts_with(MEGA_CD_SIGNATURE) {
            return MediaType::TargetDisc;
        }
        if sector.starts_with(SATURN_SIGNATURE) {
            return MediaType::OtherDisc;
        }
    }

    // Then the system identifier of the ISO9660 volume descriptor.
    sector.fill(0);
    if read_sector(VOLUME_DESCRIPTOR_LBA, &mut sector) && &sector[1..6] == ISO9660_SIGNATURE {
        let system_id = &sector[8..];
        if system_id.starts_with(MEGA_CD_SIGNATURE) {
            return MediaType::TargetDisc;
        }
        if system_id.starts_with(SATURN_SIGNATURE) {
            return MediaType::OtherDisc;
        }
    }

    // Finally the PlayStation licence sector.
    sector.fill(0);
    if read_sector(PLAYSTATION_LICENCE_LBA, &mut sector)
        && sector
            .windows(PLAYSTATION_SIGNATURE.len())
            .any(|window| window == PLAYSTATION_SIGNATURE)
    {
        return MediaType::OtherDisc;
    }

    MediaType::UnknownDisc
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::host_drive::fake_host_drive::FakeHostDrive;

    fn disc_with(lba: i32, offset: usize, bytes: &'static [u8]) -> impl FnMut(i32, &mut [u8]) -> bool {
        move |requested, buffer: &mut [u8]| {
            if requested == lba {
                buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
            }
            true
        }
    }

    #[test]
    fn test_probe_reports_absent_when_tray_empty() {

        let host = FakeHostDrive::new();

        assert_eq!(probe(&host, DriveId::PRIMARY), MediaStatus::ABSENT);
    }

    #[test]
    fn test_probe_treats_unsettled_drive_as_absent() {

        let host = FakeHostDrive::new();
        host.insert(MediaType::None, vec![]);

        assert_eq!(probe(&host, DriveId::PRIMARY), MediaStatus::ABSENT);
    }

    #[test]
    fn test_probe_reports_present_disc_type() {

        let host = FakeHostDrive::new();
        host.insert(MediaType::UnknownDisc, vec![]);

        let status = probe(&host, DriveId::PRIMARY);

        assert!(status.present);
        assert_eq!(status.media_type, MediaType::UnknownDisc);
    }

    #[test]
    fn test_passthrough_rules_follow_media_type() {

        let target = MediaStatus { present: true, media_type: MediaType::TargetDisc };
        let unknown = MediaStatus { present: true, media_type: MediaType::UnknownDisc };
        let other = MediaStatus { present: true, media_type: MediaType::OtherDisc };

        assert!(target.allows_data_passthrough());
        assert!(target.allows_audio_passthrough());
        assert!(!unknown.allows_data_passthrough());
        assert!(unknown.allows_audio_passthrough());
        assert!(unknown.allows_auto_load());
        assert!(!other.allows_data_passthrough());
        assert!(!other.allows_audio_passthrough());
        assert!(!other.allows_auto_load());
        assert!(!MediaStatus::ABSENT.allows_auto_load());
    }

    #[test]
    fn test_identify_boot_sector_signature() {

        assert_eq!(identify_disc(disc_with(0, 0, b"SEGADISCSYSTEM")), MediaType::TargetDisc);
        assert_eq!(identify_disc(disc_with(0, 0, b"SEGA SEGASATURN")), MediaType::OtherDisc);
    }

    #[test]
    fn test_identify_iso9660_system_identifier() {

        let read = |lba: i32, buffer: &mut [u8]| {
            if lba == 16 {
                buffer[1..6].copy_from_slice(b"CD001");
                buffer[8..22].copy_from_slice(b"SEGADISCSYSTEM");
            }
            true
        };

        assert_eq!(identify_disc(read), MediaType::TargetDisc);
    }

    #[test]
    fn test_identify_playstation_licence() {

        let read = disc_with(4, 100, b"Sony Computer Entertainment");

        assert_eq!(identify_disc(read), MediaType::OtherDisc);
    }

    #[test]
    fn test_identify_unreadable_disc_as_unknown() {

        assert_eq!(identify_disc(|_, _| false), MediaType::UnknownDisc);
    }
}
