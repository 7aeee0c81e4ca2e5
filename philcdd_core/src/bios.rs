// SPDX-License-Identifier: GPL-3.0
// bios.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use crate::error::CddError;

/// The BIOS file name looked for next to the most recently used image.
pub const BIOS_FILE_NAME: &str = "cd_bios.rom";

/// Well-known BIOS locations, searched in order.
pub const BIOS_CANDIDATES: [&str; 4] = [
    "/media/fat/games/MegaCD/USA/cd_bios.rom",
    "/media/fat/games/MegaCD/Europe/cd_bios.rom",
    "/media/fat/games/MegaCD/Japan/cd_bios.rom",
    "/media/fat/games/MegaCD/boot.rom",
];

/// Decides when the well-known locations are searched after the BIOS next to
/// the image could not be loaded.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum BiosFallbackPolicy {

    /// Only when the image request carried no path.
    EmptyPathOnly,

    /// When the request carried no path, or whenever a physical disc is present.
    EmptyPathOrMedia,
}

impl BiosFallbackPolicy {

    /// Returns whether the well-known locations may be searched.
    pub fn allows_extended_search(self, path_is_empty: bool, media_present: bool) -> bool {
        match self {
            BiosFallbackPolicy::EmptyPathOnly => path_is_empty,
            BiosFallbackPolicy::EmptyPathOrMedia => path_is_empty || media_present,
        }
    }
}

/// This trait provides an implementation-opaque way of handing a BIOS image to
/// whatever consumes it.
pub trait BiosLoader {

    /// Implementations must load the BIOS from the supplied path, failing if the
    /// file is missing or cannot be transferred.
    fn load_bios(&mut self, path: &Path) -> Result<(), CddError>;
}

/// This struct loads BIOS images from the filesystem into memory.
pub struct FileBiosLoader {

    // The most recently loaded BIOS image.
    bios: Option<Vec<u8>>,
}

impl FileBiosLoader {

    /// Creates a new loader holding no BIOS.
    pub fn new() -> Self {
        FileBiosLoader {
            bios: None,
        }
    }

    /// Returns the most recently loaded BIOS image.
    pub fn bios(&self) -> Option<&[u8]> {
        self.bios.as_deref()
    }
}

impl BiosLoader for FileBiosLoader {

    /// Reads the whole file. An empty file is not a BIOS.
    fn load_bios(&mut self, path: &Path) -> Result<(), CddError> {
        let data = fs::read(path)?;
        if data.is_empty() {
            return Err(CddError::BiosNotFound);
        }

        self.bios = Some(data);
        Ok(())
    }
}

/// Returns the BIOS path next to the supplied image path, if it has a directory.
pub fn sibling_bios_path(image_path: &Path) -> Option<PathBuf> {
    image_path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .map(|parent| parent.join(BIOS_FILE_NAME))
}

/// This struct searches for a BIOS image in a fixed order.
pub struct BiosResolver {

    // The well-known locations, in search order.
    candidates: Vec<PathBuf>,
}

/// Implementation functions for the BIOS resolver.
impl BiosResolver {

    /// Creates a resolver using the well-known locations.
    pub fn new() -> Self {
        BiosResolver::with_candidates(BIOS_CANDIDATES.iter().map(PathBuf::from).collect())
    }

    /// Creates a resolver using the supplied locations instead.
    pub fn with_candidates(candidates: Vec<PathBuf>) -> Self {
        BiosResolver {
            candidates,
        }
    }

    /// Returns the paths to try, in order: the BIOS next to `base_path` if there
    /// is one, then the well-known locations when `extended` is set.
    pub fn candidate_paths<'a>(
        &'a self,
        base_path: Option<&Path>,
        extended: bool,
    ) -> impl Iterator<Item = PathBuf> + 'a {
        let sibling = base_path.and_then(sibling_bios_path);
        let fallbacks = self.candidates.iter().take(if extended { self.candidates.len() } else { 0 });

        sibling.into_iter().chain(fallbacks.cloned())
    }

    /// Tries each candidate in turn, stopping at the first one the loader accepts.
    pub fn resolve(
        &self,
        loader: &mut dyn BiosLoader,
        base_path: Option<&Path>,
        extended: bool,
    ) -> Result<PathBuf, CddError> {

        for path in self.candidate_paths(base_path, extended) {
            match loader.load_bios(&path) {
                Ok(()) => {
                    info!("Loaded CD BIOS from {}", path.display());
                    return Ok(path);
                },
                Err(error) => debug!("No CD BIOS at {}: {error}", path.display()),
            }
        }

        warn!("CD BIOS not found");
        Err(CddError::BiosNotFound)
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    /// Records every path it is asked for, accepting only one of them.
    struct RecordingLoader {
        accept: Option<PathBuf>,
        attempts: Vec<PathBuf>,
    }

    impl RecordingLoader {
        fn accepting(accept: Option<&str>) -> Self {
            RecordingLoader {
                accept: accept.map(PathBuf::from),
                attempts: vec![],
            }
        }
    }

    impl BiosLoader for RecordingLoader {
        fn load_bios(&mut self, path: &Path) -> Result<(), CddError> {
            self.attempts.push(path.to_path_buf());
            if self.accept.as_deref() == Some(path) {
                Ok(())
            } else {
                Err(CddError::BiosNotFound)
            }
        }
    }

    fn paths(list: &[&str]) -> Vec<PathBuf> {
        list.iter().map(PathBuf::from).collect()
    }

    #[test]
    fn test_sibling_bios_path_uses_image_directory() {

        assert_eq!(
            sibling_bios_path(Path::new("/games/foo/game.cue")),
            Some(PathBuf::from("/games/foo/cd_bios.rom"))
        );
        assert_eq!(sibling_bios_path(Path::new("game.cue")), None);
    }

    #[test]
    fn test_candidate_order_is_sibling_then_regions() {

        let resolver = BiosResolver::new();

        let candidates: Vec<PathBuf> = resolver
            .candidate_paths(Some(Path::new("/games/foo/game.cue")), true)
            .collect();

        assert_eq!(candidates, paths(&[
            "/games/foo/cd_bios.rom",
            "/media/fat/games/MegaCD/USA/cd_bios.rom",
            "/media/fat/games/MegaCD/Europe/cd_bios.rom",
            "/media/fat/games/MegaCD/Japan/cd_bios.rom",
            "/media/fat/games/MegaCD/boot.rom",
        ]));
    }

    #[test]
    fn test_candidates_without_extended_search() {

        let resolver = BiosResolver::new();

        let candidates: Vec<PathBuf> = resolver
            .candidate_paths(Some(Path::new("/games/foo/game.cue")), false)
            .collect();

        assert_eq!(candidates, paths(&["/games/foo/cd_bios.rom"]));
        assert_eq!(resolver.candidate_paths(None, false).count(), 0);
    }

    #[test]
    fn test_resolve_stops_at_first_success() {

        let resolver = BiosResolver::new();
        let mut loader = RecordingLoader::accepting(Some("/media/fat/games/MegaCD/Europe/cd_bios.rom"));

        let found = resolver
            .resolve(&mut loader, Some(Path::new("/games/foo/game.cue")), true)
            .unwrap();

        assert_eq!(found, PathBuf::from("/media/fat/games/MegaCD/Europe/cd_bios.rom"));
        assert_eq!(loader.attempts, paths(&[
            "/games/foo/cd_bios.rom",
            "/media/fat/games/MegaCD/USA/cd_bios.rom",
            "/media/fat/games/MegaCD/Europe/cd_bios.rom",
        ]));
    }

    #[test]
    fn test_resolve_fails_after_all_candidates() {

        let resolver = BiosResolver::new();
        let mut loader = RecordingLoader::accepting(None);

        let result = resolver.resolve(&mut loader, Some(Path::new("/games/foo/game.cue")), true);

        assert!(matches!(result, Err(CddError::BiosNotFound)));
        assert_eq!(loader.attempts.len(), 5);
    }

    #[test]
    fn test_fallback_policy() {

        assert!(BiosFallbackPolicy::EmptyPathOnly.allows_extended_search(true, false));
        assert!(!BiosFallbackPolicy::EmptyPathOnly.allows_extended_search(false, true));
        assert!(BiosFallbackPolicy::EmptyPathOrMedia.allows_extended_search(false, true));
        assert!(!BiosFallbackPolicy::EmptyPathOrMedia.allows_extended_search(false, false));
    }

    #[test]
    fn test_file_loader_reads_bios() {

        let directory = tempfile::tempdir().unwrap();
        let path = directory.path().join(BIOS_FILE_NAME);
        fs::write(&path, [1_u8, 2, 3, 4]).unwrap();

        let mut loader = FileBiosLoader::new();
        loader.load_bios(&path).unwrap();

        assert_eq!(loader.bios(), Some(&[1_u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_file_loader_rejects_missing_and_empty_files() {

        let directory = tempfile::tempdir().unwrap();
        let empty = directory.path().join("empty.rom");
        fs::write(&empty, b"").unwrap();

        let mut loader = FileBiosLoader::new();

        assert!(loader.load_bios(&directory.path().join("missing.rom")).is_err());
        assert!(loader.load_bios(&empty).is_err());
        assert_eq!(loader.bios(), None);
    }
}
