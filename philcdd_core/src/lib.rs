// SPDX-License-Identifier: GPL-3.0
// lib.rs - Copyright Phillip Potter, 2026, under GPLv3 only.

// Crate-wide lines to disable specific lints:

// Constructors are spelled out as `new` functions to keep the initial state of
// each component visible in one place, so there will be no derived Default
// implementations unless needed.
#![allow(clippy::new_without_default)]

/// This module contains the error type shared by all drive components.
pub mod error;

/// This module contains the boundary to the host's optical drives, along with
/// a block-device backed implementation.
pub mod host_drive;

/// This module contains media presence and type detection.
pub mod media_probe;

/// This module contains the table of contents representation and the builder
/// that reads it from physical media.
pub mod toc;

/// This module contains the auto-load sequencer that mounts inserted discs.
pub mod auto_load;

/// This module contains the CD BIOS path resolver.
pub mod bios;

/// This module contains file-backed disc images.
pub mod cd_image;

/// This module contains the emulated CD drive and its sector dispatch.
pub mod cdrom_drive;
