//! Structural constants for the simulated volume.
//!
//! These are compile-time constants rather than a runtime config format:
//! the disk geometry, name length, and directory capacity are baked into
//! the on-disk layout (headers and directory records are fixed-size), so
//! there is nothing to parse at mount time. A real deployment would pick
//! different numbers and recompile.

/// Bytes per sector, matching the simulated disk's `ReadSector`/`WriteSector` width.
pub const SECTOR_SIZE: usize = 128;

/// Total number of sectors on the simulated volume.
pub const NUM_SECTORS: usize = 128;

/// Sector reserved for the bitmap file's header.
pub const BITMAP_SECTOR: u32 = 0;

/// Sector reserved for the root directory's header.
pub const ROOT_SECTOR: u32 = 1;

/// Maximum length of a single path component, not counting the NUL terminator.
pub const NAME_LEN: usize = 9;

/// Number of entries a directory file can hold.
pub const DIR_CAPACITY: usize = 64;

/// Maximum number of path components between the root and a leaf.
pub const MAX_PATH_DEPTH: usize = 25;

/// 32-bit ints per sector, used throughout the pointer tree and header layout.
pub const INTS_PER_SECTOR: usize = SECTOR_SIZE / 4;

/// Capacity of an indirect pointer sector: one `count` slot plus `I` children.
pub const INDIRECT_FANOUT: usize = INTS_PER_SECTOR - 1;

/// Capacity of a file header's top-level pointer table: `numBytes`, `numPointer`, then `H` pointers.
pub const HEADER_FANOUT: usize = INTS_PER_SECTOR - 2;

/// Maximum open files tracked at once by the open-file-id table.
pub const MAX_OPEN_FILES: usize = 20;
