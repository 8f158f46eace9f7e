//! # File header (C3)
//!
//! One sector that roots a file's pointer tree: `[numBytes, numPointer,
//! p0..p_{H-1}]`. All top-level pointers at a header share one `level`
//! derived from the file's byte length — the same rule runs on `allocate`
//! and on `fetch_from`, which is exactly what the header round-trip and
//! level-determinism properties in spec §8 test.

use crate::bitmap::Bitmap;
use crate::config::{HEADER_FANOUT, SECTOR_SIZE};
use crate::disk::SectorDevice;
use crate::error::Error;
use crate::pointer::{self, Level, PointerTree};

pub struct FileHeader {
    pub sector: u32,
    pub num_bytes: u64,
    pub level: Level,
    pub pointers: Vec<PointerTree>,
}

/// Smallest level in 1..=4 whose `H` top-level pointers can address
/// `file_size` bytes, or `TooLarge` if even level 4 falls short.
fn choose_level(file_size: u64) -> Result<Level, Error> {
    for level in 1..=4u8 {
        if pointer::capacity_bytes(level) * HEADER_FANOUT as u64 >= file_size {
            return Ok(level);
        }
    }
    Err(Error::TooLarge)
}

impl FileHeader {
    /// Build and persist (in memory only — call `write_back` to commit) a
    /// header addressing exactly `file_size` bytes. Sectors are reserved
    /// from `bitmap` in one pre-checked batch: see `pointer::sectors_required`.
    pub fn allocate(bitmap: &mut Bitmap, sector: u32, file_size: u64) -> Result<Self, Error> {
        let level = choose_level(file_size)?;
        let total_data_sectors = file_size.div_ceil(SECTOR_SIZE as u64);
        let top_capacity = pointer::capacity_sectors(level);
        let num_pointer = if total_data_sectors == 0 {
            0
        } else {
            total_data_sectors.div_ceil(top_capacity) as usize
        };
        if num_pointer > HEADER_FANOUT {
            return Err(Error::TooLarge);
        }

        let mut required = 0u64;
        let mut remaining = total_data_sectors;
        for _ in 0..num_pointer {
            let take = remaining.min(top_capacity);
            required += pointer::sectors_required(level, take);
            remaining -= take;
        }
        if bitmap.num_clear() < required as usize {
            return Err(Error::NoSpace);
        }

        let mut pointers = Vec::with_capacity(num_pointer);
        let mut remaining = total_data_sectors;
        for _ in 0..num_pointer {
            let take = remaining.min(top_capacity);
            pointers.push(PointerTree::allocate(bitmap, level, take)?);
            remaining -= take;
        }

        Ok(Self {
            sector,
            num_bytes: file_size,
            level,
            pointers,
        })
    }

    /// Recursively deallocate every live top-level pointer. Does not clear
    /// the header's own sector; freeing that is the caller's job (Remove).
    pub fn deallocate(&self, bitmap: &mut Bitmap) {
        for p in &self.pointers {
            p.deallocate(bitmap);
        }
    }

    pub fn fetch_from(disk: &dyn SectorDevice, sector: u32) -> Result<Self, Error> {
        let mut buf = vec![0u8; SECTOR_SIZE];
        disk.read_sector(sector, &mut buf)?;
        let num_bytes = read_i32(&buf, 0).max(0) as u64;
        let num_pointer = read_i32(&buf, 1).max(0) as usize;
        let level = choose_level(num_bytes)?;
        let mut pointers = Vec::with_capacity(num_pointer);
        for idx in 0..num_pointer {
            let raw = read_i32(&buf, 2 + idx);
            if raw >= 0 {
                pointers.push(PointerTree::fetch_from(disk, level, raw as u32)?);
            }
        }
        Ok(Self {
            sector,
            num_bytes,
            level,
            pointers,
        })
    }

    pub fn write_back(&self, disk: &mut dyn SectorDevice) -> Result<(), Error> {
        for p in &self.pointers {
            p.write_back(disk)?;
        }
        let mut buf = vec![0xffu8; SECTOR_SIZE];
        write_i32(&mut buf, 0, self.num_bytes as i32);
        write_i32(&mut buf, 1, self.pointers.len() as i32);
        for (idx, p) in self.pointers.iter().enumerate() {
            write_i32(&mut buf, 2 + idx, p.sector() as i32);
        }
        disk.write_sector(self.sector, &buf)
    }

    pub fn byte_to_sector(&self, offset: u64) -> Result<u32, Error> {
        let top_capacity_bytes = pointer::capacity_bytes(self.level);
        let top = (offset / top_capacity_bytes) as usize;
        let rest = offset % top_capacity_bytes;
        let p = self.pointers.get(top).ok_or(Error::Invalid)?;
        p.byte_to_sector(rest)
    }

    pub fn file_length(&self) -> u64 {
        self.num_bytes
    }
}

fn read_i32(buf: &[u8], idx: usize) -> i32 {
    let off = idx * 4;
    i32::from_le_bytes([buf[off], buf[off + 1], buf[off + 2], buf[off + 3]])
}

fn write_i32(buf: &mut [u8], idx: usize, v: i32) {
    let off = idx * 4;
    buf[off..off + 4].copy_from_slice(&v.to_le_bytes());
}
