//! # Simulated disk contract
//!
//! The core never touches a real disk. It is built against a small
//! synchronous contract — `ReadSector`/`WriteSector` over a fixed sector
//! width — implemented elsewhere by the simulator (out of scope for this
//! crate, see spec §6). [`RamDisk`] is an in-memory stand-in used by the
//! crate's own tests and by the demo binary; it is not part of the public
//! contract a real simulator would satisfy, just a convenient witness.

use crate::config::{NUM_SECTORS, SECTOR_SIZE};
use crate::error::Error;

/// Synchronous sector device. Reads/writes are atomic at sector granularity;
/// contents of unallocated sectors are undefined until first written.
pub trait SectorDevice {
    /// Total number of addressable sectors.
    fn num_sectors(&self) -> usize;

    /// Read sector `i` into `buf`, which must be exactly `SECTOR_SIZE` bytes.
    fn read_sector(&self, i: u32, buf: &mut [u8]) -> Result<(), Error>;

    /// Write `buf` (exactly `SECTOR_SIZE` bytes) to sector `i`.
    fn write_sector(&mut self, i: u32, buf: &[u8]) -> Result<(), Error>;
}

/// An in-memory sector device, all sectors zeroed at construction.
pub struct RamDisk {
    sectors: Vec<[u8; SECTOR_SIZE]>,
}

impl RamDisk {
    pub fn new(num_sectors: usize) -> Self {
        Self {
            sectors: vec![[0u8; SECTOR_SIZE]; num_sectors],
        }
    }
}

impl Default for RamDisk {
    /// Builds a disk sized per [`NUM_SECTORS`], the volume's configured geometry.
    fn default() -> Self {
        Self::new(NUM_SECTORS)
    }
}

impl RamDisk {
    /// Flatten to a raw byte image, sector 0 first — the format the demo
    /// CLI persists between invocations.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.sectors.iter().flat_map(|s| s.iter().copied()).collect()
    }

    /// Rebuild from a raw byte image produced by [`RamDisk::to_bytes`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if bytes.len() % SECTOR_SIZE != 0 {
            return Err(Error::Io);
        }
        let sectors = bytes
            .chunks(SECTOR_SIZE)
            .map(|chunk| {
                let mut sector = [0u8; SECTOR_SIZE];
                sector.copy_from_slice(chunk);
                sector
            })
            .collect();
        Ok(Self { sectors })
    }
}

impl SectorDevice for RamDisk {
    fn num_sectors(&self) -> usize {
        self.sectors.len()
    }

    fn read_sector(&self, i: u32, buf: &mut [u8]) -> Result<(), Error> {
        let i = i as usize;
        if i >= self.sectors.len() || buf.len() != SECTOR_SIZE {
            return Err(Error::Io);
        }
        buf.copy_from_slice(&self.sectors[i]);
        Ok(())
    }

    fn write_sector(&mut self, i: u32, buf: &[u8]) -> Result<(), Error> {
        let i = i as usize;
        if i >= self.sectors.len() || buf.len() != SECTOR_SIZE {
            return Err(Error::Io);
        }
        self.sectors[i].copy_from_slice(buf);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_sector() {
        let mut disk = RamDisk::new(4);
        let mut buf = [0u8; SECTOR_SIZE];
        buf[0] = 42;
        disk.write_sector(2, &buf).unwrap();
        let mut out = [0u8; SECTOR_SIZE];
        disk.read_sector(2, &mut out).unwrap();
        assert_eq!(out[0], 42);
    }

    #[test]
    fn rejects_out_of_range_sector() {
        let disk = RamDisk::new(4);
        let mut buf = [0u8; SECTOR_SIZE];
        assert!(disk.read_sector(4, &mut buf).is_err());
    }

    #[test]
    fn image_bytes_round_trip() {
        let mut disk = RamDisk::new(4);
        let buf = [1u8; SECTOR_SIZE];
        disk.write_sector(1, &buf).unwrap();
        let bytes = disk.to_bytes();
        let back = RamDisk::from_bytes(&bytes).unwrap();
        let mut out = [0u8; SECTOR_SIZE];
        back.read_sector(1, &mut out).unwrap();
        assert_eq!(out, buf);
    }
}
