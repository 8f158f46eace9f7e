//! # Pointer tree (C2)
//!
//! The block-index structure reached from a file header. Four variants —
//! `Direct`, `SingleIndirect`, `DoubleIndirect`, `TripleIndirect` — share one
//! contract (`allocate`/`deallocate`/`fetch_from`/`write_back`/`byte_to_sector`).
//! Recursive containment falls out naturally from an enum whose indirect
//! arms own a `Vec` of the next variant down; no arena, no back-references.
//!
//! Every variant, including `Direct`, occupies one sector of its own: a
//! `Direct` node's sector holds nothing but the single data-sector index it
//! points to (see the on-disk layout in spec §6). This keeps `fetch_from`/
//! `write_back` uniform across all four shapes.

use crate::bitmap::Bitmap;
use crate::config::{INDIRECT_FANOUT, SECTOR_SIZE};
use crate::disk::SectorDevice;
use crate::error::Error;

/// Level 1 = Direct, 2 = SingleIndirect, 3 = DoubleIndirect, 4 = TripleIndirect.
pub type Level = u8;

#[derive(Debug, Clone)]
pub enum PointerTree {
    Direct(DirectNode),
    SingleIndirect(IndirectNode),
    DoubleIndirect(IndirectNode),
    TripleIndirect(IndirectNode),
}

#[derive(Debug, Clone)]
pub struct DirectNode {
    pub sector: u32,
    pub data_sector: Option<u32>,
}

#[derive(Debug, Clone)]
pub struct IndirectNode {
    pub sector: u32,
    pub children: Vec<PointerTree>,
}

/// Number of data sectors a single subtree at `level` can address.
pub fn capacity_sectors(level: Level) -> u64 {
    match level {
        1 => 1,
        l => INDIRECT_FANOUT as u64 * capacity_sectors(l - 1),
    }
}

/// Number of bytes a single subtree at `level` can address.
pub fn capacity_bytes(level: Level) -> u64 {
    capacity_sectors(level) * SECTOR_SIZE as u64
}

/// Total sectors (pointer nodes + data) needed to address `n` data sectors
/// at `level`. Used to pre-check free space before any mutation, per spec
/// §4.2/§4.3's recommended pre-reservation rollback strategy.
pub fn sectors_required(level: Level, n: u64) -> u64 {
    if level == 1 {
        return if n == 0 { 0 } else { 2 }; // self + one data sector
    }
    let child_level = level - 1;
    let child_cap = capacity_sectors(child_level);
    let num_children = n.div_ceil(child_cap).max(if n == 0 { 0 } else { 1 });
    if num_children == 0 {
        return 0;
    }
    let full_children = num_children - 1;
    let remainder = n - full_children * child_cap;
    1 + full_children * sectors_required(child_level, child_cap)
        + sectors_required(child_level, remainder)
}

impl PointerTree {
    pub fn sector(&self) -> u32 {
        match self {
            PointerTree::Direct(d) => d.sector,
            PointerTree::SingleIndirect(i)
            | PointerTree::DoubleIndirect(i)
            | PointerTree::TripleIndirect(i) => i.sector,
        }
    }

    pub fn level(&self) -> Level {
        match self {
            PointerTree::Direct(_) => 1,
            PointerTree::SingleIndirect(_) => 2,
            PointerTree::DoubleIndirect(_) => 3,
            PointerTree::TripleIndirect(_) => 4,
        }
    }

    fn new_indirect(level: Level, sector: u32, children: Vec<PointerTree>) -> Self {
        match level {
            2 => PointerTree::SingleIndirect(IndirectNode { sector, children }),
            3 => PointerTree::DoubleIndirect(IndirectNode { sector, children }),
            4 => PointerTree::TripleIndirect(IndirectNode { sector, children }),
            _ => unreachable!("indirect level out of range"),
        }
    }

    /// Acquire the minimal set of sectors needed to address `n` data sectors
    /// at this subtree's level. The caller (header) has already verified
    /// total free space suffices for the whole header, so this only fails
    /// if the bitmap genuinely runs out mid-construction (a logic error).
    pub fn allocate(bitmap: &mut Bitmap, level: Level, n: u64) -> Result<Self, Error> {
        if level == 1 {
            let self_sector = bitmap.find_and_set()?;
            let data_sector = if n == 0 { None } else { Some(bitmap.find_and_set()?) };
            return Ok(PointerTree::Direct(DirectNode {
                sector: self_sector,
                data_sector,
            }));
        }
        let self_sector = bitmap.find_and_set()?;
        let child_level = level - 1;
        let child_cap = capacity_sectors(child_level);
        let num_children = n.div_ceil(child_cap) as usize;
        let mut children = Vec::with_capacity(num_children);
        let mut remaining = n;
        for _ in 0..num_children {
            let take = remaining.min(child_cap);
            children.push(Self::allocate(bitmap, child_level, take)?);
            remaining -= take;
        }
        Ok(Self::new_indirect(level, self_sector, children))
    }

    /// Clear every sector this subtree owns, recursively.
    pub fn deallocate(&self, bitmap: &mut Bitmap) {
        match self {
            PointerTree::Direct(d) => {
                if let Some(ds) = d.data_sector {
                    bitmap.clear(ds);
                }
                bitmap.clear(d.sector);
            }
            PointerTree::SingleIndirect(i)
            | PointerTree::DoubleIndirect(i)
            | PointerTree::TripleIndirect(i) => {
                for child in &i.children {
                    child.deallocate(bitmap);
                }
                bitmap.clear(i.sector);
            }
        }
    }

    /// Read this subtree back from disk, recursing into children for
    /// indirect variants.
    pub fn fetch_from(disk: &dyn SectorDevice, level: Level, sector: u32) -> Result<Self, Error> {
        let mut buf = vec![0u8; SECTOR_SIZE];
        disk.read_sector(sector, &mut buf)?;
        if level == 1 {
            let data_sector = read_i32(&buf, 0);
            return Ok(PointerTree::Direct(DirectNode {
                sector,
                data_sector: to_option(data_sector),
            }));
        }
        let count = read_i32(&buf, 0).max(0) as usize;
        let child_level = level - 1;
        let mut children = Vec::with_capacity(count);
        for idx in 0..count {
            let ptr = read_i32(&buf, 1 + idx);
            if let Some(child_sector) = to_option(ptr) {
                children.push(Self::fetch_from(disk, child_level, child_sector)?);
            }
        }
        Ok(Self::new_indirect(level, sector, children))
    }

    /// Serialize this node to its sector. Indirect variants write children
    /// first so every child sector referenced here is already committed.
    pub fn write_back(&self, disk: &mut dyn SectorDevice) -> Result<(), Error> {
        match self {
            PointerTree::Direct(d) => {
                let mut buf = vec![0xffu8; SECTOR_SIZE];
                write_i32(&mut buf, 0, from_option(d.data_sector));
                disk.write_sector(d.sector, &buf)
            }
            PointerTree::SingleIndirect(i)
            | PointerTree::DoubleIndirect(i)
            | PointerTree::TripleIndirect(i) => {
                for child in &i.children {
                    child.write_back(disk)?;
                }
                let mut buf = vec![0xffu8; SECTOR_SIZE];
                write_i32(&mut buf, 0, i.children.len() as i32);
                for (idx, child) in i.children.iter().enumerate() {
                    write_i32(&mut buf, 1 + idx, child.sector() as i32);
                }
                disk.write_sector(i.sector, &buf)
            }
        }
    }

    /// Translate a byte offset within this subtree's addressable range to
    /// the physical data sector that holds it.
    pub fn byte_to_sector(&self, offset: u64) -> Result<u32, Error> {
        match self {
            PointerTree::Direct(d) => d.data_sector.ok_or(Error::Invalid),
            PointerTree::SingleIndirect(i)
            | PointerTree::DoubleIndirect(i)
            | PointerTree::TripleIndirect(i) => {
                let child_level = self.level() - 1;
                let child_cap_bytes = capacity_bytes(child_level);
                let child_idx = (offset / child_cap_bytes) as usize;
                let rest = offset % child_cap_bytes;
                let child = i.children.get(child_idx).ok_or(Error::Invalid)?;
                child.byte_to_sector(rest)
            }
        }
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

fn to_option(v: i32) -> Option<u32> {
    if v < 0 {
        None
    } else {
        Some(v as u32)
    }
}

fn from_option(v: Option<u32>) -> i32 {
    match v {
        Some(s) => s as i32,
        None => -1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::RamDisk;

    #[test]
    fn capacities_match_spec_example() {
        // spec §8 concrete scenario: S=128, I=31, H=30
        assert_eq!(capacity_sectors(1), 1);
        assert_eq!(capacity_sectors(2), 31);
        assert_eq!(capacity_sectors(3), 31 * 31);
        assert_eq!(capacity_sectors(4), 31 * 31 * 31);
    }

    #[test]
    fn direct_round_trips() {
        let mut disk = RamDisk::new(16);
        let mut bitmap = Bitmap::new(16);
        bitmap.mark(0);
        let node = PointerTree::allocate(&mut bitmap, 1, 1).unwrap();
        node.write_back(&mut disk).unwrap();
        let sector = node.sector();
        let back = PointerTree::fetch_from(&disk, 1, sector).unwrap();
        assert_eq!(node.byte_to_sector(0).unwrap(), back.byte_to_sector(0).unwrap());
    }

    #[test]
    fn single_indirect_addresses_all_children() {
        let mut disk = RamDisk::new(128);
        let mut bitmap = Bitmap::new(128);
        let node = PointerTree::allocate(&mut bitmap, 2, 31).unwrap();
        node.write_back(&mut disk).unwrap();
        let back = PointerTree::fetch_from(&disk, 2, node.sector()).unwrap();
        for i in 0..31u64 {
            let a = node.byte_to_sector(i * SECTOR_SIZE as u64).unwrap();
            let b = back.byte_to_sector(i * SECTOR_SIZE as u64).unwrap();
            assert_eq!(a, b);
        }
    }

    #[test]
    fn deallocate_frees_every_owned_sector() {
        let mut bitmap = Bitmap::new(128);
        let before = bitmap.num_clear();
        let node = PointerTree::allocate(&mut bitmap, 2, 31).unwrap();
        assert!(bitmap.num_clear() < before);
        node.deallocate(&mut bitmap);
        assert_eq!(bitmap.num_clear(), before);
    }
}
