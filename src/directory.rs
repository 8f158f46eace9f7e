//! # Directory (C5)
//!
//! A directory is an ordinary file whose contents are a fixed-capacity
//! table of `{inUse, type, sector, name}` records — the same header and
//! pointer-tree machinery that backs every other file also backs the
//! directories that find it (the bootstrap recursion spec §1 calls out).

use crate::bitmap::Bitmap;
use crate::config::{DIR_CAPACITY, NAME_LEN};
use crate::disk::SectorDevice;
use crate::error::Error;
use crate::header::FileHeader;
use crate::openfile::OpenFile;
use colored::*;

const RECORD_SIZE: usize = 4 + 4 + 4 + (NAME_LEN + 1);

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum EntryType {
    File,
    Dir,
}

#[derive(Clone, Debug)]
pub struct Entry {
    pub in_use: bool,
    pub entry_type: EntryType,
    pub sector: u32,
    pub name: String,
}

impl Entry {
    fn empty() -> Self {
        Self {
            in_use: false,
            entry_type: EntryType::File,
            sector: 0,
            name: String::new(),
        }
    }
}

pub struct Directory {
    pub entries: Vec<Entry>,
}

impl Directory {
    pub fn new() -> Self {
        Self {
            entries: (0..DIR_CAPACITY).map(|_| Entry::empty()).collect(),
        }
    }

    pub fn byte_len() -> usize {
        DIR_CAPACITY * RECORD_SIZE
    }

    /// Linear scan over in-use entries, name comparison bounded by `NAME_LEN`.
    pub fn find(&self, name: &str) -> Option<u32> {
        self.entries
            .iter()
            .find(|e| e.in_use && names_match(&e.name, name))
            .map(|e| e.sector)
    }

    pub fn is_directory(&self, name: &str) -> bool {
        self.entries
            .iter()
            .any(|e| e.in_use && names_match(&e.name, name) && e.entry_type == EntryType::Dir)
    }

    pub fn add(&mut self, name: &str, sector: u32, entry_type: EntryType) -> Result<(), Error> {
        if name.is_empty() || name.len() > NAME_LEN {
            return Err(Error::Invalid);
        }
        if self.find(name).is_some() {
            return Err(Error::DuplicateName);
        }
        match self.entries.iter_mut().find(|e| !e.in_use) {
            Some(slot) => {
                slot.in_use = true;
                slot.entry_type = entry_type;
                slot.sector = sector;
                slot.name = name.to_string();
                Ok(())
            }
            None => Err(Error::DirectoryFull),
        }
    }

    /// Marks the entry unused. Does not reclaim header or data blocks —
    /// that is the file system's job (spec §4.5).
    pub fn remove(&mut self, name: &str) -> Result<(), Error> {
        match self
            .entries
            .iter_mut()
            .find(|e| e.in_use && names_match(&e.name, name))
        {
            Some(slot) => {
                slot.in_use = false;
                Ok(())
            }
            None => Err(Error::NotFound),
        }
    }

    /// Recursively deallocate every descendant header and data block, then
    /// mark every entry in this directory unused.
    pub fn remove_recursive(&mut self, bitmap: &mut Bitmap, disk: &mut dyn SectorDevice) -> Result<(), Error> {
        let active: Vec<(usize, u32, EntryType)> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.in_use)
            .map(|(i, e)| (i, e.sector, e.entry_type))
            .collect();

        for (idx, sector, entry_type) in active {
            if entry_type == EntryType::Dir {
                let mut child = Directory::new();
                {
                    let mut file = OpenFile::new(FileHeader::fetch_from(disk, sector)?);
                    child.fetch_from(disk, &mut file)?;
                }
                child.remove_recursive(bitmap, disk)?;
            }
            let header = FileHeader::fetch_from(disk, sector)?;
            header.deallocate(bitmap);
            bitmap.clear(sector);
            self.entries[idx].in_use = false;
        }
        Ok(())
    }

    /// Single-level listing: `[index] name T` where T is `F` or `D`.
    pub fn list(&self) -> Vec<String> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.in_use)
            .map(|(i, e)| {
                let tag = match e.entry_type {
                    EntryType::File => "F".normal(),
                    EntryType::Dir => "D".blue().bold(),
                };
                format!("[{}] {} {}", i, e.name, tag)
            })
            .collect()
    }

    /// As `list`, but descends into every DIR entry with indent + 2 spaces.
    pub fn list_recursive(&self, indent: usize, disk: &dyn SectorDevice) -> Result<Vec<String>, Error> {
        let mut lines = Vec::new();
        let pad = " ".repeat(indent);
        for (i, e) in self.entries.iter().enumerate().filter(|(_, e)| e.in_use) {
            let tag = match e.entry_type {
                EntryType::File => "F".normal(),
                EntryType::Dir => "D".blue().bold(),
            };
            lines.push(format!("{}[{}] {} {}", pad, i, e.name, tag));
            if e.entry_type == EntryType::Dir {
                let header = FileHeader::fetch_from(disk, e.sector)?;
                let mut file = OpenFile::new(header);
                let mut child = Directory::new();
                child.fetch_from(disk, &mut file)?;
                lines.extend(child.list_recursive(indent + 2, disk)?);
            }
        }
        Ok(lines)
    }

    pub fn fetch_from(&mut self, disk: &dyn SectorDevice, file: &mut OpenFile) -> Result<(), Error> {
        let len = Self::byte_len();
        let mut buf = vec![0u8; len];
        let n = file.read_at(disk, &mut buf, len, 0)?;
        buf.resize(len, 0);
        let _ = n;
        let mut entries = Vec::with_capacity(DIR_CAPACITY);
        for i in 0..DIR_CAPACITY {
            let off = i * RECORD_SIZE;
            let record = &buf[off..off + RECORD_SIZE];
            entries.push(decode_entry(record));
        }
        self.entries = entries;
        Ok(())
    }

    pub fn write_back(&self, disk: &mut dyn SectorDevice, file: &mut OpenFile) -> Result<(), Error> {
        let mut buf = vec![0u8; Self::byte_len()];
        for (i, e) in self.entries.iter().enumerate() {
            let off = i * RECORD_SIZE;
            encode_entry(e, &mut buf[off..off + RECORD_SIZE]);
        }
        let len = buf.len();
        file.write_at(disk, &buf, len, 0)?;
        Ok(())
    }
}

impl Default for Directory {
    fn default() -> Self {
        Self::new()
    }
}

fn names_match(stored: &str, query: &str) -> bool {
    stored.len() <= NAME_LEN && query.len() <= NAME_LEN && stored == query
}

fn encode_entry(e: &Entry, out: &mut [u8]) {
    out[0..4].copy_from_slice(&(e.in_use as u32).to_le_bytes());
    let type_code: u32 = match e.entry_type {
        EntryType::File => 0,
        EntryType::Dir => 1,
    };
    out[4..8].copy_from_slice(&type_code.to_le_bytes());
    out[8..12].copy_from_slice(&e.sector.to_le_bytes());
    let name_bytes = e.name.as_bytes();
    let n = name_bytes.len().min(NAME_LEN);
    out[12..12 + n].copy_from_slice(&name_bytes[..n]);
    out[12 + n] = 0; // NUL terminator
}

fn decode_entry(buf: &[u8]) -> Entry {
    let in_use = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]) != 0;
    let type_code = u32::from_le_bytes([buf[4], buf[5], buf[6], buf[7]]);
    let sector = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let name_field = &buf[12..12 + NAME_LEN + 1];
    let nul = name_field.iter().position(|&b| b == 0).unwrap_or(NAME_LEN);
    let name = String::from_utf8_lossy(&name_field[..nul]).to_string();
    Entry {
        in_use,
        entry_type: if type_code == 1 { EntryType::Dir } else { EntryType::File },
        sector,
        name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::RamDisk;

    #[test]
    fn add_find_remove_round_trip() {
        let mut dir = Directory::new();
        dir.add("foo", 42, EntryType::File).unwrap();
        assert_eq!(dir.find("foo"), Some(42));
        dir.remove("foo").unwrap();
        assert_eq!(dir.find("foo"), None);
    }

    #[test]
    fn rejects_duplicate_names() {
        let mut dir = Directory::new();
        dir.add("foo", 1, EntryType::File).unwrap();
        assert_eq!(dir.add("foo", 2, EntryType::File), Err(Error::DuplicateName));
    }

    #[test]
    fn fails_full_when_capacity_exhausted() {
        let mut dir = Directory::new();
        for i in 0..DIR_CAPACITY {
            dir.add(&format!("f{}", i), i as u32, EntryType::File).unwrap();
        }
        assert_eq!(dir.add("overflow", 999, EntryType::File), Err(Error::DirectoryFull));
    }

    #[test]
    fn serializes_and_reloads_entries() {
        let mut disk = RamDisk::new(128);
        let mut bitmap = Bitmap::new(128);
        let header = FileHeader::allocate(&mut bitmap, 20, Directory::byte_len() as u64).unwrap();
        header.write_back(&mut disk).unwrap();
        let mut file = OpenFile::new(header);

        let mut dir = Directory::new();
        dir.add("a", 30, EntryType::File).unwrap();
        dir.add("sub", 31, EntryType::Dir).unwrap();
        dir.write_back(&mut disk, &mut file).unwrap();

        let mut reloaded = Directory::new();
        reloaded.fetch_from(&disk, &mut file).unwrap();
        assert_eq!(reloaded.find("a"), Some(30));
        assert!(reloaded.is_directory("sub"));
        assert!(!reloaded.is_directory("a"));
    }
}
