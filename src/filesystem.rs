//! # File system orchestrator (C6)
//!
//! Owns the bitmap, the root directory, and the open-file-id table; drives
//! path resolution and every mutating operation. The "current directory"
//! used while walking a path is never persisted — each call builds it fresh
//! from the root and drops it on return, success or failure alike (spec §9).

use std::collections::HashMap;

use log::{info, warn};

use crate::bitmap::Bitmap;
use crate::config::{BITMAP_SECTOR, MAX_OPEN_FILES, MAX_PATH_DEPTH, NAME_LEN, NUM_SECTORS, ROOT_SECTOR};
use crate::directory::{Directory, EntryType};
use crate::disk::SectorDevice;
use crate::error::Error;
use crate::header::FileHeader;
use crate::openfile::OpenFile;

pub struct FileSystem<D: SectorDevice> {
    disk: D,
    bitmap: Bitmap,
    open_files: HashMap<u32, OpenFile>,
}

impl<D: SectorDevice> FileSystem<D> {
    /// Lay down a fresh, empty volume: bitmap and root directory headers at
    /// sectors 0 and 1, both system files allocated and written back, then
    /// the now-consistent bitmap and empty root directory persisted.
    pub fn format(mut disk: D) -> Result<Self, Error> {
        let mut bitmap = Bitmap::new(NUM_SECTORS);
        bitmap.mark(BITMAP_SECTOR);
        bitmap.mark(ROOT_SECTOR);

        let bitmap_size = Bitmap::byte_len(NUM_SECTORS) as u64;
        let bitmap_header = FileHeader::allocate(&mut bitmap, BITMAP_SECTOR, bitmap_size)?;
        let root_size = Directory::byte_len() as u64;
        let root_header = FileHeader::allocate(&mut bitmap, ROOT_SECTOR, root_size)?;

        bitmap_header.write_back(&mut disk)?;
        root_header.write_back(&mut disk)?;

        let mut fs = Self {
            disk,
            bitmap,
            open_files: HashMap::new(),
        };

        fs.save_bitmap()?;
        fs.save_directory(ROOT_SECTOR, &Directory::new())?;

        info!("formatted volume: {} sectors, {} free", NUM_SECTORS, fs.bitmap.num_clear());
        Ok(fs)
    }

    /// Open an already-formatted volume. Sectors 0 and 1 are authoritative.
    pub fn mount(disk: D) -> Result<Self, Error> {
        let mut bitmap = Bitmap::new(NUM_SECTORS);
        let header = FileHeader::fetch_from(&disk, BITMAP_SECTOR)?;
        let mut file = OpenFile::new(header);
        bitmap.fetch_from(&disk, &mut file)?;

        info!("mounted volume: {} free sectors", bitmap.num_clear());
        Ok(Self {
            disk,
            bitmap,
            open_files: HashMap::new(),
        })
    }

    pub fn free_sectors(&self) -> usize {
        self.bitmap.num_clear()
    }

    /// Unwrap the underlying device, e.g. to persist it after a batch of
    /// operations. There is no dirty buffering to flush first: every
    /// mutating operation above already writes back before returning.
    pub fn into_disk(self) -> D {
        self.disk
    }

    pub fn bitmap_dump(&self) -> String {
        self.bitmap.print()
    }

    // ---- path handling -------------------------------------------------

    /// Split an absolute path into components, rejecting empty intermediate
    /// components and over-length names. A trailing slash is equivalent to
    /// the same path without it.
    fn split_path(path: &str) -> Result<Vec<String>, Error> {
        if !path.starts_with('/') {
            return Err(Error::Invalid);
        }
        let rest = &path[1..];
        if rest.is_empty() {
            return Ok(vec![]);
        }
        let trimmed = rest.strip_suffix('/').unwrap_or(rest);
        let mut parts = Vec::new();
        for seg in trimmed.split('/') {
            if seg.is_empty() || seg.len() > NAME_LEN {
                return Err(Error::Invalid);
            }
            parts.push(seg.to_string());
        }
        if parts.len() > MAX_PATH_DEPTH {
            return Err(Error::Invalid);
        }
        Ok(parts)
    }

    fn load_directory(&self, sector: u32) -> Result<Directory, Error> {
        let header = FileHeader::fetch_from(&self.disk, sector)?;
        let mut file = OpenFile::new(header);
        let mut dir = Directory::new();
        dir.fetch_from(&self.disk, &mut file)?;
        Ok(dir)
    }

    fn save_directory(&mut self, sector: u32, dir: &Directory) -> Result<(), Error> {
        let header = FileHeader::fetch_from(&self.disk, sector)?;
        let mut file = OpenFile::new(header);
        dir.write_back(&mut self.disk, &mut file)
    }

    fn save_bitmap(&mut self) -> Result<(), Error> {
        let header = FileHeader::fetch_from(&self.disk, BITMAP_SECTOR)?;
        let mut file = OpenFile::new(header);
        self.bitmap.write_back(&mut self.disk, &mut file)
    }

    /// Walk from the root through `parts`, each of which must be a
    /// directory, and return the sector and loaded content of the final
    /// directory reached. An empty slice resolves to the root itself.
    fn resolve_directory(&self, parts: &[String]) -> Result<(u32, Directory), Error> {
        let mut sector = ROOT_SECTOR;
        let mut dir = self.load_directory(ROOT_SECTOR)?;
        for part in parts {
            match dir.find(part) {
                Some(s) if dir.is_directory(part) => {
                    sector = s;
                    dir = self.load_directory(s)?;
                }
                _ => return Err(Error::PathNotFound),
            }
        }
        Ok((sector, dir))
    }

    // ---- C6 operations ---------------------------------------------------

    /// Create a file (`is_dir = false`) or directory (`is_dir = true`) at
    /// `path`. `size` is ignored for directories (fixed at `Directory::byte_len`).
    pub fn create(&mut self, path: &str, size: u64, is_dir: bool) -> Result<(), Error> {
        let parts = Self::split_path(path)?;
        let leaf = parts.last().cloned().ok_or(Error::Invalid)?;
        let (parent_sector, mut parent_dir) = self.resolve_directory(&parts[..parts.len() - 1])?;

        if parent_dir.find(&leaf).is_some() {
            return Err(Error::DuplicateName);
        }

        let header_sector = self.bitmap.find_and_set()?;
        let entry_type = if is_dir { EntryType::Dir } else { EntryType::File };

        if let Err(e) = parent_dir.add(&leaf, header_sector, entry_type) {
            self.bitmap.clear(header_sector);
            return Err(e);
        }

        let file_size = if is_dir { Directory::byte_len() as u64 } else { size };
        let header = match FileHeader::allocate(&mut self.bitmap, header_sector, file_size) {
            Ok(h) => h,
            Err(e) => {
                warn!("create {} failed during allocation, rolling back", path);
                let _ = parent_dir.remove(&leaf);
                self.bitmap.clear(header_sector);
                return Err(e);
            }
        };

        header.write_back(&mut self.disk)?;
        if is_dir {
            let mut file = OpenFile::new(header);
            Directory::new().write_back(&mut self.disk, &mut file)?;
        }

        self.save_directory(parent_sector, &parent_dir)?;
        self.save_bitmap()?;
        Ok(())
    }

    /// Resolve `path`, open it, and register it in the open-file-id table.
    /// The id is the header's sector number.
    pub fn open(&mut self, path: &str) -> Result<u32, Error> {
        let parts = Self::split_path(path)?;
        let leaf = parts.last().cloned().ok_or(Error::Invalid)?;
        let (_sector, parent_dir) = self.resolve_directory(&parts[..parts.len() - 1])?;
        let file_sector = parent_dir.find(&leaf).ok_or(Error::NotFound)?;

        if !self.open_files.contains_key(&file_sector) && self.open_files.len() >= MAX_OPEN_FILES {
            return Err(Error::NoSpace);
        }

        let header = FileHeader::fetch_from(&self.disk, file_sector)?;
        self.open_files.insert(file_sector, OpenFile::new(header));
        Ok(file_sector)
    }

    pub fn read(&mut self, id: u32, buf: &mut [u8], len: usize) -> Result<usize, Error> {
        let disk = &self.disk;
        let file = self.open_files.get_mut(&id).ok_or(Error::BadId)?;
        file.read(disk, buf, len)
    }

    pub fn write(&mut self, id: u32, buf: &[u8], len: usize) -> Result<usize, Error> {
        let disk = &mut self.disk;
        let file = self.open_files.get_mut(&id).ok_or(Error::BadId)?;
        file.write(disk, buf, len)
    }

    pub fn close(&mut self, id: u32) -> Result<(), Error> {
        self.open_files.remove(&id).map(|_| ()).ok_or(Error::BadId)
    }

    pub fn file_length(&self, id: u32) -> Result<u64, Error> {
        self.open_files.get(&id).map(|f| f.length()).ok_or(Error::BadId)
    }

    /// Whole-file read built from `read_at`; used by the demo CLI's print
    /// command. Not a new module — a composition of C4 the harness needs.
    pub fn contents(&mut self, path: &str) -> Result<Vec<u8>, Error> {
        let id = self.open(path)?;
        let len = self.file_length(id)?;
        let mut buf = vec![0u8; len as usize];
        let read = self.read(id, &mut buf, len as usize)?;
        buf.truncate(read);
        self.close(id)?;
        Ok(buf)
    }

    pub fn remove(&mut self, path: &str) -> Result<(), Error> {
        let parts = Self::split_path(path)?;
        let leaf = parts.last().cloned().ok_or(Error::Invalid)?;
        let (parent_sector, mut parent_dir) = self.resolve_directory(&parts[..parts.len() - 1])?;
        let sector = parent_dir.find(&leaf).ok_or(Error::NotFound)?;
        let is_dir = parent_dir.is_directory(&leaf);

        if is_dir {
            let mut child = self.load_directory(sector)?;
            child.remove_recursive(&mut self.bitmap, &mut self.disk)?;
        }
        let header = FileHeader::fetch_from(&self.disk, sector)?;
        header.deallocate(&mut self.bitmap);
        self.bitmap.clear(sector);
        parent_dir.remove(&leaf)?;

        self.save_bitmap()?;
        self.save_directory(parent_sector, &parent_dir)?;
        info!("removed {}", path);
        Ok(())
    }

    pub fn list(&self, path: &str) -> Result<Vec<String>, Error> {
        let parts = Self::split_path(path)?;
        let (_sector, dir) = self.resolve_directory(&parts)?;
        Ok(dir.list())
    }

    pub fn list_recursive(&self, path: &str) -> Result<Vec<String>, Error> {
        let parts = Self::split_path(path)?;
        let (_sector, dir) = self.resolve_directory(&parts)?;
        dir.list_recursive(0, &self.disk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::RamDisk;

    fn fresh() -> FileSystem<RamDisk> {
        FileSystem::format(RamDisk::default()).unwrap()
    }

    #[test]
    fn format_then_list_root_is_empty() {
        let fs = fresh();
        assert!(fs.list("/").unwrap().is_empty());
    }

    #[test]
    fn create_write_close_open_read_round_trips() {
        let mut fs = fresh();
        fs.create("/a", 100, false).unwrap();
        let id = fs.open("/a").unwrap();
        fs.write(id, b"hello", 5).unwrap();
        fs.close(id).unwrap();

        let id = fs.open("/a").unwrap();
        let mut buf = [0u8; 5];
        fs.read(id, &mut buf, 5).unwrap();
        assert_eq!(&buf, b"hello");
        fs.close(id).unwrap();
    }

    #[test]
    fn nested_directories_list_recursively() {
        let mut fs = fresh();
        fs.create("/d1", 0, true).unwrap();
        fs.create("/d1/d2", 0, true).unwrap();
        fs.create("/d1/d2/f", 27, false).unwrap();
        let lines = fs.list_recursive("/").unwrap();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].trim_start().starts_with("[0] d2"));
    }

    #[test]
    fn remove_recursive_restores_free_count() {
        let mut fs = fresh();
        let before = fs.free_sectors();
        fs.create("/d1", 0, true).unwrap();
        fs.create("/d1/d2", 0, true).unwrap();
        fs.create("/d1/d2/f", 27, false).unwrap();
        fs.remove("/d1").unwrap();
        assert_eq!(fs.free_sectors(), before);
    }

    #[test]
    fn create_remove_is_an_inverse() {
        let mut fs = fresh();
        let before = fs.free_sectors();
        fs.create("/a", 100, false).unwrap();
        fs.remove("/a").unwrap();
        assert_eq!(fs.free_sectors(), before);
    }

    #[test]
    fn out_of_space_create_leaves_bitmap_unchanged() {
        let mut fs = fresh();
        let free_before = fs.free_sectors();
        // requesting far more data than the volume could ever hold
        let oversized = NUM_SECTORS as u64 * 128 * 4;
        let result = fs.create("/big", oversized, false);
        assert!(result.is_err());
        assert_eq!(fs.free_sectors(), free_before);
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let mut fs = fresh();
        fs.create("/a", 10, false).unwrap();
        assert_eq!(fs.create("/a", 10, false), Err(Error::DuplicateName));
    }

    #[test]
    fn missing_parent_is_path_not_found() {
        let mut fs = fresh();
        assert_eq!(fs.create("/missing/a", 10, false), Err(Error::PathNotFound));
    }

    #[test]
    fn bad_id_is_rejected_on_every_op() {
        let mut fs = fresh();
        assert_eq!(fs.close(999), Err(Error::BadId));
        let mut buf = [0u8; 1];
        assert_eq!(fs.read(999, &mut buf, 1), Err(Error::BadId));
    }

    #[test]
    fn open_of_missing_file_fails() {
        let mut fs = fresh();
        assert_eq!(fs.open("/nope"), Err(Error::NotFound));
    }
}
