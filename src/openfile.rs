//! # Open file (C4)
//!
//! An in-memory view over a header plus a byte cursor. Reads and writes are
//! clipped to the file's fixed length — this file system never extends a
//! file past the size it was created with (see spec §4.4) — and each
//! sector touched is fetched, patched, and (for writes) written back
//! individually; there is no dirty buffering beyond one sector at a time.

use crate::config::SECTOR_SIZE;
use crate::disk::SectorDevice;
use crate::error::Error;
use crate::header::FileHeader;

pub struct OpenFile {
    pub header: FileHeader,
    pos: u64,
}

impl OpenFile {
    pub fn new(header: FileHeader) -> Self {
        Self { header, pos: 0 }
    }

    pub fn length(&self) -> u64 {
        self.header.file_length()
    }

    pub fn seek(&mut self, pos: u64) {
        self.pos = pos;
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Stateful read: advances the cursor by the number of bytes actually
    /// returned, not by `len` (spec §9's tie-break on the source's
    /// inconsistency between the two).
    pub fn read(&mut self, disk: &dyn SectorDevice, buf: &mut [u8], len: usize) -> Result<usize, Error> {
        let n = self.read_at(disk, buf, len, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }

    pub fn write(&mut self, disk: &mut dyn SectorDevice, buf: &[u8], len: usize) -> Result<usize, Error> {
        let n = self.write_at(disk, buf, len, self.pos)?;
        self.pos += n as u64;
        Ok(n)
    }

    /// Positional read, clipped to `[0, file_length - pos]`. Returns 0 at
    /// or past end-of-file.
    pub fn read_at(&self, disk: &dyn SectorDevice, buf: &mut [u8], len: usize, pos: u64) -> Result<usize, Error> {
        let file_len = self.length();
        if pos >= file_len {
            return Ok(0);
        }
        let to_read = len.min((file_len - pos) as usize).min(buf.len());
        let mut done = 0usize;
        let mut sector_buf = vec![0u8; SECTOR_SIZE];
        while done < to_read {
            let offset = pos + done as u64;
            let sector = self.header.byte_to_sector(offset)?;
            disk.read_sector(sector, &mut sector_buf)?;
            let in_sector = (offset as usize) % SECTOR_SIZE;
            let chunk = (SECTOR_SIZE - in_sector).min(to_read - done);
            buf[done..done + chunk].copy_from_slice(&sector_buf[in_sector..in_sector + chunk]);
            done += chunk;
        }
        Ok(done)
    }

    /// Positional write, clipped the same way; writes beyond file length
    /// are silently truncated rather than extending the file.
    pub fn write_at(&mut self, disk: &mut dyn SectorDevice, buf: &[u8], len: usize, pos: u64) -> Result<usize, Error> {
        let file_len = self.length();
        if pos >= file_len {
            return Ok(0);
        }
        let to_write = len.min((file_len - pos) as usize).min(buf.len());
        let mut done = 0usize;
        let mut sector_buf = vec![0u8; SECTOR_SIZE];
        while done < to_write {
            let offset = pos + done as u64;
            let sector = self.header.byte_to_sector(offset)?;
            disk.read_sector(sector, &mut sector_buf)?;
            let in_sector = (offset as usize) % SECTOR_SIZE;
            let chunk = (SECTOR_SIZE - in_sector).min(to_write - done);
            sector_buf[in_sector..in_sector + chunk].copy_from_slice(&buf[done..done + chunk]);
            disk.write_sector(sector, &sector_buf)?;
            done += chunk;
        }
        Ok(done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::disk::RamDisk;

    fn make_file(disk: &mut RamDisk, bitmap: &mut Bitmap, sector: u32, size: u64) -> OpenFile {
        let header = FileHeader::allocate(bitmap, sector, size).unwrap();
        header.write_back(disk).unwrap();
        OpenFile::new(header)
    }

    #[test]
    fn write_then_read_round_trips() {
        let mut disk = RamDisk::new(128);
        let mut bitmap = Bitmap::new(128);
        let mut file = make_file(&mut disk, &mut bitmap, 10, 100);
        let written = file.write(&mut disk, b"hello", 5).unwrap();
        assert_eq!(written, 5);
        file.seek(0);
        let mut buf = [0u8; 5];
        let read = file.read(&disk, &mut buf, 5).unwrap();
        assert_eq!(read, 5);
        assert_eq!(&buf, b"hello");
    }

    #[test]
    fn read_past_eof_returns_zero() {
        let mut disk = RamDisk::new(128);
        let mut bitmap = Bitmap::new(128);
        let mut file = make_file(&mut disk, &mut bitmap, 10, 10);
        file.seek(10);
        let mut buf = [0u8; 5];
        assert_eq!(file.read(&disk, &mut buf, 5).unwrap(), 0);
    }

    #[test]
    fn write_beyond_length_is_truncated_not_extended() {
        let mut disk = RamDisk::new(128);
        let mut bitmap = Bitmap::new(128);
        let mut file = make_file(&mut disk, &mut bitmap, 10, 3);
        let written = file.write_at(&mut disk, b"hello", 5, 0).unwrap();
        assert_eq!(written, 3);
        assert_eq!(file.length(), 3);
    }

    #[test]
    fn spans_multiple_sectors() {
        let mut disk = RamDisk::new(128);
        let mut bitmap = Bitmap::new(128);
        let size = SECTOR_SIZE as u64 + 10;
        let mut file = make_file(&mut disk, &mut bitmap, 10, size);
        let data: Vec<u8> = (0..size as usize).map(|i| (i % 251) as u8).collect();
        file.write_at(&mut disk, &data, data.len(), 0).unwrap();
        let mut out = vec![0u8; data.len()];
        file.read_at(&disk, &mut out, out.len(), 0).unwrap();
        assert_eq!(out, data);
    }
}
