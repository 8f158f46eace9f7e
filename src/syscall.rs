//! # System-call surface (C7)
//!
//! Thin translation from user system-call numbers to [`FileSystem`]
//! operations. User-mode argument areas (string pointers, buffers) are
//! expected to already be copied into the kernel buffers passed here; this
//! module only applies the sentinel-return convention spec §4.7 specifies
//! — no `Error` ever escapes past this layer.

use crate::disk::SectorDevice;
use crate::filesystem::FileSystem;

pub struct Syscalls<D: SectorDevice> {
    fs: FileSystem<D>,
}

impl<D: SectorDevice> Syscalls<D> {
    pub fn new(fs: FileSystem<D>) -> Self {
        Self { fs }
    }

    pub fn into_inner(self) -> FileSystem<D> {
        self.fs
    }

    /// Returns 1 on success, 0 on failure.
    pub fn create(&mut self, name: &str, initial_size: u32) -> i32 {
        match self.fs.create(name, initial_size as u64, false) {
            Ok(()) => 1,
            Err(_) => 0,
        }
    }

    /// Returns an open-file id, or -1 on failure.
    pub fn open(&mut self, name: &str) -> i32 {
        match self.fs.open(name) {
            Ok(id) => id as i32,
            Err(_) => -1,
        }
    }

    /// Returns bytes read, or -1 on failure.
    pub fn read(&mut self, buf: &mut [u8], size: u32, id: i32) -> i32 {
        if id < 0 {
            return -1;
        }
        match self.fs.read(id as u32, buf, size as usize) {
            Ok(n) => n as i32,
            Err(_) => -1,
        }
    }

    /// Returns bytes written, or -1 on failure.
    pub fn write(&mut self, buf: &[u8], size: u32, id: i32) -> i32 {
        if id < 0 {
            return -1;
        }
        match self.fs.write(id as u32, buf, size as usize) {
            Ok(n) => n as i32,
            Err(_) => -1,
        }
    }

    /// Returns 1 on success, 0 on failure.
    pub fn close(&mut self, id: i32) -> i32 {
        if id < 0 {
            return 0;
        }
        match self.fs.close(id as u32) {
            Ok(()) => 1,
            Err(_) => 0,
        }
    }

    /// `PrintInt` has no return value; it is a pure side effect on the
    /// simulated console, out of scope here, so this just renders to a string.
    pub fn print_int(&self, i: i32) -> String {
        i.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disk::RamDisk;
    use crate::filesystem::FileSystem;

    fn fresh() -> Syscalls<RamDisk> {
        Syscalls::new(FileSystem::format(RamDisk::default()).unwrap())
    }

    #[test]
    fn create_open_write_read_close_sentinel_flow() {
        let mut sc = fresh();
        assert_eq!(sc.create("/a", 100), 1);
        let id = sc.open("/a");
        assert!(id >= 0);
        assert_eq!(sc.write(b"hello", 5, id), 5);
        assert_eq!(sc.close(id), 1);

        let id = sc.open("/a");
        let mut buf = [0u8; 5];
        assert_eq!(sc.read(&mut buf, 5, id), 5);
        assert_eq!(&buf, b"hello");
        assert_eq!(sc.close(id), 1);
    }

    #[test]
    fn open_of_missing_file_returns_negative_one() {
        let mut sc = fresh();
        assert_eq!(sc.open("/nope"), -1);
    }

    #[test]
    fn operations_on_unknown_id_return_failure_sentinels() {
        let mut sc = fresh();
        let mut buf = [0u8; 4];
        assert_eq!(sc.read(&mut buf, 4, 77), -1);
        assert_eq!(sc.write(&buf, 4, 77), -1);
        assert_eq!(sc.close(77), 0);
    }

    #[test]
    fn create_duplicate_returns_zero() {
        let mut sc = fresh();
        assert_eq!(sc.create("/a", 10), 1);
        assert_eq!(sc.create("/a", 10), 0);
    }
}
