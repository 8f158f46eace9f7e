//! Error kinds surfaced by the file system core.
//!
//! Internally every fallible operation returns `Result<T,Error>`. The
//! syscall surface (`syscall` module) is the only place these are collapsed
//! to the sentinel integers a user program sees.

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    #[error("bitmap cannot satisfy the requested allocation")]
    NoSpace,
    #[error("requested file size exceeds what a level-4 header can address")]
    TooLarge,
    #[error("a directory entry with that name already exists")]
    DuplicateName,
    #[error("directory has no free entry slots")]
    DirectoryFull,
    #[error("an intermediate path component is missing or not a directory")]
    PathNotFound,
    #[error("the named file or directory does not exist")]
    NotFound,
    #[error("open-file id is not currently valid")]
    BadId,
    #[error("path or argument is malformed")]
    Invalid,
    #[error("underlying sector device reported an error")]
    Io,
}
