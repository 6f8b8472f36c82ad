//! # ufs-image
//!
//! File-backed memory-mapped container for UFS state.
//!
//! An image carries no semantics of its own: it is a fixed-size region of
//! bytes whose first word records the image's own length. Everything above
//! it (header, tables, string arena) is laid out by `ufs-index`.
//!
//! ## Durability
//!
//! After [`Image::sync`] returns, all writes issued before the call are
//! durable on the backing device. Writes between syncs reach the file only
//! at a natural unmap point; crash behavior between syncs is undefined.

use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::os::unix::fs::OpenOptionsExt;
use std::path::{Path, PathBuf};

use memmap2::MmapMut;
use tracing::debug;

use ufs_defs::{set_errno, Result, Status};

/// Size of the length prelude at offset 0.
pub const LEN_PRELUDE: u64 = std::mem::size_of::<u64>() as u64;

/// A shared, writable memory map over a backing file.
///
/// The mapping address is stable for the lifetime of the value, so raw
/// pointers handed out by [`Image::as_mut_ptr`] stay valid until drop.
pub struct Image {
    map: MmapMut,
    path: PathBuf,
}

impl std::fmt::Debug for Image {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Image")
            .field("path", &self.path)
            .field("len", &self.map.len())
            .finish()
    }
}

impl Image {
    /// Open an existing image and map it read-write shared.
    ///
    /// The first word is overwritten with the observed on-disk length, so
    /// the in-memory length word always reflects the true mapped extent.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() {
            return fail(Status::BadCall);
        }
        if !path.exists() {
            return fail(Status::DoesNotExist);
        }

        let file = match OpenOptions::new().read(true).write(true).open(path) {
            Ok(f) => f,
            Err(_) => return fail(Status::UnknownError),
        };

        let len = match file.metadata() {
            Ok(meta) => meta.len(),
            Err(_) => return fail(Status::UnknownError),
        };
        if len < LEN_PRELUDE {
            return fail(Status::ImageTooSmall);
        }

        // Safety: the mapping is backed by a regular file we hold open for
        // the duration of the map call; concurrent writers are undefined
        // behavior by contract.
        let mut map = match unsafe { MmapMut::map_mut(&file) } {
            Ok(m) => m,
            Err(_) => return fail(Status::UnknownError),
        };

        map[..LEN_PRELUDE as usize].copy_from_slice(&len.to_ne_bytes());

        debug!(path = %path.display(), len, "opened image");
        set_errno(Status::NoError);
        Ok(Self {
            map,
            path: path.to_path_buf(),
        })
    }

    /// Create a file-backed image of exactly `size` bytes.
    ///
    /// The file is created with mode `0644`, truncated to `size` (and thus
    /// zero-filled), mapped read-write shared, and the length word is
    /// written at offset 0. The size is not padded here; callers that want
    /// page alignment pad before calling.
    pub fn create<P: AsRef<Path>>(path: P, size: u64) -> Result<Self> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() || size < LEN_PRELUDE {
            return fail(Status::BadCall);
        }

        let file = match OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .mode(0o644)
            .open(path)
        {
            Ok(f) => f,
            Err(e) if e.kind() == ErrorKind::PermissionDenied => {
                return fail(Status::CantCreateFile)
            }
            Err(_) => return fail(Status::BadCall),
        };

        if file.set_len(size).is_err() {
            return fail(Status::UnknownError);
        }

        // Safety: see `open`.
        let mut map = match unsafe { MmapMut::map_mut(&file) } {
            Ok(m) => m,
            Err(_) => return fail(Status::UnknownError),
        };

        map[..LEN_PRELUDE as usize].copy_from_slice(&size.to_ne_bytes());

        debug!(path = %path.display(), size, "created image");
        set_errno(Status::NoError);
        Ok(Self {
            map,
            path: path.to_path_buf(),
        })
    }

    /// Synchronously flush the whole mapped range to the backing file.
    pub fn sync(&self) -> Result<()> {
        if self.map.flush().is_err() {
            return fail(Status::ImageCouldNotSync);
        }
        set_errno(Status::NoError);
        Ok(())
    }

    /// Length of the mapped region in bytes.
    pub fn len(&self) -> u64 {
        self.map.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// The length recorded in the image's own prelude word.
    pub fn stored_len(&self) -> u64 {
        let mut word = [0u8; 8];
        word.copy_from_slice(&self.map[..8]);
        u64::from_ne_bytes(word)
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.map
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.map
    }

    /// Base pointer of the mapping. Stable until the image is dropped.
    pub fn as_mut_ptr(&mut self) -> *mut u8 {
        self.map.as_mut_ptr()
    }
}

fn fail<T>(status: Status) -> Result<T> {
    set_errno(status);
    Err(status)
}
