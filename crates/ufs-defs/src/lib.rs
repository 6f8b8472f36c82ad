//! # ufs-defs
//!
//! Shared vocabulary for the UFS union filesystem core: the identifier type,
//! the unified status enumeration, the image magic/version constants, the
//! canonical on-disk paths, and the ambient status word that every public
//! operation populates.

use std::cell::Cell;

use thiserror::Error;

/// Numeric identifier of a UFS entity.
///
/// Strictly positive values name a live entity within one type table.
/// `0` is reserved for the [`BASE`] pseudo-area. Negative values carry
/// status codes, so functions returning identifiers can also report errors
/// through the return channel.
pub type Id = i64;

/// The reserved area referring to the external filesystem.
pub const BASE: Id = 0;

/// Reserved area keyword. Cannot be added as an area name.
pub const BASE_NAME: &str = "BASE";

/// Bumped on every incompatible index layout change.
pub const UFS_INDEX_VERSION: u32 = 1;

/// The bytes "ufs" followed by 0, a sanity check against corruption.
pub const UFS_MAGIC: u32 = 0x0073_6675;

/// Directory holding UFS state, relative to the mount's working directory.
pub const UFS_DIRECTORY: &str = ".ufs";

/// Canonical image path, relative to the mount's working directory.
pub const UFS_IMAGE_FILE: &str = ".ufs/ufs_index";

/// Maximum number of entries in a view.
pub const VIEW_MAX_SIZE: usize = 1024;

/// A view is read up to its first terminator or [`VIEW_MAX_SIZE`] entries,
/// whichever comes first.
pub const VIEW_TERMINATOR: Id = -1;

/// Index of each typed table inside the image, in fixed layout order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(usize)]
pub enum TypeTag {
    File = 0,
    Area = 1,
    Node = 2,
    String = 3,
}

impl TypeTag {
    pub const COUNT: usize = 4;
}

/// Capacity request for a fresh image: slot counts for the three typed
/// tables plus the byte size of the string arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SizeRequest {
    pub num_files: u64,
    pub num_areas: u64,
    pub num_nodes: u64,
    pub num_str_bytes: u64,
}

impl Default for SizeRequest {
    fn default() -> Self {
        Self {
            num_files: 256,
            num_areas: 256,
            num_nodes: 512,
            num_str_bytes: 1024,
        }
    }
}

impl SizeRequest {
    /// A request is usable iff every capacity is strictly positive.
    pub fn is_valid(&self) -> bool {
        self.num_files > 0 && self.num_areas > 0 && self.num_nodes > 0 && self.num_str_bytes > 0
    }
}

/// Outcome of a UFS operation.
///
/// One unified enumeration covering the image, header, and engine layers.
/// Each kind carries a fixed negative code so that identifier-returning
/// operations can signal failure as `-code` through the legacy channel.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i64)]
pub enum Status {
    #[error("no error")]
    NoError = 0,
    #[error("entity does not exist")]
    DoesNotExist = -1,
    #[error("image is corrupted")]
    ImageIsCorrupted = -2,
    #[error("image version mismatch")]
    VersionMismatch = -3,
    #[error("bad call")]
    BadCall = -4,
    #[error("entity already exists")]
    AlreadyExists = -5,
    #[error("out of memory")]
    OutOfMemory = -6,
    #[error("mapping already exists")]
    MappingAlreadyExists = -7,
    #[error("can't create file")]
    CantCreateFile = -8,
    #[error("unknown error")]
    UnknownError = -9,
    #[error("image too small")]
    ImageTooSmall = -10,
    #[error("image could not sync")]
    ImageCouldNotSync = -11,
    #[error("view contains duplicates")]
    ViewContainsDuplicates = -12,
    #[error("invalid area in view")]
    InvalidAreaInView = -13,
    #[error("directory is not empty")]
    DirectoryIsNotEmpty = -14,
    #[error("cannot resolve storage")]
    CannotResolveStorage = -15,
}

impl Status {
    /// The fixed numeric code of this status kind.
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Recover a status from its numeric code. Unrecognised codes fold into
    /// [`Status::UnknownError`].
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Status::NoError,
            -1 => Status::DoesNotExist,
            -2 => Status::ImageIsCorrupted,
            -3 => Status::VersionMismatch,
            -4 => Status::BadCall,
            -5 => Status::AlreadyExists,
            -6 => Status::OutOfMemory,
            -7 => Status::MappingAlreadyExists,
            -8 => Status::CantCreateFile,
            -9 => Status::UnknownError,
            -10 => Status::ImageTooSmall,
            -11 => Status::ImageCouldNotSync,
            -12 => Status::ViewContainsDuplicates,
            -13 => Status::InvalidAreaInView,
            -14 => Status::DirectoryIsNotEmpty,
            -15 => Status::CannotResolveStorage,
            _ => Status::UnknownError,
        }
    }

    /// Screaming-case name, matching the legacy status string table.
    pub fn name(self) -> &'static str {
        match self {
            Status::NoError => "UFS_NO_ERROR",
            Status::DoesNotExist => "UFS_DOES_NOT_EXIST",
            Status::ImageIsCorrupted => "UFS_IMAGE_IS_CORRUPTED",
            Status::VersionMismatch => "UFS_VERSION_MISMATCH",
            Status::BadCall => "UFS_BAD_CALL",
            Status::AlreadyExists => "UFS_ALREADY_EXISTS",
            Status::OutOfMemory => "UFS_OUT_OF_MEMORY",
            Status::MappingAlreadyExists => "UFS_MAPPING_ALREADY_EXISTS",
            Status::CantCreateFile => "UFS_CANT_CREATE_FILE",
            Status::UnknownError => "UFS_UNKNOWN_ERROR",
            Status::ImageTooSmall => "UFS_IMAGE_TOO_SMALL",
            Status::ImageCouldNotSync => "UFS_IMAGE_COULD_NOT_SYNC",
            Status::ViewContainsDuplicates => "UFS_VIEW_CONTAINS_DUPLICATES",
            Status::InvalidAreaInView => "UFS_INVALID_AREA_IN_VIEW",
            Status::DirectoryIsNotEmpty => "UFS_DIRECTORY_IS_NOT_EMPTY",
            Status::CannotResolveStorage => "UFS_CANNOT_RESOLVE_STORAGE",
        }
    }
}

pub type Result<T> = std::result::Result<T, Status>;

thread_local! {
    static UFS_ERRNO: Cell<i64> = Cell::new(0);
}

/// Record `status` in the ambient status word.
pub fn set_errno(status: Status) {
    UFS_ERRNO.with(|e| e.set(status.code()));
}

/// The status of the most recent UFS call on this thread.
pub fn errno() -> Status {
    Status::from_code(UFS_ERRNO.with(|e| e.get()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip() {
        let all = [
            Status::NoError,
            Status::DoesNotExist,
            Status::ImageIsCorrupted,
            Status::VersionMismatch,
            Status::BadCall,
            Status::AlreadyExists,
            Status::OutOfMemory,
            Status::MappingAlreadyExists,
            Status::CantCreateFile,
            Status::UnknownError,
            Status::ImageTooSmall,
            Status::ImageCouldNotSync,
            Status::ViewContainsDuplicates,
            Status::InvalidAreaInView,
            Status::DirectoryIsNotEmpty,
            Status::CannotResolveStorage,
        ];
        for status in all {
            assert_eq!(Status::from_code(status.code()), status);
        }
    }

    #[test]
    fn test_codes_are_distinct() {
        let mut codes: Vec<i64> = (0..16).map(|i| -i).collect();
        codes.sort_unstable();
        codes.dedup();
        assert_eq!(codes.len(), 16);
    }

    #[test]
    fn test_unknown_code_folds_to_unknown_error() {
        assert_eq!(Status::from_code(-999), Status::UnknownError);
        assert_eq!(Status::from_code(42), Status::UnknownError);
    }

    #[test]
    fn test_errno_set_get() {
        set_errno(Status::AlreadyExists);
        assert_eq!(errno(), Status::AlreadyExists);
        set_errno(Status::NoError);
        assert_eq!(errno(), Status::NoError);
    }

    #[test]
    fn test_default_size_request_matches_legacy() {
        let req = SizeRequest::default();
        assert_eq!(req.num_files, 256);
        assert_eq!(req.num_areas, 256);
        assert_eq!(req.num_nodes, 512);
        assert_eq!(req.num_str_bytes, 1024);
        assert!(req.is_valid());
    }

    #[test]
    fn test_zero_capacity_is_invalid() {
        let req = SizeRequest {
            num_files: 0,
            ..SizeRequest::default()
        };
        assert!(!req.is_valid());
    }
}
