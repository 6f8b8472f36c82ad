//! On-image layout: the fixed header and the slot structs of the four
//! sub-tables.
//!
//! A single computation ([`table_layout`]) decides the byte offset of every
//! table, so image creation, validation, and any external tool agree on the
//! exact positions. The offsets are also recorded inside the image itself.

use std::mem::{align_of, size_of};

use ufs_defs::{
    set_errno, Id, Result, SizeRequest, Status, TypeTag, UFS_INDEX_VERSION, UFS_MAGIC,
};
use ufs_image::{Image, LEN_PRELUDE};

/// Storage kind discriminant for [`FileSlot::kind`].
pub const KIND_FILE: u8 = 0;
/// Storage kind discriminant for [`FileSlot::kind`].
pub const KIND_DIRECTORY: u8 = 1;

/// A slot of the File table. Holds both files and directories,
/// distinguished by `kind`.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct FileSlot {
    pub owned: u8,
    pub kind: u8,
    pub name_offset: u64,
}

/// A slot of the Area table.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct AreaSlot {
    pub owned: u8,
    pub name_offset: u64,
}

/// A cell of the ordered search tree living in the Node table.
///
/// `keys` carries a composite key of one or two identifiers (`num_keys`
/// records the arity); `left` and `right` refer to other node slots by id,
/// with 0 meaning "no child".
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct NodeSlot {
    pub owned: u8,
    pub left: Id,
    pub right: Id,
    pub keys: [Id; 2],
    pub num_keys: u8,
}

/// The fixed header. Lives at `align_up(8, align_of::<Header>())`, right
/// after the image's length prelude.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct Header {
    pub magic: u32,
    pub version: u32,
    pub sizes: [u64; TypeTag::COUNT],
    pub offsets: [u64; TypeTag::COUNT],
}

pub(crate) fn align_up(val: u64, align: u64) -> u64 {
    (val + (align - 1)) & !(align - 1)
}

pub(crate) fn page_size() -> u64 {
    let page = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if page <= 0 {
        4096
    } else {
        page as u64
    }
}

/// Byte offset of the header inside the image.
pub fn header_offset() -> u64 {
    align_up(LEN_PRELUDE, align_of::<Header>() as u64)
}

/// Size of one element of the given table.
pub fn slot_size(tag: TypeTag) -> u64 {
    match tag {
        TypeTag::File => size_of::<FileSlot>() as u64,
        TypeTag::Area => size_of::<AreaSlot>() as u64,
        TypeTag::Node => size_of::<NodeSlot>() as u64,
        TypeTag::String => 1,
    }
}

fn slot_align(tag: TypeTag) -> u64 {
    match tag {
        TypeTag::File => align_of::<FileSlot>() as u64,
        TypeTag::Area => align_of::<AreaSlot>() as u64,
        TypeTag::Node => align_of::<NodeSlot>() as u64,
        TypeTag::String => 1,
    }
}

fn capacity(req: &SizeRequest, tag: TypeTag) -> u64 {
    match tag {
        TypeTag::File => req.num_files,
        TypeTag::Area => req.num_areas,
        TypeTag::Node => req.num_nodes,
        TypeTag::String => req.num_str_bytes,
    }
}

const TAGS: [TypeTag; TypeTag::COUNT] =
    [TypeTag::File, TypeTag::Area, TypeTag::Node, TypeTag::String];

/// Absolute byte offset of every table, plus the end of the last one
/// (before page rounding).
fn table_layout(req: &SizeRequest) -> ([u64; TypeTag::COUNT], u64) {
    let mut offset = header_offset() + size_of::<Header>() as u64;
    let mut offsets = [0u64; TypeTag::COUNT];
    for tag in TAGS {
        offset = align_up(offset, slot_align(tag));
        offsets[tag as usize] = offset;
        offset += slot_size(tag) * capacity(req, tag);
    }
    (offsets, offset)
}

/// Total image length for a capacity request, padded to the page size.
pub fn resolve_size(req: &SizeRequest) -> u64 {
    align_up(table_layout(req).1, page_size())
}

impl Header {
    /// Create a fresh image at `path` sized for `req` and stamp the header.
    ///
    /// The path must not already exist; re-initialising over live state is
    /// rejected as a bad call. Image-layer errors propagate unchanged.
    pub fn init<P: AsRef<std::path::Path>>(path: P, req: SizeRequest) -> Result<Image> {
        let path = path.as_ref();

        if path.as_os_str().is_empty() || !req.is_valid() {
            set_errno(Status::BadCall);
            return Err(Status::BadCall);
        }
        if path.exists() {
            set_errno(Status::BadCall);
            return Err(Status::BadCall);
        }

        let mut image = Image::create(path, resolve_size(&req))?;
        Self::mount(&mut image, &req);
        Self::validate(&image)?;

        set_errno(Status::NoError);
        Ok(image)
    }

    fn mount(image: &mut Image, req: &SizeRequest) {
        let (offsets, _) = table_layout(req);
        let header = Self::get_mut(image);

        header.magic = UFS_MAGIC;
        header.version = UFS_INDEX_VERSION;
        for tag in TAGS {
            header.sizes[tag as usize] = capacity(req, tag);
            header.offsets[tag as usize] = offsets[tag as usize];
        }
    }

    /// Accept the image iff its magic and version match and every declared
    /// table fits within the mapped length.
    pub fn validate(image: &Image) -> Result<()> {
        let header_end = header_offset() + size_of::<Header>() as u64;
        if image.len() < header_end {
            set_errno(Status::ImageIsCorrupted);
            return Err(Status::ImageIsCorrupted);
        }

        let header = Self::get(image);

        if header.magic != UFS_MAGIC {
            set_errno(Status::ImageIsCorrupted);
            return Err(Status::ImageIsCorrupted);
        }
        if header.version != UFS_INDEX_VERSION {
            set_errno(Status::VersionMismatch);
            return Err(Status::VersionMismatch);
        }

        for tag in TAGS {
            let end = header.sizes[tag as usize]
                .checked_mul(slot_size(tag))
                .and_then(|bytes| header.offsets[tag as usize].checked_add(bytes));
            match end {
                Some(end) if end <= image.len() => {}
                _ => {
                    set_errno(Status::ImageIsCorrupted);
                    return Err(Status::ImageIsCorrupted);
                }
            }
        }

        set_errno(Status::NoError);
        Ok(())
    }

    /// The header of `image`.
    ///
    /// The image must be at least `header_offset() + size_of::<Header>()`
    /// bytes long; [`Header::validate`] checks this before touching any
    /// header field.
    pub fn get(image: &Image) -> &Header {
        assert!(image.len() >= header_offset() + size_of::<Header>() as u64);
        unsafe { &*(image.as_slice().as_ptr().add(header_offset() as usize) as *const Header) }
    }

    pub fn get_mut(image: &mut Image) -> &mut Header {
        assert!(image.len() >= header_offset() + size_of::<Header>() as u64);
        unsafe { &mut *(image.as_mut_ptr().add(header_offset() as usize) as *mut Header) }
    }
}
