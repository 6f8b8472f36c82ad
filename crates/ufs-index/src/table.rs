//! Fixed-capacity slot tables and the string arena.
//!
//! Each table is a typed view over a sub-range of the image, located through
//! the header. Identifiers are `slot index + 1`, so 0 stays free for the
//! BASE pseudo-area and negatives for status codes.

use std::marker::PhantomData;

use ufs_defs::{Id, Result, Status, TypeTag};
use ufs_image::Image;

use crate::layout::{AreaSlot, FileSlot, Header, NodeSlot, KIND_FILE};

/// An element of a typed table.
pub trait Slot {
    const TAG: TypeTag;

    fn owned(&self) -> bool;
    fn set_owned(&mut self, owned: bool);
    /// Restore the slot to its freshly-allocated state.
    fn reset(&mut self);
}

impl Slot for FileSlot {
    const TAG: TypeTag = TypeTag::File;

    fn owned(&self) -> bool {
        self.owned != 0
    }

    fn set_owned(&mut self, owned: bool) {
        self.owned = owned as u8;
    }

    fn reset(&mut self) {
        self.owned = 0;
        self.kind = KIND_FILE;
        self.name_offset = 0;
    }
}

impl Slot for AreaSlot {
    const TAG: TypeTag = TypeTag::Area;

    fn owned(&self) -> bool {
        self.owned != 0
    }

    fn set_owned(&mut self, owned: bool) {
        self.owned = owned as u8;
    }

    fn reset(&mut self) {
        self.owned = 0;
        self.name_offset = 0;
    }
}

impl Slot for NodeSlot {
    const TAG: TypeTag = TypeTag::Node;

    fn owned(&self) -> bool {
        self.owned != 0
    }

    fn set_owned(&mut self, owned: bool) {
        self.owned = owned as u8;
    }

    fn reset(&mut self) {
        self.owned = 0;
        self.left = 0;
        self.right = 0;
        self.keys = [0; 2];
        self.num_keys = 0;
    }
}

/// Typed view over one table of the image.
///
/// Holds a raw base pointer rather than a borrow so that the engine can keep
/// all four views alive at once; the ranges they cover are disjoint.
pub struct SlotTable<T> {
    base: *mut T,
    capacity: usize,
    _marker: PhantomData<T>,
}

impl<T> std::fmt::Debug for SlotTable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlotTable")
            .field("base", &self.base)
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl<T: Slot> SlotTable<T> {
    /// Build a view over `T`'s table.
    ///
    /// # Safety
    ///
    /// The image must outlive the view, its mapping address must not move,
    /// and the header must have been validated so the declared table range
    /// lies within the mapping.
    pub unsafe fn from_image(image: &mut Image) -> Self {
        let header = Header::get(image);
        let offset = header.offsets[T::TAG as usize] as usize;
        let capacity = header.sizes[T::TAG as usize] as usize;
        let base = image.as_mut_ptr().add(offset) as *mut T;
        Self {
            base,
            capacity,
            _marker: PhantomData,
        }
    }

    /// Claim the first free slot. Returns `None` when the table is full;
    /// the caller reports out-of-memory.
    pub fn allocate(&mut self) -> Option<(Id, &mut T)> {
        let index = (0..self.capacity).find(|&i| !unsafe { &*self.base.add(i) }.owned())?;
        let slot = unsafe { &mut *self.base.add(index) };
        slot.reset();
        slot.set_owned(true);
        Some(((index + 1) as Id, slot))
    }

    /// Release a slot. Lookups by this id fail until it is reallocated.
    pub fn free(&mut self, id: Id) -> Result<()> {
        match self.index(id) {
            Some(index) => {
                let slot = unsafe { &mut *self.base.add(index) };
                if !slot.owned() {
                    return Err(Status::DoesNotExist);
                }
                slot.set_owned(false);
                Ok(())
            }
            None => Err(Status::DoesNotExist),
        }
    }

    pub fn get(&self, id: Id) -> Option<&T> {
        let index = self.index(id)?;
        let slot = unsafe { &*self.base.add(index) };
        slot.owned().then_some(slot)
    }

    pub fn get_mut(&mut self, id: Id) -> Option<&mut T> {
        let index = self.index(id)?;
        let slot = unsafe { &mut *self.base.add(index) };
        if slot.owned() {
            Some(slot)
        } else {
            None
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn index(&self, id: Id) -> Option<usize> {
        if id >= 1 && (id as usize) <= self.capacity {
            Some((id - 1) as usize)
        } else {
            None
        }
    }
}

/// Bump arena for NUL-terminated names.
///
/// Offsets handed out are image-absolute. There is no deduplication and no
/// reclamation; removing an entity leaves its name bytes behind. The write
/// cursor is recovered at open time by scanning for the last non-zero byte,
/// which is exact because names are non-empty and the arena starts zeroed.
#[derive(Debug)]
pub struct StringArena {
    base: *mut u8,
    image_offset: u64,
    capacity: usize,
    cursor: usize,
}

impl StringArena {
    /// Build a view over the string arena and recover the write cursor.
    ///
    /// # Safety
    ///
    /// Same contract as [`SlotTable::from_image`].
    pub unsafe fn from_image(image: &mut Image) -> Self {
        let header = Header::get(image);
        let image_offset = header.offsets[TypeTag::String as usize];
        let capacity = header.sizes[TypeTag::String as usize] as usize;
        let base = image.as_mut_ptr().add(image_offset as usize);

        let mut arena = Self {
            base,
            image_offset,
            capacity,
            cursor: 0,
        };
        arena.recover_cursor();
        arena
    }

    fn recover_cursor(&mut self) {
        let bytes = unsafe { std::slice::from_raw_parts(self.base, self.capacity) };
        self.cursor = match bytes.iter().rposition(|&b| b != 0) {
            Some(last) => (last + 2).min(self.capacity),
            None => 0,
        };
    }

    /// Append `name` plus a NUL terminator, returning the image-absolute
    /// offset of its first byte. `None` when the free region does not fit.
    pub fn intern(&mut self, name: &[u8]) -> Option<u64> {
        let needed = name.len() + 1;
        if self.capacity - self.cursor < needed {
            return None;
        }

        unsafe {
            std::ptr::copy_nonoverlapping(name.as_ptr(), self.base.add(self.cursor), name.len());
            *self.base.add(self.cursor + name.len()) = 0;
        }

        let offset = self.image_offset + self.cursor as u64;
        self.cursor += needed;
        Some(offset)
    }

    /// The bytes at `offset`, up to the first NUL. Out-of-range offsets read
    /// as the empty string.
    pub fn read(&self, offset: u64) -> &[u8] {
        let rel = match offset.checked_sub(self.image_offset) {
            Some(rel) if (rel as usize) < self.capacity => rel as usize,
            _ => return &[],
        };
        let bytes = unsafe { std::slice::from_raw_parts(self.base.add(rel), self.capacity - rel) };
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        &bytes[..end]
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes consumed so far, including NUL terminators.
    pub fn used(&self) -> usize {
        self.cursor
    }
}
