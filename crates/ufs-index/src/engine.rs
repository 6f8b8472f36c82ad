//! The union-mount engine.
//!
//! [`Ufs`] owns the mapped image and four persistent relations over its Node
//! table: directory names, area names, directory contents, and the mapping
//! set. All engine state lives in the image; reopening the backing file
//! restores the store exactly.
//!
//! Every public operation records its outcome in the ambient status word in
//! addition to returning a typed result.

use std::cmp::Ordering;
use std::fs;
use std::ops::ControlFlow;
use std::path::Path;

use tracing::{debug, instrument};

use ufs_defs::{
    set_errno, Id, Result, SizeRequest, Status, BASE, BASE_NAME, UFS_DIRECTORY, UFS_IMAGE_FILE,
};
use ufs_image::Image;

use crate::layout::{AreaSlot, FileSlot, Header, NodeSlot, KIND_DIRECTORY, KIND_FILE};
use crate::table::{SlotTable, StringArena};
use crate::tree::{Key, Relation};
use crate::view;

const DIR_NAMES_ANCHOR: Id = 1;
const AREA_NAMES_ANCHOR: Id = 2;
const DIR_ENTRIES_ANCHOR: Id = 3;
const MAPPINGS_ANCHOR: Id = 4;

const ANCHORS: [Id; 4] = [
    DIR_NAMES_ANCHOR,
    AREA_NAMES_ANCHOR,
    DIR_ENTRIES_ANCHOR,
    MAPPINGS_ANCHOR,
];

/// Directory-listing callback: `(storage, entry, total)`.
///
/// Returning anything but [`Status::NoError`] halts the iteration and
/// propagates that status to the caller. Closure captures stand in for the
/// traditional user-data pointer.
pub type DirIter<'a> = &'a mut dyn FnMut(Id, u64, u64) -> Status;

/// The persistent union-mount store.
#[derive(Debug)]
pub struct Ufs {
    image: Image,
    files: SlotTable<FileSlot>,
    areas: SlotTable<AreaSlot>,
    nodes: SlotTable<NodeSlot>,
    strings: StringArena,
    dir_names: Relation,
    area_names: Relation,
    dir_entries: Relation,
    mappings: Relation,
}

fn finish<T>(result: Result<T>) -> Result<T> {
    match &result {
        Ok(_) => set_errno(Status::NoError),
        Err(status) => set_errno(*status),
    }
    result
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.as_bytes().contains(&0)
}

fn storage_name<'a>(
    files: &'a SlotTable<FileSlot>,
    strings: &'a StringArena,
    id: Id,
) -> &'a [u8] {
    files
        .get(id)
        .map(|slot| strings.read(slot.name_offset))
        .unwrap_or(&[])
}

fn area_label<'a>(areas: &'a SlotTable<AreaSlot>, strings: &'a StringArena, id: Id) -> &'a [u8] {
    areas
        .get(id)
        .map(|slot| strings.read(slot.name_offset))
        .unwrap_or(&[])
}

fn mapping_probe(area: Id, storage: Id) -> impl FnMut(&Key) -> Ordering {
    move |stored| (area, storage).cmp(&(stored[0], stored[1]))
}

impl Ufs {
    /// Open or initialise the store at the canonical `.ufs/ufs_index` path,
    /// relative to the working directory.
    pub fn init() -> Result<Self> {
        let path = Path::new(UFS_IMAGE_FILE);
        if !path.exists() && fs::create_dir_all(UFS_DIRECTORY).is_err() {
            set_errno(Status::CantCreateFile);
            return Err(Status::CantCreateFile);
        }
        Self::init_at(path, SizeRequest::default())
    }

    /// Open the store at `path`, creating a fresh image sized for `req` if
    /// the path does not exist yet.
    pub fn init_at<P: AsRef<Path>>(path: P, req: SizeRequest) -> Result<Self> {
        finish(Self::open_or_create(path.as_ref(), req))
    }

    fn open_or_create(path: &Path, req: SizeRequest) -> Result<Self> {
        let fresh = !path.exists();
        let mut image = if fresh {
            Header::init(path, req)?
        } else {
            let image = Image::open(path)?;
            Header::validate(&image)?;
            image
        };

        // Safety: the engine owns the image for the lifetime of every view,
        // the mapping address is stable, and the header was just validated.
        let files = unsafe { SlotTable::<FileSlot>::from_image(&mut image) };
        let areas = unsafe { SlotTable::<AreaSlot>::from_image(&mut image) };
        let mut nodes = unsafe { SlotTable::<NodeSlot>::from_image(&mut image) };
        let strings = unsafe { StringArena::from_image(&mut image) };

        if fresh {
            for expected in ANCHORS {
                let id = Relation::init_anchor(&mut nodes)?;
                debug_assert_eq!(id, expected);
            }
            image.sync()?;
        } else {
            for anchor in ANCHORS {
                let sound = nodes.get(anchor).is_some_and(|slot| slot.num_keys == 0);
                if !sound {
                    return Err(Status::ImageIsCorrupted);
                }
            }
        }

        debug!(path = %path.display(), fresh, "ufs index ready");

        Ok(Self {
            image,
            files,
            areas,
            nodes,
            strings,
            dir_names: Relation::new(DIR_NAMES_ANCHOR, 1),
            area_names: Relation::new(AREA_NAMES_ANCHOR, 1),
            dir_entries: Relation::new(DIR_ENTRIES_ANCHOR, 2),
            mappings: Relation::new(MAPPINGS_ANCHOR, 2),
        })
    }

    /// Flush the image, then release the mapping and all process-local
    /// resources.
    pub fn destroy(self) {
        let _ = self.image.sync();
    }

    /// Explicit durability point: everything written so far reaches the
    /// backing device before this returns.
    pub fn sync(&self) -> Result<()> {
        finish(self.image.sync())
    }

    /// The underlying image.
    pub fn image(&self) -> &Image {
        &self.image
    }

    // --- storages and areas ---------------------------------------------

    #[instrument(skip(self), level = "debug")]
    pub fn add_directory(&mut self, name: &str) -> Result<Id> {
        finish(self.add_directory_named(name))
    }

    #[instrument(skip(self), level = "debug")]
    pub fn add_file(&mut self, directory: Id, name: &str) -> Result<Id> {
        finish(self.add_file_in(directory, name))
    }

    #[instrument(skip(self), level = "debug")]
    pub fn add_area(&mut self, name: &str) -> Result<Id> {
        finish(self.add_area_named(name))
    }

    pub fn get_directory(&self, name: &str) -> Result<Id> {
        finish(self.find_directory(name))
    }

    pub fn get_file(&self, directory: Id, name: &str) -> Result<Id> {
        finish(self.find_file(directory, name))
    }

    pub fn get_area(&self, name: &str) -> Result<Id> {
        finish(self.find_area(name))
    }

    #[instrument(skip(self), level = "debug")]
    pub fn remove_directory(&mut self, directory: Id) -> Result<()> {
        finish(self.drop_directory(directory))
    }

    #[instrument(skip(self), level = "debug")]
    pub fn remove_file(&mut self, file: Id) -> Result<()> {
        finish(self.drop_file(file))
    }

    #[instrument(skip(self), level = "debug")]
    pub fn remove_area(&mut self, area: Id) -> Result<()> {
        finish(self.drop_area(area))
    }

    fn add_directory_named(&mut self, name: &str) -> Result<Id> {
        if !valid_name(name) {
            return Err(Status::BadCall);
        }
        let probe = name.as_bytes();

        {
            let (files, strings) = (&self.files, &self.strings);
            let clash = self
                .dir_names
                .lookup(&self.nodes, |k| probe.cmp(storage_name(files, strings, k[0])));
            if clash.is_some() {
                return Err(Status::AlreadyExists);
            }
        }

        let offset = self.strings.intern(probe).ok_or(Status::OutOfMemory)?;
        let (id, slot) = self.files.allocate().ok_or(Status::OutOfMemory)?;
        slot.kind = KIND_DIRECTORY;
        slot.name_offset = offset;

        let inserted = {
            let (files, strings) = (&self.files, &self.strings);
            self.dir_names
                .insert(&mut self.nodes, [id, 0], |k| {
                    probe.cmp(storage_name(files, strings, k[0]))
                })
        };
        if let Err(status) = inserted {
            let _ = self.files.free(id);
            return Err(status);
        }

        debug!(id, name, "added directory");
        Ok(id)
    }

    fn add_file_in(&mut self, directory: Id, name: &str) -> Result<Id> {
        if directory <= 0 || !valid_name(name) {
            return Err(Status::BadCall);
        }
        if !self.is_directory(directory) {
            return Err(Status::DoesNotExist);
        }
        let probe = name.as_bytes();

        {
            let (files, strings) = (&self.files, &self.strings);
            let clash = self.dir_entries.lookup(&self.nodes, |k| {
                directory
                    .cmp(&k[0])
                    .then_with(|| probe.cmp(storage_name(files, strings, k[1])))
            });
            if clash.is_some() {
                return Err(Status::AlreadyExists);
            }
        }

        let offset = self.strings.intern(probe).ok_or(Status::OutOfMemory)?;
        let (id, slot) = self.files.allocate().ok_or(Status::OutOfMemory)?;
        slot.kind = KIND_FILE;
        slot.name_offset = offset;

        let inserted = {
            let (files, strings) = (&self.files, &self.strings);
            self.dir_entries.insert(&mut self.nodes, [directory, id], |k| {
                directory
                    .cmp(&k[0])
                    .then_with(|| probe.cmp(storage_name(files, strings, k[1])))
            })
        };
        if let Err(status) = inserted {
            let _ = self.files.free(id);
            return Err(status);
        }

        debug!(id, directory, name, "added file");
        Ok(id)
    }

    fn add_area_named(&mut self, name: &str) -> Result<Id> {
        if !valid_name(name) || name == BASE_NAME {
            return Err(Status::BadCall);
        }
        let probe = name.as_bytes();

        {
            let (areas, strings) = (&self.areas, &self.strings);
            let clash = self
                .area_names
                .lookup(&self.nodes, |k| probe.cmp(area_label(areas, strings, k[0])));
            if clash.is_some() {
                return Err(Status::AlreadyExists);
            }
        }

        let offset = self.strings.intern(probe).ok_or(Status::OutOfMemory)?;
        let (id, slot) = self.areas.allocate().ok_or(Status::OutOfMemory)?;
        slot.name_offset = offset;

        let inserted = {
            let (areas, strings) = (&self.areas, &self.strings);
            self.area_names
                .insert(&mut self.nodes, [id, 0], |k| {
                    probe.cmp(area_label(areas, strings, k[0]))
                })
        };
        if let Err(status) = inserted {
            let _ = self.areas.free(id);
            return Err(status);
        }

        debug!(id, name, "added area");
        Ok(id)
    }

    fn find_directory(&self, name: &str) -> Result<Id> {
        if !valid_name(name) {
            return Err(Status::BadCall);
        }
        let probe = name.as_bytes();
        let (files, strings) = (&self.files, &self.strings);
        self.dir_names
            .lookup(&self.nodes, |k| probe.cmp(storage_name(files, strings, k[0])))
            .map(|k| k[0])
            .ok_or(Status::DoesNotExist)
    }

    fn find_file(&self, directory: Id, name: &str) -> Result<Id> {
        if directory <= 0 || !valid_name(name) {
            return Err(Status::BadCall);
        }
        if !self.is_directory(directory) {
            return Err(Status::DoesNotExist);
        }
        let probe = name.as_bytes();
        let (files, strings) = (&self.files, &self.strings);
        self.dir_entries
            .lookup(&self.nodes, |k| {
                directory
                    .cmp(&k[0])
                    .then_with(|| probe.cmp(storage_name(files, strings, k[1])))
            })
            .map(|k| k[1])
            .ok_or(Status::DoesNotExist)
    }

    fn find_area(&self, name: &str) -> Result<Id> {
        if !valid_name(name) {
            return Err(Status::BadCall);
        }
        if name == BASE_NAME {
            return Ok(BASE);
        }
        let probe = name.as_bytes();
        let (areas, strings) = (&self.areas, &self.strings);
        self.area_names
            .lookup(&self.nodes, |k| probe.cmp(area_label(areas, strings, k[0])))
            .map(|k| k[0])
            .ok_or(Status::DoesNotExist)
    }

    fn drop_directory(&mut self, directory: Id) -> Result<()> {
        if directory <= 0 {
            return Err(Status::BadCall);
        }
        if !self.is_directory(directory) {
            return Err(Status::DoesNotExist);
        }

        let mut occupied = false;
        self.dir_entries.scan(
            &self.nodes,
            |k| directory.cmp(&k[0]),
            |_| {
                occupied = true;
                ControlFlow::Break(())
            },
        )?;
        if occupied {
            return Err(Status::DirectoryIsNotEmpty);
        }

        self.remove_mappings_of_storage(directory)?;

        let name = storage_name(&self.files, &self.strings, directory).to_vec();
        {
            let (files, strings) = (&self.files, &self.strings);
            self.dir_names.remove(&mut self.nodes, |k| {
                name.as_slice().cmp(storage_name(files, strings, k[0]))
            })?;
        }
        self.files.free(directory)?;

        debug!(directory, "removed directory");
        Ok(())
    }

    fn drop_file(&mut self, file: Id) -> Result<()> {
        if file <= 0 {
            return Err(Status::BadCall);
        }
        let is_file = self
            .files
            .get(file)
            .is_some_and(|slot| slot.kind == KIND_FILE);
        if !is_file {
            return Err(Status::DoesNotExist);
        }

        // Detach from the directory that holds it.
        let mut parent = None;
        self.dir_entries.for_each(&self.nodes, |k| {
            if k[1] == file {
                parent = Some(k[0]);
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        if let Some(directory) = parent {
            let name = storage_name(&self.files, &self.strings, file).to_vec();
            let (files, strings) = (&self.files, &self.strings);
            self.dir_entries.remove(&mut self.nodes, |k| {
                directory
                    .cmp(&k[0])
                    .then_with(|| name.as_slice().cmp(storage_name(files, strings, k[1])))
            })?;
        }

        self.remove_mappings_of_storage(file)?;
        self.files.free(file)?;

        debug!(file, "removed file");
        Ok(())
    }

    fn drop_area(&mut self, area: Id) -> Result<()> {
        // BASE (0) can never be removed; it is caught here as a bad call.
        if area <= 0 {
            return Err(Status::BadCall);
        }
        if self.areas.get(area).is_none() {
            return Err(Status::DoesNotExist);
        }

        let mut storages = Vec::new();
        self.mappings.scan(
            &self.nodes,
            |k| area.cmp(&k[0]),
            |k| {
                storages.push(k[1]);
                ControlFlow::Continue(())
            },
        )?;
        for storage in storages {
            self.mappings
                .remove(&mut self.nodes, mapping_probe(area, storage))?;
        }

        let name = area_label(&self.areas, &self.strings, area).to_vec();
        {
            let (areas, strings) = (&self.areas, &self.strings);
            self.area_names.remove(&mut self.nodes, |k| {
                name.as_slice().cmp(area_label(areas, strings, k[0]))
            })?;
        }
        self.areas.free(area)?;

        debug!(area, "removed area");
        Ok(())
    }

    // --- mappings -------------------------------------------------------

    #[instrument(skip(self), level = "debug")]
    pub fn add_mapping(&mut self, area: Id, storage: Id) -> Result<()> {
        finish(self.insert_mapping(area, storage))
    }

    pub fn probe_mapping(&self, area: Id, storage: Id) -> Result<()> {
        finish(self.check_mapping(area, storage))
    }

    fn insert_mapping(&mut self, area: Id, storage: Id) -> Result<()> {
        // BASE cannot be the area of an explicit mapping.
        if area <= 0 || storage <= 0 {
            return Err(Status::BadCall);
        }
        if self.areas.get(area).is_none() || self.files.get(storage).is_none() {
            return Err(Status::DoesNotExist);
        }

        self.mappings
            .insert(&mut self.nodes, [area, storage], mapping_probe(area, storage))?;

        debug!(area, storage, "added mapping");
        Ok(())
    }

    fn check_mapping(&self, area: Id, storage: Id) -> Result<()> {
        if area <= 0 || storage <= 0 {
            return Err(Status::BadCall);
        }
        if self.areas.get(area).is_none() || self.files.get(storage).is_none() {
            return Err(Status::DoesNotExist);
        }
        if self.mappings.contains(&self.nodes, mapping_probe(area, storage)) {
            Ok(())
        } else {
            Err(Status::DoesNotExist)
        }
    }

    fn remove_mappings_of_storage(&mut self, storage: Id) -> Result<()> {
        let mut areas = Vec::new();
        self.mappings.for_each(&self.nodes, |k| {
            if k[1] == storage {
                areas.push(k[0]);
            }
            ControlFlow::Continue(())
        })?;
        for area in areas {
            self.mappings
                .remove(&mut self.nodes, mapping_probe(area, storage))?;
        }
        Ok(())
    }

    fn has_explicit_mapping(&self, storage: Id) -> Result<bool> {
        let mut found = false;
        self.mappings.for_each(&self.nodes, |k| {
            if k[1] == storage {
                found = true;
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })?;
        Ok(found)
    }

    // --- views ----------------------------------------------------------

    /// Resolve `storage` over `view`, returning the first area that
    /// projects it. A BASE entry shadows everything behind it: the external
    /// filesystem is authoritative from that point on.
    pub fn resolve_storage_in_view(&self, raw_view: &[Id], storage: Id) -> Result<Id> {
        finish(self.resolve_in(raw_view, storage))
    }

    /// Iterate the union of `directory`'s files visible through `view`.
    /// Set semantics: order is unspecified, every name appears once.
    pub fn iterate_dir_in_view(
        &self,
        raw_view: &[Id],
        directory: Id,
        iterator: DirIter<'_>,
    ) -> Result<()> {
        finish(self.iterate_in(raw_view, directory, iterator))
    }

    /// Fold every mapping of the earlier view entries into the view's last
    /// entry, then sync.
    #[instrument(skip(self), level = "debug")]
    pub fn collapse(&mut self, raw_view: &[Id]) -> Result<()> {
        finish(self.collapse_into_last(raw_view))
    }

    fn validate_view(&self, raw_view: &[Id]) -> Result<Vec<Id>> {
        let entries = view::effective(raw_view);
        view::check_duplicates(entries)?;
        for &entry in entries {
            if entry == BASE {
                continue;
            }
            if entry < 0 || self.areas.get(entry).is_none() {
                return Err(Status::InvalidAreaInView);
            }
        }
        Ok(entries.to_vec())
    }

    fn resolve_in(&self, raw_view: &[Id], storage: Id) -> Result<Id> {
        if storage <= 0 {
            return Err(Status::BadCall);
        }
        let entries = self.validate_view(raw_view)?;
        if self.files.get(storage).is_none() {
            return Err(Status::DoesNotExist);
        }

        for &area in &entries {
            if area == BASE {
                return Ok(BASE);
            }
            if self.mappings.contains(&self.nodes, mapping_probe(area, storage)) {
                return Ok(area);
            }
        }

        // A BASE entry returns during the walk, so a view that reaches this
        // point has no BASE and cannot supply the implicit projection.
        Err(Status::CannotResolveStorage)
    }

    fn iterate_in(
        &self,
        raw_view: &[Id],
        directory: Id,
        iterator: DirIter<'_>,
    ) -> Result<()> {
        if directory <= 0 {
            return Err(Status::BadCall);
        }
        let entries = self.validate_view(raw_view)?;
        if !self.is_directory(directory) {
            return Err(Status::DoesNotExist);
        }

        let mut children = Vec::new();
        self.dir_entries.scan(
            &self.nodes,
            |k| directory.cmp(&k[0]),
            |k| {
                children.push(k[1]);
                ControlFlow::Continue(())
            },
        )?;

        let mut visible = Vec::new();
        for file in children {
            for &area in &entries {
                let projected = if area == BASE {
                    !self.has_explicit_mapping(file)?
                } else {
                    self.mappings.contains(&self.nodes, mapping_probe(area, file))
                };
                if projected {
                    visible.push(file);
                    break;
                }
            }
        }

        let total = visible.len() as u64;
        for (position, file) in visible.into_iter().enumerate() {
            let status = iterator(file, position as u64, total);
            if status != Status::NoError {
                return Err(status);
            }
        }
        Ok(())
    }

    fn collapse_into_last(&mut self, raw_view: &[Id]) -> Result<()> {
        let entries = self.validate_view(raw_view)?;
        let last = match entries.last() {
            Some(&last) => last,
            None => return Err(Status::BadCall),
        };

        for &area in &entries[..entries.len() - 1] {
            if area == BASE {
                continue;
            }

            let mut storages = Vec::new();
            self.mappings.scan(
                &self.nodes,
                |k| area.cmp(&k[0]),
                |k| {
                    storages.push(k[1]);
                    ControlFlow::Continue(())
                },
            )?;

            for storage in storages {
                self.mappings
                    .remove(&mut self.nodes, mapping_probe(area, storage))?;
                if last != BASE {
                    match self.mappings.insert(
                        &mut self.nodes,
                        [last, storage],
                        mapping_probe(last, storage),
                    ) {
                        Ok(()) | Err(Status::AlreadyExists) => {}
                        Err(status) => return Err(status),
                    }
                }
            }
        }

        if last == BASE {
            // Applying the folded mappings to the external filesystem is the
            // mount wrapper's job; here they are only released.
            debug!("collapsed view into BASE");
        }

        self.image.sync()?;
        Ok(())
    }

    // --- helpers --------------------------------------------------------

    fn is_directory(&self, id: Id) -> bool {
        self.files
            .get(id)
            .is_some_and(|slot| slot.kind == KIND_DIRECTORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn small_request() -> SizeRequest {
        SizeRequest {
            num_files: 16,
            num_areas: 8,
            num_nodes: 64,
            num_str_bytes: 256,
        }
    }

    fn fresh(temp: &TempDir) -> Ufs {
        Ufs::init_at(temp.path().join("ufs_index"), small_request()).unwrap()
    }

    #[test]
    fn test_add_directory_rejects_bad_names() {
        let temp = TempDir::new().unwrap();
        let mut ufs = fresh(&temp);

        assert_eq!(ufs.add_directory("").unwrap_err(), Status::BadCall);
        assert_eq!(ufs.add_directory("a\0b").unwrap_err(), Status::BadCall);
    }

    #[test]
    fn test_add_area_rejects_base_keyword() {
        let temp = TempDir::new().unwrap();
        let mut ufs = fresh(&temp);

        assert_eq!(ufs.add_area("BASE").unwrap_err(), Status::BadCall);
    }

    #[test]
    fn test_get_area_base_keyword_is_always_valid() {
        let temp = TempDir::new().unwrap();
        let ufs = fresh(&temp);

        assert_eq!(ufs.get_area("BASE").unwrap(), BASE);
    }

    #[test]
    fn test_ids_are_unique_within_type() {
        let temp = TempDir::new().unwrap();
        let mut ufs = fresh(&temp);

        let d = ufs.add_directory("d").unwrap();
        let e = ufs.add_directory("e").unwrap();
        assert!(d > 0 && e > 0 && d != e);

        let a = ufs.add_area("a").unwrap();
        let b = ufs.add_area("b").unwrap();
        assert!(a > 0 && b > 0 && a != b);
    }

    #[test]
    fn test_files_and_directories_share_id_space() {
        let temp = TempDir::new().unwrap();
        let mut ufs = fresh(&temp);

        let d = ufs.add_directory("d").unwrap();
        let f = ufs.add_file(d, "f").unwrap();
        assert_ne!(d, f, "both live in the File table");
    }

    #[test]
    fn test_add_file_rejects_file_parent() {
        let temp = TempDir::new().unwrap();
        let mut ufs = fresh(&temp);

        let d = ufs.add_directory("d").unwrap();
        let f = ufs.add_file(d, "f").unwrap();
        assert_eq!(ufs.add_file(f, "g").unwrap_err(), Status::DoesNotExist);
    }

    #[test]
    fn test_same_file_name_in_two_directories() {
        let temp = TempDir::new().unwrap();
        let mut ufs = fresh(&temp);

        let d1 = ufs.add_directory("d1").unwrap();
        let d2 = ufs.add_directory("d2").unwrap();
        let f1 = ufs.add_file(d1, "same").unwrap();
        let f2 = ufs.add_file(d2, "same").unwrap();
        assert_ne!(f1, f2);
        assert_eq!(ufs.get_file(d1, "same").unwrap(), f1);
        assert_eq!(ufs.get_file(d2, "same").unwrap(), f2);
    }

    #[test]
    fn test_errno_mirrors_results() {
        let temp = TempDir::new().unwrap();
        let mut ufs = fresh(&temp);

        ufs.add_directory("d").unwrap();
        assert_eq!(ufs_defs::errno(), Status::NoError);

        let _ = ufs.add_directory("d");
        assert_eq!(ufs_defs::errno(), Status::AlreadyExists);
    }
}
