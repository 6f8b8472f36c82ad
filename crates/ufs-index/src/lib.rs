//! # ufs-index
//!
//! The on-image typed object store behind UFS, and the union-mount engine
//! on top of it.
//!
//! The image is carved into a fixed header plus four tables (Files, Areas,
//! Nodes, Strings) at alignment-correct offsets. Directories and files
//! share the File table, areas get their own, the Node table hosts the
//! ordered search trees that index everything, and names live in a bump
//! arena. The [`Ufs`] engine implements the union-mount algebra over these:
//! add/remove/get of storages and areas, set-semantics mappings, view
//! resolution, view-scoped directory iteration, and view collapse.

pub mod engine;
pub mod layout;
pub mod table;
pub mod tree;
pub mod view;

pub use engine::{DirIter, Ufs};
pub use layout::{AreaSlot, FileSlot, Header, NodeSlot};
pub use table::{SlotTable, StringArena};
pub use tree::Relation;

pub use ufs_defs::{errno, Id, Result, SizeRequest, Status, BASE, VIEW_MAX_SIZE, VIEW_TERMINATOR};
