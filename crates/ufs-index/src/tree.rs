//! Ordered search trees over the Node table.
//!
//! A [`Relation`] is one persistent set of composite keys (one or two
//! identifiers per entry) stored as a binary search tree whose cells live in
//! the Node table. The engine holds four relations over a single table:
//! directory names, area names, directory contents, and mappings.
//!
//! Each relation hangs off a permanently-owned anchor node whose `left`
//! field is the subtree root, so roots survive a reopen without widening the
//! image header. Insertion is plain unbalanced BST insertion; at the
//! capacities the index is built for, lookup depth is not a concern.
//!
//! Ordering is supplied by the caller as a comparator of the probe against a
//! stored key, which lets the engine order name indexes by interned string
//! and mapping sets by identifier pair with the same machinery.

use std::cmp::Ordering;
use std::ops::ControlFlow;

use ufs_defs::{Id, Result, Status};

use crate::layout::NodeSlot;
use crate::table::SlotTable;

/// Composite key held by one tree cell.
pub type Key = [Id; 2];

/// One persistent ordered set over the Node table.
#[derive(Debug, Clone, Copy)]
pub struct Relation {
    anchor: Id,
    arity: u8,
}

impl Relation {
    pub fn new(anchor: Id, arity: u8) -> Self {
        Self { anchor, arity }
    }

    /// Allocate an anchor cell for a new relation. Anchors are recognisable
    /// by `num_keys == 0` and are never freed.
    pub fn init_anchor(nodes: &mut SlotTable<NodeSlot>) -> Result<Id> {
        let (id, slot) = nodes.allocate().ok_or(Status::OutOfMemory)?;
        slot.left = 0;
        slot.right = 0;
        slot.keys = [0; 2];
        slot.num_keys = 0;
        Ok(id)
    }

    pub fn anchor(&self) -> Id {
        self.anchor
    }

    fn root(&self, nodes: &SlotTable<NodeSlot>) -> Result<Id> {
        nodes
            .get(self.anchor)
            .map(|slot| slot.left)
            .ok_or(Status::ImageIsCorrupted)
    }

    /// Insert `key`. `cmp` orders the new key against a stored key.
    pub fn insert(
        &self,
        nodes: &mut SlotTable<NodeSlot>,
        key: Key,
        mut cmp: impl FnMut(&Key) -> Ordering,
    ) -> Result<()> {
        let mut parent = self.anchor;
        let mut from_left = true;
        let mut curr = self.root(nodes)?;
        let mut steps = 0usize;

        while curr != 0 {
            steps += 1;
            if steps > nodes.capacity() {
                return Err(Status::ImageIsCorrupted);
            }
            let slot = nodes.get(curr).ok_or(Status::ImageIsCorrupted)?;
            let (left, right) = (slot.left, slot.right);
            match cmp(&slot.keys) {
                Ordering::Equal => return Err(Status::AlreadyExists),
                Ordering::Less => {
                    parent = curr;
                    from_left = true;
                    curr = left;
                }
                Ordering::Greater => {
                    parent = curr;
                    from_left = false;
                    curr = right;
                }
            }
        }

        let (id, slot) = nodes.allocate().ok_or(Status::OutOfMemory)?;
        slot.left = 0;
        slot.right = 0;
        slot.keys = key;
        slot.num_keys = self.arity;

        let parent_slot = nodes.get_mut(parent).ok_or(Status::ImageIsCorrupted)?;
        if from_left {
            parent_slot.left = id;
        } else {
            parent_slot.right = id;
        }
        Ok(())
    }

    /// Find the stored key matching the probe.
    pub fn lookup(
        &self,
        nodes: &SlotTable<NodeSlot>,
        mut cmp: impl FnMut(&Key) -> Ordering,
    ) -> Option<Key> {
        let mut curr = self.root(nodes).ok()?;
        let mut steps = 0usize;

        while curr != 0 {
            steps += 1;
            if steps > nodes.capacity() {
                return None;
            }
            let slot = nodes.get(curr)?;
            match cmp(&slot.keys) {
                Ordering::Equal => return Some(slot.keys),
                Ordering::Less => curr = slot.left,
                Ordering::Greater => curr = slot.right,
            }
        }
        None
    }

    pub fn contains(
        &self,
        nodes: &SlotTable<NodeSlot>,
        cmp: impl FnMut(&Key) -> Ordering,
    ) -> bool {
        self.lookup(nodes, cmp).is_some()
    }

    /// Remove the entry matching the probe.
    pub fn remove(
        &self,
        nodes: &mut SlotTable<NodeSlot>,
        mut cmp: impl FnMut(&Key) -> Ordering,
    ) -> Result<()> {
        let mut parent = self.anchor;
        let mut from_left = true;
        let mut curr = self.root(nodes)?;
        let mut steps = 0usize;

        loop {
            if curr == 0 {
                return Err(Status::DoesNotExist);
            }
            steps += 1;
            if steps > nodes.capacity() {
                return Err(Status::ImageIsCorrupted);
            }
            let slot = nodes.get(curr).ok_or(Status::ImageIsCorrupted)?;
            let (left, right) = (slot.left, slot.right);
            match cmp(&slot.keys) {
                Ordering::Equal => break,
                Ordering::Less => {
                    parent = curr;
                    from_left = true;
                    curr = left;
                }
                Ordering::Greater => {
                    parent = curr;
                    from_left = false;
                    curr = right;
                }
            }
        }

        let (victim_left, victim_right) = {
            let slot = nodes.get(curr).ok_or(Status::ImageIsCorrupted)?;
            (slot.left, slot.right)
        };

        if victim_left != 0 && victim_right != 0 {
            // Two children: pull the in-order successor up into the victim
            // cell, then splice the successor out of the right subtree.
            let mut succ_parent = curr;
            let mut succ = victim_right;
            let mut steps = 0usize;
            loop {
                steps += 1;
                if steps > nodes.capacity() {
                    return Err(Status::ImageIsCorrupted);
                }
                let slot = nodes.get(succ).ok_or(Status::ImageIsCorrupted)?;
                if slot.left == 0 {
                    break;
                }
                succ_parent = succ;
                succ = slot.left;
            }

            let (succ_keys, succ_num_keys, succ_right) = {
                let slot = nodes.get(succ).ok_or(Status::ImageIsCorrupted)?;
                (slot.keys, slot.num_keys, slot.right)
            };

            {
                let victim = nodes.get_mut(curr).ok_or(Status::ImageIsCorrupted)?;
                victim.keys = succ_keys;
                victim.num_keys = succ_num_keys;
            }

            if succ_parent == curr {
                nodes.get_mut(curr).ok_or(Status::ImageIsCorrupted)?.right = succ_right;
            } else {
                nodes.get_mut(succ_parent).ok_or(Status::ImageIsCorrupted)?.left = succ_right;
            }
            return nodes.free(succ);
        }

        let replacement = if victim_left != 0 {
            victim_left
        } else {
            victim_right
        };
        let parent_slot = nodes.get_mut(parent).ok_or(Status::ImageIsCorrupted)?;
        if from_left {
            parent_slot.left = replacement;
        } else {
            parent_slot.right = replacement;
        }
        nodes.free(curr)
    }

    /// Visit every entry matching a range probe.
    ///
    /// `range` orders the probe against a stored key: `Less` prunes to the
    /// left subtree, `Greater` to the right, `Equal` visits the entry and
    /// descends both sides. Visit order is unspecified.
    pub fn scan(
        &self,
        nodes: &SlotTable<NodeSlot>,
        mut range: impl FnMut(&Key) -> Ordering,
        mut visit: impl FnMut(&Key) -> ControlFlow<()>,
    ) -> Result<()> {
        let mut stack = vec![self.root(nodes)?];
        let mut steps = 0usize;

        while let Some(curr) = stack.pop() {
            if curr == 0 {
                continue;
            }
            steps += 1;
            if steps > nodes.capacity() {
                return Err(Status::ImageIsCorrupted);
            }
            let slot = nodes.get(curr).ok_or(Status::ImageIsCorrupted)?;
            match range(&slot.keys) {
                Ordering::Less => stack.push(slot.left),
                Ordering::Greater => stack.push(slot.right),
                Ordering::Equal => {
                    stack.push(slot.left);
                    stack.push(slot.right);
                    if let ControlFlow::Break(()) = visit(&slot.keys) {
                        return Ok(());
                    }
                }
            }
        }
        Ok(())
    }

    /// Visit every entry of the relation. Visit order is unspecified.
    pub fn for_each(
        &self,
        nodes: &SlotTable<NodeSlot>,
        visit: impl FnMut(&Key) -> ControlFlow<()>,
    ) -> Result<()> {
        self.scan(nodes, |_| Ordering::Equal, visit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use ufs_defs::SizeRequest;
    use ufs_image::Image;
    use crate::layout::Header;

    fn node_table(temp: &TempDir, num_nodes: u64) -> (Image, SlotTable<NodeSlot>) {
        let req = SizeRequest {
            num_files: 4,
            num_areas: 4,
            num_nodes,
            num_str_bytes: 64,
        };
        let mut image = Header::init(temp.path().join("ufs_index"), req).unwrap();
        let nodes = unsafe { SlotTable::<NodeSlot>::from_image(&mut image) };
        (image, nodes)
    }

    fn by_first(probe: Id) -> impl FnMut(&Key) -> Ordering {
        move |stored| probe.cmp(&stored[0])
    }

    fn by_pair(a: Id, b: Id) -> impl FnMut(&Key) -> Ordering {
        move |stored| (a, b).cmp(&(stored[0], stored[1]))
    }

    #[test]
    fn test_insert_and_lookup() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 32);
        let rel = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);

        for key in [50, 20, 70, 10, 60] {
            rel.insert(&mut nodes, [key, 0], by_first(key)).unwrap();
        }

        for key in [50, 20, 70, 10, 60] {
            assert_eq!(rel.lookup(&nodes, by_first(key)), Some([key, 0]));
        }
        assert_eq!(rel.lookup(&nodes, by_first(99)), None);
    }

    #[test]
    fn test_insert_duplicate() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 32);
        let rel = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);

        rel.insert(&mut nodes, [7, 0], by_first(7)).unwrap();
        assert_eq!(
            rel.insert(&mut nodes, [7, 0], by_first(7)).unwrap_err(),
            Status::AlreadyExists
        );
    }

    #[test]
    fn test_remove_missing() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 32);
        let rel = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);

        assert_eq!(
            rel.remove(&mut nodes, by_first(7)).unwrap_err(),
            Status::DoesNotExist
        );
    }

    #[test]
    fn test_remove_leaf_and_inner() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 32);
        let rel = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);

        for key in [50, 20, 70, 10, 30, 60, 80] {
            rel.insert(&mut nodes, [key, 0], by_first(key)).unwrap();
        }

        // Leaf.
        rel.remove(&mut nodes, by_first(10)).unwrap();
        // Inner node with two children.
        rel.remove(&mut nodes, by_first(20)).unwrap();
        // Root with two children.
        rel.remove(&mut nodes, by_first(50)).unwrap();

        for key in [10, 20, 50] {
            assert_eq!(rel.lookup(&nodes, by_first(key)), None);
        }
        for key in [30, 60, 70, 80] {
            assert!(rel.contains(&nodes, by_first(key)), "lost key {key}");
        }
    }

    #[test]
    fn test_remove_frees_node_slots() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 8);
        let rel = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);

        // 1 anchor + 7 entries fills the table.
        for key in 1..=7 {
            rel.insert(&mut nodes, [key, 0], by_first(key)).unwrap();
        }
        assert_eq!(
            rel.insert(&mut nodes, [8, 0], by_first(8)).unwrap_err(),
            Status::OutOfMemory
        );

        rel.remove(&mut nodes, by_first(4)).unwrap();
        rel.insert(&mut nodes, [8, 0], by_first(8)).unwrap();
    }

    #[test]
    fn test_scan_range_by_first_component() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 32);
        let rel = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 2);

        for (a, b) in [(1, 10), (1, 20), (2, 10), (3, 30), (1, 30)] {
            rel.insert(&mut nodes, [a, b], by_pair(a, b)).unwrap();
        }

        let mut seen = Vec::new();
        rel.scan(&nodes, by_first(1), |key| {
            seen.push(key[1]);
            ControlFlow::Continue(())
        })
        .unwrap();
        seen.sort_unstable();
        assert_eq!(seen, vec![10, 20, 30]);
    }

    #[test]
    fn test_for_each_early_exit() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 32);
        let rel = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);

        for key in [5, 3, 8, 1] {
            rel.insert(&mut nodes, [key, 0], by_first(key)).unwrap();
        }

        let mut visits = 0;
        rel.for_each(&nodes, |_| {
            visits += 1;
            ControlFlow::Break(())
        })
        .unwrap();
        assert_eq!(visits, 1);
    }

    #[test]
    fn test_relations_share_one_table() {
        let temp = TempDir::new().unwrap();
        let (_image, mut nodes) = node_table(&temp, 32);
        let first = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);
        let second = Relation::new(Relation::init_anchor(&mut nodes).unwrap(), 1);

        first.insert(&mut nodes, [1, 0], by_first(1)).unwrap();
        second.insert(&mut nodes, [2, 0], by_first(2)).unwrap();

        assert!(first.contains(&nodes, by_first(1)));
        assert!(!first.contains(&nodes, by_first(2)));
        assert!(second.contains(&nodes, by_first(2)));
        assert!(!second.contains(&nodes, by_first(1)));
    }
}
