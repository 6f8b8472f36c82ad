//! View handling: delimiting and structural validation.
//!
//! A view is an ordered list of area identifiers, read up to its first
//! terminator or [`VIEW_MAX_SIZE`] entries. Liveness of the entries is the
//! engine's concern; this module only handles shape.

use std::collections::HashSet;

use ufs_defs::{Id, Result, Status, VIEW_MAX_SIZE, VIEW_TERMINATOR};

/// The effective prefix of a raw view: everything before the first
/// terminator, capped at [`VIEW_MAX_SIZE`] entries.
pub fn effective(raw: &[Id]) -> &[Id] {
    let end = raw
        .iter()
        .position(|&entry| entry == VIEW_TERMINATOR)
        .unwrap_or(raw.len());
    &raw[..end.min(VIEW_MAX_SIZE)]
}

/// Reject views that mention the same area twice.
pub fn check_duplicates(entries: &[Id]) -> Result<()> {
    let mut seen = HashSet::with_capacity(entries.len());
    for &entry in entries {
        if !seen.insert(entry) {
            return Err(Status::ViewContainsDuplicates);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_stops_at_terminator() {
        let raw = [3, 1, VIEW_TERMINATOR, 2];
        assert_eq!(effective(&raw), &[3, 1]);
    }

    #[test]
    fn test_effective_without_terminator() {
        let raw = [3, 1, 2];
        assert_eq!(effective(&raw), &[3, 1, 2]);
    }

    #[test]
    fn test_effective_caps_at_max_size() {
        let raw = vec![7; VIEW_MAX_SIZE + 10];
        assert_eq!(effective(&raw).len(), VIEW_MAX_SIZE);
    }

    #[test]
    fn test_empty_view() {
        assert_eq!(effective(&[VIEW_TERMINATOR]), &[] as &[Id]);
        assert_eq!(effective(&[]), &[] as &[Id]);
    }

    #[test]
    fn test_duplicates_rejected() {
        assert_eq!(
            check_duplicates(&[1, 2, 1]).unwrap_err(),
            Status::ViewContainsDuplicates
        );
        assert!(check_duplicates(&[1, 2, 3]).is_ok());
        assert!(check_duplicates(&[0, 1]).is_ok());
    }
}
