//! Position Ordering
//!
//! Deterministic, gap-tolerant ordering of sibling groups.
//!
//! # Sort Key
//!
//! Siblings sort by `position` ascending. Ties are broken by insertion order,
//! i.e. the item's index in the flat collection it came from: the sort is
//! stable and the collections preserve the order of the snapshot they were
//! loaded from. Ties should not survive compaction, but can appear briefly
//! when a server snapshot and optimistic state disagree.
//!
//! # Compaction
//!
//! Positions are only meaningful relative to each other. Before any reorder is
//! persisted the group is rewritten to the dense sequence `0..n-1` so later
//! inserts have unambiguous integer slots. When an item moves between groups,
//! both groups are recompacted independently.

use crate::models::PositionUpdate;
use std::collections::HashMap;

/// Stable-sort items by a position key (ties keep their input order)
pub fn sort_by_position<T, F>(items: &mut [T], position: F)
where
    F: Fn(&T) -> i64,
{
    items.sort_by_key(|item| position(item));
}

/// Assign dense `0..n-1` positions matching the given order
///
/// # Examples
///
/// ```
/// use notetree_core::ordering::compact;
///
/// let positions = compact(&["n2", "n1"]);
/// assert_eq!(positions["n2"], 0);
/// assert_eq!(positions["n1"], 1);
/// ```
pub fn compact<S: AsRef<str>>(ordered_ids: &[S]) -> HashMap<String, i64> {
    ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| (id.as_ref().to_string(), index as i64))
        .collect()
}

/// Same as [`compact`] but as the ordered batch sent to persistence
pub fn position_updates<S: AsRef<str>>(ordered_ids: &[S]) -> Vec<PositionUpdate> {
    ordered_ids
        .iter()
        .enumerate()
        .map(|(index, id)| PositionUpdate::new(id.as_ref(), index as i64))
        .collect()
}

/// Move the element at `from` so that it ends up at index `to`
///
/// Out-of-range `from` returns the input unchanged; `to` is clamped to the
/// last slot.
pub fn array_move<S: Clone>(ids: &[S], from: usize, to: usize) -> Vec<S> {
    let mut out = ids.to_vec();
    if from >= out.len() {
        return out;
    }
    let item = out.remove(from);
    let to = to.min(out.len());
    out.insert(to, item);
    out
}

/// Insert `id` at `index` (clamped; `None` appends)
pub fn insert_at(ids: &mut Vec<String>, id: String, index: Option<usize>) {
    let index = index.unwrap_or(ids.len()).min(ids.len());
    ids.insert(index, id);
}

/// Position that appends after every existing sibling (gap tolerant)
pub fn next_position<I: IntoIterator<Item = i64>>(positions: I) -> i64 {
    positions.into_iter().max().map(|max| max + 1).unwrap_or(0)
}

/// True when the positions form exactly `{0, 1, ..., n-1}`
pub fn is_dense<I: IntoIterator<Item = i64>>(positions: I) -> bool {
    let mut sorted: Vec<i64> = positions.into_iter().collect();
    sorted.sort_unstable();
    sorted.iter().enumerate().all(|(i, p)| *p == i as i64)
}
