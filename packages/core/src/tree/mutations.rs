//! Pure mutations over [`TreeModel`]
//!
//! Every method takes `&self` and returns a new model; the receiver is never
//! modified.

use super::TreeModel;
use crate::error::{Result, TreeError};
use crate::models::{
    Folder, ItemKind, ItemRef, Note, ParentTarget, PositionUpdate, SiblingGroup,
};
use crate::ordering;
use std::collections::{HashMap, HashSet};

impl TreeModel {
    /// Replace the item's parent pointer, leaving `position` untouched
    ///
    /// # Errors
    ///
    /// - Item doesn't exist
    /// - New parent folder doesn't exist
    /// - A folder would become its own ancestor
    pub fn apply_reparent(
        &self,
        item_id: &str,
        kind: ItemKind,
        new_parent_id: Option<&str>,
    ) -> Result<TreeModel> {
        let item = ItemRef {
            kind,
            id: item_id.to_string(),
        };
        self.check_move(&item, new_parent_id)?;

        let mut next = self.clone();
        let new_parent = new_parent_id.map(str::to_string);
        match kind {
            ItemKind::Folder => {
                if let Some(folder) = next.folders.iter_mut().find(|f| f.id == item_id) {
                    folder.parent_id = new_parent;
                }
            }
            ItemKind::Note => {
                if let Some(note) = next.notes.iter_mut().find(|n| n.id == item_id) {
                    note.folder_id = new_parent;
                }
            }
        }
        Ok(next)
    }

    /// Reassign dense `0..n-1` positions within one sibling group
    ///
    /// Ids that are not members of the group are ignored. Members missing from
    /// `ordered_ids` keep their current relative order after the listed ones,
    /// so the group always ends up dense. Parent pointers never change.
    pub fn apply_reorder<S: AsRef<str>>(
        &self,
        group: &SiblingGroup,
        ordered_ids: &[S],
    ) -> TreeModel {
        let members = self.group_ids(group);
        let member_set: HashSet<&str> = members.iter().map(String::as_str).collect();

        let mut order: Vec<String> = Vec::with_capacity(members.len());
        let mut seen: HashSet<&str> = HashSet::new();
        for id in ordered_ids {
            let id = id.as_ref();
            if member_set.contains(id) && seen.insert(id) {
                order.push(id.to_string());
            }
        }
        for id in &members {
            if !seen.contains(id.as_str()) {
                order.push(id.clone());
            }
        }

        let positions = ordering::compact(&order);
        let mut next = self.clone();
        next.assign_positions(group.kind, &positions);
        next
    }

    /// Reparent with insertion: remove from the old group, insert into the new
    /// group at `index` (append when `None` or out of range), recompact both.
    ///
    /// Returns the new model plus the batch of position updates covering every
    /// member of both groups; the moved item's entry carries its new parent.
    pub fn apply_move(
        &self,
        item: &ItemRef,
        new_parent_id: Option<&str>,
        index: Option<usize>,
    ) -> Result<(TreeModel, Vec<PositionUpdate>)> {
        self.check_move(item, new_parent_id)?;
        let old_group = self
            .sibling_group_of(item)
            .ok_or_else(|| TreeError::item_not_found(item.kind, item.id.clone()))?;
        let new_group = SiblingGroup::new(item.kind, new_parent_id.map(str::to_string));

        let mut old_ids = self.group_ids(&old_group);
        old_ids.retain(|id| id != &item.id);

        let mut new_ids = if old_group == new_group {
            old_ids.clone()
        } else {
            self.group_ids(&new_group)
        };
        ordering::insert_at(&mut new_ids, item.id.clone(), index);

        let mut next = self.apply_reparent(&item.id, item.kind, new_parent_id)?;
        let mut updates = Vec::with_capacity(old_ids.len() + new_ids.len());

        if old_group != new_group {
            let old_positions = ordering::compact(&old_ids);
            next.assign_positions(item.kind, &old_positions);
            updates.extend(ordering::position_updates(&old_ids));
        }

        let new_positions = ordering::compact(&new_ids);
        next.assign_positions(item.kind, &new_positions);
        updates.extend(ordering::position_updates(&new_ids).into_iter().map(|update| {
            if update.id == item.id && old_group != new_group {
                update.with_parent(ParentTarget::from_parent_id(new_parent_id))
            } else {
                update
            }
        }));

        Ok((next, updates))
    }

    /// Move the item to root, appending after the current root siblings
    ///
    /// No other positions change. Returns the new model and the assigned position.
    pub fn apply_append_to_root(&self, item: &ItemRef) -> Result<(TreeModel, i64)> {
        let root = SiblingGroup::root(item.kind);
        let position = ordering::next_position(
            self.group_ids(&root)
                .iter()
                .filter(|id| **id != item.id)
                .filter_map(|id| self.position_of(item.kind, id)),
        );

        let mut next = self.apply_reparent(&item.id, item.kind, None)?;
        next.assign_positions(item.kind, &HashMap::from([(item.id.clone(), position)]));
        Ok((next, position))
    }

    /// Create a folder appended to the end of its sibling group
    pub fn apply_create_folder(
        &self,
        name: &str,
        parent_id: Option<&str>,
    ) -> Result<(TreeModel, Folder)> {
        let name = validate_name(name)?;
        self.check_parent_exists(parent_id)?;
        let position = self.append_position(ItemKind::Folder, parent_id);
        let folder = Folder::with_generated_id(name, parent_id.map(str::to_string), position);

        let mut next = self.clone();
        next.folders.push(folder.clone());
        Ok((next, folder))
    }

    /// Create a note appended to the end of its sibling group
    pub fn apply_create_note(
        &self,
        title: &str,
        folder_id: Option<&str>,
    ) -> Result<(TreeModel, Note)> {
        let title = validate_name(title)?;
        self.check_parent_exists(folder_id)?;
        let position = self.append_position(ItemKind::Note, folder_id);
        let note = Note::with_generated_id(title, folder_id.map(str::to_string), position);

        let mut next = self.clone();
        next.notes.push(note.clone());
        Ok((next, note))
    }

    /// Rename a folder or retitle a note
    pub fn apply_rename(&self, item: &ItemRef, name: &str) -> Result<TreeModel> {
        let name = validate_name(name)?;
        let mut next = self.clone();
        match item.kind {
            ItemKind::Folder => {
                let folder = next
                    .folders
                    .iter_mut()
                    .find(|f| f.id == item.id)
                    .ok_or_else(|| TreeError::item_not_found(item.kind, item.id.clone()))?;
                folder.name = name;
            }
            ItemKind::Note => {
                let note = next
                    .notes
                    .iter_mut()
                    .find(|n| n.id == item.id)
                    .ok_or_else(|| TreeError::item_not_found(item.kind, item.id.clone()))?;
                note.title = name;
            }
        }
        Ok(next)
    }

    pub fn apply_set_public(&self, note_id: &str, is_public: bool) -> Result<TreeModel> {
        self.update_note(note_id, |note| note.is_public = is_public)
    }

    pub fn apply_set_favorite(&self, note_id: &str, is_favorite: bool) -> Result<TreeModel> {
        self.update_note(note_id, |note| note.is_favorite = is_favorite)
    }

    /// Remove an item. Deleting a folder removes every descendant folder and
    /// every note inside them, so the model stops referencing those ids at once.
    ///
    /// Returns the new model and the removed items.
    pub fn apply_delete(&self, item: &ItemRef) -> Result<(TreeModel, Vec<ItemRef>)> {
        if !self.contains(item) {
            return Err(TreeError::item_not_found(item.kind, item.id.clone()));
        }

        let mut next = self.clone();
        let mut removed = Vec::new();
        match item.kind {
            ItemKind::Note => {
                next.notes.retain(|n| n.id != item.id);
                removed.push(item.clone());
            }
            ItemKind::Folder => {
                let doomed = self.subtree_folder_ids(&item.id);
                next.folders.retain(|f| {
                    let gone = doomed.contains(&f.id);
                    if gone {
                        removed.push(ItemRef::folder(f.id.clone()));
                    }
                    !gone
                });
                next.notes.retain(|n| {
                    let gone = n
                        .folder_id
                        .as_ref()
                        .map(|id| doomed.contains(id))
                        .unwrap_or(false);
                    if gone {
                        removed.push(ItemRef::note(n.id.clone()));
                    }
                    !gone
                });
            }
        }
        Ok((next, removed))
    }

    /// Validate a parent change without applying it
    pub(crate) fn check_move(&self, item: &ItemRef, new_parent_id: Option<&str>) -> Result<()> {
        if !self.contains(item) {
            return Err(TreeError::item_not_found(item.kind, item.id.clone()));
        }
        self.check_parent_exists(new_parent_id)?;

        if let (ItemKind::Folder, Some(parent_id)) = (item.kind, new_parent_id) {
            if parent_id == item.id {
                return Err(TreeError::circular_reference(format!(
                    "Cannot move folder {} into itself",
                    item.id
                )));
            }
            if self.is_descendant_of(parent_id, &item.id) {
                return Err(TreeError::circular_reference(format!(
                    "Cannot move folder {} under its descendant {}",
                    item.id, parent_id
                )));
            }
        }
        Ok(())
    }

    fn check_parent_exists(&self, parent_id: Option<&str>) -> Result<()> {
        match parent_id {
            Some(id) if self.folder(id).is_none() => Err(TreeError::invalid_parent(id)),
            _ => Ok(()),
        }
    }

    fn append_position(&self, kind: ItemKind, parent_id: Option<&str>) -> i64 {
        let group = SiblingGroup::new(kind, parent_id.map(str::to_string));
        ordering::next_position(
            self.group_ids(&group)
                .iter()
                .filter_map(|id| self.position_of(kind, id)),
        )
    }

    fn position_of(&self, kind: ItemKind, id: &str) -> Option<i64> {
        match kind {
            ItemKind::Folder => self.folder(id).map(|f| f.position),
            ItemKind::Note => self.note(id).map(|n| n.position),
        }
    }

    fn assign_positions(&mut self, kind: ItemKind, positions: &HashMap<String, i64>) {
        match kind {
            ItemKind::Folder => {
                for folder in self.folders.iter_mut() {
                    if let Some(position) = positions.get(&folder.id) {
                        folder.position = *position;
                    }
                }
            }
            ItemKind::Note => {
                for note in self.notes.iter_mut() {
                    if let Some(position) = positions.get(&note.id) {
                        note.position = *position;
                    }
                }
            }
        }
    }

    fn update_note<F>(&self, note_id: &str, update: F) -> Result<TreeModel>
    where
        F: FnOnce(&mut Note),
    {
        let mut next = self.clone();
        let note = next
            .notes
            .iter_mut()
            .find(|n| n.id == note_id)
            .ok_or_else(|| TreeError::item_not_found(ItemKind::Note, note_id))?;
        update(note);
        Ok(next)
    }
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(TreeError::invalid_name("name cannot be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model() -> TreeModel {
        TreeModel::new(
            vec![
                Folder::new("a", "A", None, 0),
                Folder::new("b", "B", Some("a".into()), 0),
                Folder::new("c", "C", None, 1),
            ],
            vec![
                Note::new("n1", "One", Some("a".into()), 0),
                Note::new("n2", "Two", Some("a".into()), 1),
                Note::new("n3", "Three", Some("b".into()), 0),
                Note::new("r1", "Root", None, 4),
            ],
        )
    }

    #[test]
    fn test_apply_reparent_leaves_position_alone() {
        let tree = model();
        let next = tree.apply_reparent("n3", ItemKind::Note, Some("c")).unwrap();
        let note = next.note("n3").unwrap();
        assert_eq!(note.folder_id.as_deref(), Some("c"));
        assert_eq!(note.position, 0);
        // input untouched
        assert_eq!(tree.note("n3").unwrap().folder_id.as_deref(), Some("b"));
    }

    #[test]
    fn test_apply_reparent_rejects_cycle() {
        let tree = model();
        let err = tree.apply_reparent("a", ItemKind::Folder, Some("b")).unwrap_err();
        assert!(matches!(err, TreeError::CircularReference { .. }));

        let err = tree.apply_reparent("a", ItemKind::Folder, Some("a")).unwrap_err();
        assert!(matches!(err, TreeError::CircularReference { .. }));
    }

    #[test]
    fn test_apply_reparent_rejects_missing_parent_and_item() {
        let tree = model();
        assert_eq!(
            tree.apply_reparent("n1", ItemKind::Note, Some("nope")),
            Err(TreeError::invalid_parent("nope"))
        );
        assert_eq!(
            tree.apply_reparent("ghost", ItemKind::Note, None),
            Err(TreeError::item_not_found(ItemKind::Note, "ghost"))
        );
    }

    #[test]
    fn test_apply_move_recompacts_both_groups() {
        let tree = model();
        let item = ItemRef::note("n1");
        let (next, updates) = tree.apply_move(&item, Some("b"), Some(0)).unwrap();

        assert_eq!(next.group_ids(&SiblingGroup::new(ItemKind::Note, Some("a".into()))), vec!["n2"]);
        assert_eq!(next.note("n2").unwrap().position, 0);
        assert_eq!(
            next.group_ids(&SiblingGroup::new(ItemKind::Note, Some("b".into()))),
            vec!["n1", "n3"]
        );
        assert_eq!(next.note("n1").unwrap().position, 0);
        assert_eq!(next.note("n3").unwrap().position, 1);

        assert_eq!(
            updates,
            vec![
                PositionUpdate::new("n2", 0),
                PositionUpdate::new("n1", 0).with_parent(ParentTarget::Folder("b".into())),
                PositionUpdate::new("n3", 1),
            ]
        );
    }

    #[test]
    fn test_apply_move_appends_when_index_missing() {
        let tree = model();
        let (next, _) = tree.apply_move(&ItemRef::note("r1"), Some("a"), None).unwrap();
        assert_eq!(
            next.group_ids(&SiblingGroup::new(ItemKind::Note, Some("a".into()))),
            vec!["n1", "n2", "r1"]
        );
        assert_eq!(next.note("r1").unwrap().position, 2);
    }

    #[test]
    fn test_apply_append_to_root() {
        let tree = model();
        let (next, position) = tree.apply_append_to_root(&ItemRef::note("n2")).unwrap();
        assert_eq!(position, 5);
        let note = next.note("n2").unwrap();
        assert!(note.is_root());
        assert_eq!(note.position, 5);
        // old group is not recompacted
        assert_eq!(next.note("n1").unwrap().position, 0);
    }

    #[test]
    fn test_create_appends_to_group() {
        let tree = model();
        let (next, note) = tree.apply_create_note("  Fresh  ", Some("a")).unwrap();
        assert_eq!(note.title, "Fresh");
        assert_eq!(note.position, 2);
        assert!(next.note(&note.id).is_some());

        let (next, folder) = next.apply_create_folder("Sub", Some("a")).unwrap();
        assert_eq!(folder.position, 1);
        assert!(next.folder(&folder.id).is_some());

        assert!(matches!(
            tree.apply_create_note("   ", None),
            Err(TreeError::InvalidName(_))
        ));
        assert_eq!(
            tree.apply_create_folder("X", Some("missing")).unwrap_err(),
            TreeError::invalid_parent("missing")
        );
    }

    #[test]
    fn test_rename_and_flags() {
        let tree = model();
        let next = tree.apply_rename(&ItemRef::folder("a"), "Archive").unwrap();
        assert_eq!(next.folder("a").unwrap().name, "Archive");

        let next = next.apply_set_favorite("n1", true).unwrap();
        let next = next.apply_set_public("n1", true).unwrap();
        let note = next.note("n1").unwrap();
        assert!(note.is_favorite && note.is_public);

        assert!(tree.apply_set_public("missing", true).is_err());
        assert!(tree.apply_rename(&ItemRef::note("missing"), "x").is_err());
    }

    #[test]
    fn test_delete_folder_cascades() {
        let tree = model();
        let (next, removed) = tree.apply_delete(&ItemRef::folder("a")).unwrap();

        assert!(next.folder("a").is_none());
        assert!(next.folder("b").is_none());
        assert!(next.folder("c").is_some());
        assert!(next.note("n1").is_none());
        assert!(next.note("n3").is_none());
        assert!(next.note("r1").is_some());
        assert_eq!(removed.len(), 5);
        assert!(removed.contains(&ItemRef::note("n3")));
    }

    #[test]
    fn test_delete_note() {
        let tree = model();
        let (next, removed) = tree.apply_delete(&ItemRef::note("r1")).unwrap();
        assert!(next.note("r1").is_none());
        assert_eq!(removed, vec![ItemRef::note("r1")]);
        assert!(tree.apply_delete(&ItemRef::note("r1")).is_ok());
        assert!(next.apply_delete(&ItemRef::note("r1")).is_err());
    }
}
