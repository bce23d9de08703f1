//! # Storage Comparison
//!
//! This module computes a [`Changelist`] between a source store and a target
//! store: the list of items that would have to be created, updated, deleted
//! or renamed in the target to make it look like the source.
//!
//! ## Process
//!
//! 1.  **Listing**: Every readable item of both stores is loaded. Absent
//!     markers count as "not present".
//! 2.  **Set difference**: Names only in the source are creates, names only in
//!     the target are deletes.
//! 3.  **Update detection**: Names in both are updates when [`ConfigDiff::same`]
//!     reports a real difference.
//! 4.  **Rename detection**: A create and a delete carrying the same `uuid`
//!     are the same configuration entity under a new name and collapse into a
//!     single rename, recorded as `old::new`.
//! 5.  **Ordering**: Creates and updates are ordered so that the items listed
//!     under `dependencies.config` come before their dependents; deletes come
//!     in the reverse order.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::diff::ConfigDiff;
use crate::document::{self, Document};
use crate::error::Result;
use crate::store::ConfigStore;

/// Separator between the old and the new name of a rename entry.
pub const RENAME_SEPARATOR: &str = "::";

/// Kind of change recorded in a changelist
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    /// Item exists in the source only
    Create,
    /// Item exists in both stores with different content
    Update,
    /// Item exists in the target only
    Delete,
    /// Item exists in both stores under different names
    Rename,
}

impl ChangeKind {
    /// All change kinds.
    pub const ALL: [ChangeKind; 4] = [
        ChangeKind::Create,
        ChangeKind::Update,
        ChangeKind::Delete,
        ChangeKind::Rename,
    ];

    /// Machine name of the kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangeKind::Create => "create",
            ChangeKind::Update => "update",
            ChangeKind::Delete => "delete",
            ChangeKind::Rename => "rename",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build the changelist entry for a rename.
pub fn rename_key(old_name: &str, new_name: &str) -> String {
    format!("{}{}{}", old_name, RENAME_SEPARATOR, new_name)
}

/// Split a rename entry into its old and new names.
pub fn split_rename(entry: &str) -> Option<(&str, &str)> {
    entry.split_once(RENAME_SEPARATOR)
}

/// Configuration names grouped by change kind.
///
/// A name appears under at most one kind. Kinds without names are never
/// serialized.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Changelist {
    entries: BTreeMap<ChangeKind, Vec<String>>,
}

impl Changelist {
    /// Create an empty changelist
    pub fn new() -> Self {
        Self::default()
    }

    /// Names recorded under a kind, in order.
    pub fn get(&self, kind: ChangeKind) -> &[String] {
        self.entries.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Record a name under a kind, moving it out of any other kind.
    pub fn add(&mut self, kind: ChangeKind, name: &str) {
        if self.contains(kind, name) {
            return;
        }
        for other in ChangeKind::ALL {
            if other != kind {
                self.remove(other, name);
            }
        }
        self.entries
            .entry(kind)
            .or_default()
            .push(name.to_string());
    }

    /// Record several names under a kind.
    pub fn extend<I, S>(&mut self, kind: ChangeKind, names: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in names {
            self.add(kind, name.as_ref());
        }
    }

    /// Remove a name from a kind. Returns whether it was present.
    pub fn remove(&mut self, kind: ChangeKind, name: &str) -> bool {
        let Some(names) = self.entries.get_mut(&kind) else {
            return false;
        };
        let before = names.len();
        names.retain(|existing| existing != name);
        let removed = names.len() != before;
        self.drop_empty();
        removed
    }

    /// Keep only the names of a kind for which `keep` returns true.
    pub fn retain<F>(&mut self, kind: ChangeKind, mut keep: F)
    where
        F: FnMut(&str) -> bool,
    {
        if let Some(names) = self.entries.get_mut(&kind) {
            names.retain(|name| keep(name));
        }
        self.drop_empty();
    }

    /// Drop every kind not listed in `kinds`.
    pub fn restrict(&mut self, kinds: &[ChangeKind]) {
        self.entries.retain(|kind, _| kinds.contains(kind));
    }

    /// Whether a name is recorded under a kind.
    pub fn contains(&self, kind: ChangeKind, name: &str) -> bool {
        self.get(kind).iter().any(|existing| existing == name)
    }

    /// The kind a name is recorded under, if any.
    pub fn kind_of(&self, name: &str) -> Option<ChangeKind> {
        ChangeKind::ALL
            .into_iter()
            .find(|kind| self.contains(*kind, name))
    }

    /// Remove kinds that hold no names.
    pub fn drop_empty(&mut self) {
        self.entries.retain(|_, names| !names.is_empty());
    }

    /// Whether no change is recorded.
    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }

    /// Total number of recorded names.
    pub fn len(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }

    /// Non-empty kinds with their names, in kind order.
    pub fn kinds(&self) -> impl Iterator<Item = (ChangeKind, &[String])> {
        self.entries
            .iter()
            .filter(|(_, names)| !names.is_empty())
            .map(|(kind, names)| (*kind, names.as_slice()))
    }

    /// The subset of changes whose names match a glob pattern.
    ///
    /// Rename entries match when either side does.
    pub fn matching(&self, pattern: &str) -> Result<Changelist> {
        let pattern = glob::Pattern::new(pattern)?;
        let mut filtered = Changelist::new();
        for (kind, names) in self.kinds() {
            let names: Vec<String> = names
                .iter()
                .filter(|name| match split_rename(name) {
                    Some((old_name, new_name)) => {
                        pattern.matches(old_name) || pattern.matches(new_name)
                    }
                    None => pattern.matches(name),
                })
                .cloned()
                .collect();
            filtered.set_order(kind, names);
        }
        Ok(filtered)
    }

    /// Replace the names of a kind with a reordered list.
    fn set_order(&mut self, kind: ChangeKind, names: Vec<String>) {
        if names.is_empty() {
            self.entries.remove(&kind);
        } else {
            self.entries.insert(kind, names);
        }
    }
}

/// What to do when an item listed by a store cannot be read
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadFailurePolicy {
    /// Log the failure and leave the item out of the comparison
    #[default]
    Skip,
    /// Abort the comparison with the read error
    Fail,
}

/// Compares a source store against a target store
pub struct StorageComparer<'a> {
    source: &'a dyn ConfigStore,
    target: &'a dyn ConfigStore,
    differ: &'a ConfigDiff,
    read_failure: ReadFailurePolicy,
}

impl<'a> StorageComparer<'a> {
    /// Create a comparer using the default read-failure policy
    pub fn new(
        source: &'a dyn ConfigStore,
        target: &'a dyn ConfigStore,
        differ: &'a ConfigDiff,
    ) -> Self {
        Self {
            source,
            target,
            differ,
            read_failure: ReadFailurePolicy::default(),
        }
    }

    /// Set how unreadable items are handled
    pub fn with_read_failure_policy(mut self, policy: ReadFailurePolicy) -> Self {
        self.read_failure = policy;
        self
    }

    /// Compute the changes that would make the target match the source.
    pub fn create_changelist(&self) -> Result<Changelist> {
        let mut unreadable = BTreeSet::new();
        let source_docs = self.load(self.source, &mut unreadable)?;
        let target_docs = self.load(self.target, &mut unreadable)?;

        let mut creates = Vec::new();
        let mut updates = Vec::new();
        let mut deletes = Vec::new();

        for (name, source_doc) in &source_docs {
            if unreadable.contains(name) {
                continue;
            }
            match target_docs.get(name) {
                None => creates.push(name.clone()),
                Some(target_doc) => {
                    if !self.differ.same(source_doc, target_doc) {
                        updates.push(name.clone());
                    }
                }
            }
        }
        for name in target_docs.keys() {
            if !unreadable.contains(name) && !source_docs.contains_key(name) {
                deletes.push(name.clone());
            }
        }

        let renames = detect_renames(&mut creates, &mut deletes, &source_docs, &target_docs);

        let mut changelist = Changelist::new();
        changelist.set_order(ChangeKind::Create, dependency_order(creates, &source_docs));
        changelist.set_order(ChangeKind::Update, dependency_order(updates, &source_docs));
        let mut deletes = dependency_order(deletes, &target_docs);
        deletes.reverse();
        changelist.set_order(ChangeKind::Delete, deletes);
        changelist.set_order(ChangeKind::Rename, renames);

        debug!(
            "Compared {} -> {}: {} change(s)",
            self.source.name(),
            self.target.name(),
            changelist.len()
        );
        Ok(changelist)
    }

    /// Load every present item of a store.
    fn load(
        &self,
        store: &dyn ConfigStore,
        unreadable: &mut BTreeSet<String>,
    ) -> Result<BTreeMap<String, Document>> {
        let mut docs = BTreeMap::new();
        for name in store.list_all("")? {
            match store.read(&name) {
                Ok(Some(doc)) if !document::is_absent(&doc) => {
                    docs.insert(name, doc);
                }
                Ok(_) => {}
                Err(err) => match self.read_failure {
                    ReadFailurePolicy::Skip => {
                        warn!("Skipping unreadable item in {} storage: {}", store.name(), err);
                        unreadable.insert(name);
                    }
                    ReadFailurePolicy::Fail => return Err(err),
                },
            }
        }
        Ok(docs)
    }
}

/// Pair creates and deletes that share a `uuid` into renames.
fn detect_renames(
    creates: &mut Vec<String>,
    deletes: &mut Vec<String>,
    source_docs: &BTreeMap<String, Document>,
    target_docs: &BTreeMap<String, Document>,
) -> Vec<String> {
    let mut renames = Vec::new();
    let mut paired_creates = HashSet::new();
    let mut paired_deletes = HashSet::new();

    for new_name in creates.iter() {
        let Some(new_uuid) = source_docs.get(new_name).and_then(document::uuid) else {
            continue;
        };
        let old_name = deletes.iter().find(|old_name| {
            !paired_deletes.contains(*old_name)
                && target_docs.get(*old_name).and_then(document::uuid) == Some(new_uuid)
        });
        if let Some(old_name) = old_name {
            renames.push(rename_key(old_name, new_name));
            paired_deletes.insert(old_name.clone());
            paired_creates.insert(new_name.clone());
        }
    }

    creates.retain(|name| !paired_creates.contains(name));
    deletes.retain(|name| !paired_deletes.contains(name));
    renames
}

/// Order names so that each name's configuration dependencies within the list
/// come first. Names keep their sorted order otherwise; cycles are broken at
/// the first revisit.
fn dependency_order(mut names: Vec<String>, docs: &BTreeMap<String, Document>) -> Vec<String> {
    names.sort();
    let members: BTreeSet<&str> = names.iter().map(String::as_str).collect();
    let mut order = Vec::with_capacity(names.len());
    let mut visited = HashSet::new();

    for name in &names {
        visit(name, docs, &members, &mut visited, &mut order);
    }
    order
}

fn visit(
    name: &str,
    docs: &BTreeMap<String, Document>,
    members: &BTreeSet<&str>,
    visited: &mut HashSet<String>,
    order: &mut Vec<String>,
) {
    if !visited.insert(name.to_string()) {
        return;
    }

    if let Some(doc) = docs.get(name) {
        let mut dependencies = document::config_dependencies(doc);
        dependencies.sort();
        for dependency in dependencies {
            if members.contains(dependency.as_str()) {
                visit(&dependency, docs, members, visited, order);
            }
        }
    }

    order.push(name.to_string());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    fn doc(s: &str) -> Document {
        serde_yaml::from_str(s).unwrap()
    }

    fn compare(source: &MemoryStore, target: &MemoryStore) -> Changelist {
        let differ = ConfigDiff::default();
        StorageComparer::new(source, target, &differ)
            .create_changelist()
            .unwrap()
    }

    #[test]
    fn test_changelist_add_keeps_names_unique_across_kinds() {
        let mut changelist = Changelist::new();
        changelist.add(ChangeKind::Create, "a.b");
        changelist.add(ChangeKind::Create, "a.b");
        assert_eq!(changelist.get(ChangeKind::Create), ["a.b"]);

        changelist.add(ChangeKind::Update, "a.b");
        assert!(changelist.get(ChangeKind::Create).is_empty());
        assert_eq!(changelist.kind_of("a.b"), Some(ChangeKind::Update));
        assert_eq!(changelist.len(), 1);
    }

    #[test]
    fn test_changelist_retain_and_restrict() {
        let mut changelist = Changelist::new();
        changelist.extend(ChangeKind::Create, ["a.one", "a.two"]);
        changelist.extend(ChangeKind::Delete, ["b.one"]);

        changelist.retain(ChangeKind::Create, |name| name != "a.one");
        assert_eq!(changelist.get(ChangeKind::Create), ["a.two"]);

        changelist.restrict(&[ChangeKind::Create, ChangeKind::Update]);
        assert!(changelist.get(ChangeKind::Delete).is_empty());
        assert_eq!(changelist.len(), 1);

        changelist.retain(ChangeKind::Create, |_| false);
        assert!(changelist.is_empty());
        assert_eq!(changelist.kinds().count(), 0);
    }

    #[test]
    fn test_changelist_serializes_without_empty_kinds() {
        let mut changelist = Changelist::new();
        changelist.extend(ChangeKind::Update, ["system.site"]);
        changelist.extend(ChangeKind::Create, ["node.type.page"]);
        changelist.add(ChangeKind::Delete, "x.y");
        changelist.remove(ChangeKind::Delete, "x.y");

        let json = serde_json::to_string(&changelist).unwrap();
        assert_eq!(
            json,
            r#"{"create":["node.type.page"],"update":["system.site"]}"#
        );
    }

    #[test]
    fn test_changelist_matching_glob() {
        let mut changelist = Changelist::new();
        changelist.extend(ChangeKind::Create, ["node.type.page", "views.view.content"]);
        changelist.extend(ChangeKind::Update, ["node.settings"]);
        changelist.add(ChangeKind::Rename, "node.type.old::node.type.new");

        let filtered = changelist.matching("node.type.*").unwrap();
        assert_eq!(filtered.get(ChangeKind::Create), ["node.type.page"]);
        assert!(filtered.get(ChangeKind::Update).is_empty());
        assert_eq!(filtered.get(ChangeKind::Rename), ["node.type.old::node.type.new"]);

        assert!(changelist.matching("[").is_err());
    }

    #[test]
    fn test_rename_key_round_trip() {
        let key = rename_key("node.type.old", "node.type.new");
        assert_eq!(key, "node.type.old::node.type.new");
        assert_eq!(split_rename(&key), Some(("node.type.old", "node.type.new")));
        assert_eq!(split_rename("node.type.old"), None);
    }

    #[test]
    fn test_create_update_delete() {
        let source = MemoryStore::with_items(
            "source",
            vec![
                ("a.new", doc("{x: 1}")),
                ("a.changed", doc("{x: 2}")),
                ("a.same", doc("{x: 1}")),
            ],
        );
        let target = MemoryStore::with_items(
            "target",
            vec![
                ("a.changed", doc("{x: 1}")),
                ("a.same", doc("{uuid: abc, x: 1}")),
                ("a.gone", doc("{x: 1}")),
            ],
        );

        let changelist = compare(&source, &target);
        assert_eq!(changelist.get(ChangeKind::Create), ["a.new"]);
        assert_eq!(changelist.get(ChangeKind::Update), ["a.changed"]);
        assert_eq!(changelist.get(ChangeKind::Delete), ["a.gone"]);
        assert!(changelist.get(ChangeKind::Rename).is_empty());
    }

    #[test]
    fn test_absent_marker_counts_as_missing() {
        let source = MemoryStore::with_items(
            "snapshot",
            vec![("a.never", document::absent()), ("a.empty", doc("{}"))],
        );
        let target = MemoryStore::new("active");

        let changelist = compare(&source, &target);
        assert_eq!(changelist.get(ChangeKind::Create), ["a.empty"]);
        assert_eq!(changelist.len(), 1);
    }

    #[test]
    fn test_updates_ordered_by_dependencies() {
        let source = MemoryStore::with_items(
            "source",
            vec![
                (
                    "field.field.node.article.body",
                    doc("{v: 2, dependencies: {config: [field.storage.node.body, node.type.article]}}"),
                ),
                ("field.storage.node.body", doc("{v: 2}")),
                (
                    "core.entity_view_display.node.article.default",
                    doc("{v: 2, dependencies: {config: [field.field.node.article.body]}}"),
                ),
                ("node.type.article", doc("{v: 2}")),
            ],
        );
        let target = MemoryStore::new("target");

        let changelist = compare(&source, &target);
        let creates = changelist.get(ChangeKind::Create);
        let pos = |name: &str| creates.iter().position(|n| n == name).unwrap();

        assert_eq!(creates.len(), 4);
        assert!(pos("field.storage.node.body") < pos("field.field.node.article.body"));
        assert!(pos("node.type.article") < pos("field.field.node.article.body"));
        assert!(
            pos("field.field.node.article.body")
                < pos("core.entity_view_display.node.article.default")
        );
    }

    #[test]
    fn test_dependency_cycle_terminates() {
        let source = MemoryStore::with_items(
            "source",
            vec![
                ("a.one", doc("{dependencies: {config: [a.two]}}")),
                ("a.two", doc("{dependencies: {config: [a.one]}}")),
            ],
        );
        let changelist = compare(&source, &MemoryStore::new("target"));
        assert_eq!(changelist.get(ChangeKind::Create).len(), 2);
    }

    #[test]
    fn test_deletes_ordered_dependents_first() {
        let target = MemoryStore::with_items(
            "target",
            vec![
                ("a.base", doc("{}")),
                ("a.child", doc("{dependencies: {config: [a.base]}}")),
            ],
        );
        let changelist = compare(&MemoryStore::new("source"), &target);
        assert_eq!(changelist.get(ChangeKind::Delete), ["a.child", "a.base"]);
    }

    #[test]
    fn test_rename_detected_by_uuid() {
        let source = MemoryStore::with_items(
            "source",
            vec![("node.type.story", doc("{uuid: u-1, name: Story}"))],
        );
        let target = MemoryStore::with_items(
            "target",
            vec![
                ("node.type.article", doc("{uuid: u-1, name: Article}")),
                ("node.type.page", doc("{uuid: u-2, name: Page}")),
            ],
        );

        let changelist = compare(&source, &target);
        assert_eq!(
            changelist.get(ChangeKind::Rename),
            ["node.type.article::node.type.story"]
        );
        assert!(changelist.get(ChangeKind::Create).is_empty());
        assert_eq!(changelist.get(ChangeKind::Delete), ["node.type.page"]);
    }

    struct FlakyStore {
        inner: MemoryStore,
        broken: String,
    }

    impl ConfigStore for FlakyStore {
        fn name(&self) -> &str {
            "flaky"
        }

        fn read(&self, name: &str) -> Result<Option<Document>> {
            if name == self.broken {
                return Err(crate::error::Error::StoreRead {
                    store: "flaky".to_string(),
                    name: name.to_string(),
                    message: "corrupt".to_string(),
                });
            }
            self.inner.read(name)
        }

        fn write(&self, name: &str, doc: &Document) -> Result<()> {
            self.inner.write(name, doc)
        }

        fn delete(&self, name: &str) -> Result<()> {
            self.inner.delete(name)
        }

        fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
            self.inner.list_all(prefix)
        }
    }

    fn flaky_source() -> FlakyStore {
        FlakyStore {
            inner: MemoryStore::with_items(
                "source",
                vec![("a.broken", doc("{x: 1}")), ("a.fine", doc("{x: 1}"))],
            ),
            broken: "a.broken".to_string(),
        }
    }

    #[test]
    fn test_unreadable_items_are_skipped() {
        let source = flaky_source();
        let target = MemoryStore::with_items("target", vec![("a.broken", doc("{x: 2}"))]);
        let differ = ConfigDiff::default();

        let changelist = StorageComparer::new(&source, &target, &differ)
            .create_changelist()
            .unwrap();
        assert_eq!(changelist.get(ChangeKind::Create), ["a.fine"]);
        assert!(changelist.kind_of("a.broken").is_none());
    }

    #[test]
    fn test_unreadable_items_fail_when_configured() {
        let source = flaky_source();
        let target = MemoryStore::new("target");
        let differ = ConfigDiff::default();

        let result = StorageComparer::new(&source, &target, &differ)
            .with_read_failure_policy(ReadFailurePolicy::Fail)
            .create_changelist();
        assert!(result.is_err());
    }
}
