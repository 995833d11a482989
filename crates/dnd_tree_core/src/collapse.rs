use std::collections::BTreeMap;

use crate::{CollapseStorage, Forest, NodeId, StorageError};

/// Storage key the collapse map is persisted under.
pub const COLLAPSE_STORAGE_KEY: &str = "collapsedState";

/// Node id to "collapsed" flag. `true` hides the node's descendants.
pub type CollapseState = BTreeMap<NodeId, bool>;

/// Per-node expand/collapse state, persisted on every change.
pub struct CollapseStore {
    state: CollapseState,
    storage: Box<dyn CollapseStorage>,
    key: String,
}

impl CollapseStore {
    /// Rehydrates from `storage`. Unreadable or malformed data yields an empty map.
    pub fn load(storage: impl CollapseStorage + 'static, key: impl Into<String>) -> Self {
        let key = key.into();
        let state = match read_state(&storage, &key) {
            Ok(state) => state,
            Err(err) => {
                tracing::warn!(%key, error = %err, "discarding stored collapse state");
                CollapseState::new()
            }
        };
        tracing::debug!(%key, count = state.len(), "collapse state loaded");

        Self {
            state,
            storage: Box::new(storage),
            key,
        }
    }

    #[inline]
    pub fn state(&self) -> &CollapseState {
        &self.state
    }

    #[inline]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Unknown ids count as collapsed.
    pub fn is_collapsed(&self, id: &NodeId) -> bool {
        self.state.get(id).copied().unwrap_or(true)
    }

    /// Flips the flag for `id` and returns the new value.
    pub fn toggle(&mut self, id: &NodeId) -> bool {
        let collapsed = !self.is_collapsed(id);
        self.state.insert(id.clone(), collapsed);
        self.persist();
        collapsed
    }

    /// Aligns the map with `forest`: new ids start collapsed, vanished ids are pruned and
    /// known ids keep their value. Returns whether anything changed.
    ///
    /// An empty forest means no data has arrived yet and leaves the map untouched.
    pub fn reconcile(&mut self, forest: &Forest) -> bool {
        if forest.is_empty() {
            return false;
        }

        let before = self.state.len();
        self.state.retain(|id, _| forest.contains(id));
        let pruned = before - self.state.len();

        let mut added = 0usize;
        for id in forest.ids() {
            if !self.state.contains_key(id) {
                self.state.insert(id.clone(), true);
                added += 1;
            }
        }

        let changed = pruned > 0 || added > 0;
        if changed {
            tracing::debug!(pruned, added, "collapse state reconciled");
            self.persist();
        }
        changed
    }

    fn persist(&mut self) {
        let result = serde_json::to_string(&self.state)
            .map_err(StorageError::from)
            .and_then(|value| self.storage.write(&self.key, &value));
        if let Err(err) = result {
            tracing::warn!(key = %self.key, error = %err, "failed to persist collapse state");
        }
    }
}

fn read_state(storage: &dyn CollapseStorage, key: &str) -> Result<CollapseState, StorageError> {
    match storage.read(key)? {
        Some(raw) => Ok(serde_json::from_str(&raw)?),
        None => Ok(CollapseState::new()),
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::*;
    use crate::{MemoryStorage, TreeItem};

    /// Shares the backing map with the test so writes can be inspected.
    #[derive(Clone, Default)]
    struct SharedStorage(Rc<RefCell<MemoryStorage>>);

    impl CollapseStorage for SharedStorage {
        fn read(&self, key: &str) -> Result<Option<String>, StorageError> {
            self.0.borrow().read(key)
        }

        fn write(&mut self, key: &str, value: &str) -> Result<(), StorageError> {
            self.0.borrow_mut().write(key, value)
        }
    }

    struct FailingStorage;

    impl CollapseStorage for FailingStorage {
        fn read(&self, _key: &str) -> Result<Option<String>, StorageError> {
            Err(std::io::Error::other("denied").into())
        }

        fn write(&mut self, _key: &str, _value: &str) -> Result<(), StorageError> {
            Err(std::io::Error::other("denied").into())
        }
    }

    fn id(s: &str) -> NodeId {
        NodeId::new(s)
    }

    fn forest() -> Forest {
        Forest::from_items([
            TreeItem::new("A", "A").child(TreeItem::new("B", "B")),
            TreeItem::new("C", "C"),
        ])
    }

    #[test]
    fn reconcile_adds_prunes_and_preserves() {
        let storage = MemoryStorage::new().with_value(
            COLLAPSE_STORAGE_KEY,
            r#"{"A":false,"gone":false}"#,
        );
        let mut store = CollapseStore::load(storage, COLLAPSE_STORAGE_KEY);
        assert!(!store.is_collapsed(&id("A")));

        assert!(store.reconcile(&forest()));
        assert!(!store.is_collapsed(&id("A")));
        assert!(store.is_collapsed(&id("B")));
        assert!(store.is_collapsed(&id("C")));
        assert!(!store.state().contains_key(&id("gone")));

        assert!(!store.reconcile(&forest()), "second pass is a no-op");
    }

    #[test]
    fn empty_forest_does_not_prune() {
        let storage = MemoryStorage::new().with_value(COLLAPSE_STORAGE_KEY, r#"{"A":false}"#);
        let mut store = CollapseStore::load(storage, COLLAPSE_STORAGE_KEY);

        assert!(!store.reconcile(&Forest::new()));
        assert_eq!(store.state().get(&id("A")), Some(&false));
    }

    #[test]
    fn every_change_is_persisted() {
        let shared = SharedStorage::default();
        let mut store = CollapseStore::load(shared.clone(), COLLAPSE_STORAGE_KEY);

        store.reconcile(&forest());
        assert_eq!(
            shared.0.borrow().get(COLLAPSE_STORAGE_KEY),
            Some(r#"{"A":true,"B":true,"C":true}"#)
        );

        assert!(!store.toggle(&id("A")));
        assert_eq!(
            shared.0.borrow().get(COLLAPSE_STORAGE_KEY),
            Some(r#"{"A":false,"B":true,"C":true}"#)
        );

        let reloaded = CollapseStore::load(shared, COLLAPSE_STORAGE_KEY);
        assert!(!reloaded.is_collapsed(&id("A")));
    }

    #[test]
    fn malformed_storage_falls_back_to_empty() {
        let storage = MemoryStorage::new().with_value(COLLAPSE_STORAGE_KEY, "not json");
        let store = CollapseStore::load(storage, COLLAPSE_STORAGE_KEY);
        assert!(store.state().is_empty());
        assert!(store.is_collapsed(&id("anything")));
    }

    #[test]
    fn storage_failures_are_not_fatal() {
        let mut store = CollapseStore::load(FailingStorage, COLLAPSE_STORAGE_KEY);
        store.reconcile(&forest());
        assert!(!store.toggle(&id("A")));
        assert!(!store.is_collapsed(&id("A")));
    }
}
