// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Revisioned in-memory object store with bounded watch channels.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use keel_core::{ApiObject, ObjectKey, StorageError, StorageResult, WatchEvent};
use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

/// Objects plus the last assigned resource version, updated together.
#[derive(Debug, Default)]
struct Objects {
    by_key: HashMap<ObjectKey, ApiObject>,
    revision: u64,
}

/// Thread-safe in-memory object store using RwLock<HashMap>
///
/// Every write bumps a store-wide revision that becomes the written object's
/// `resource_version`, and is broadcast to all live watchers.
#[derive(Debug)]
pub struct MemoryStore {
    kind: String,
    path: String,
    objects: RwLock<Objects>,
    watchers: Mutex<Vec<Sender<WatchEvent>>>,
    watch_buffer_size: usize,
}

impl MemoryStore {
    /// Create a store for objects of `kind`, rooted at the storage `path`.
    pub fn new(kind: impl Into<String>, path: impl Into<String>, watch_buffer_size: usize) -> Self {
        Self {
            kind: kind.into(),
            path: path.into(),
            objects: RwLock::new(Objects::default()),
            watchers: Mutex::new(Vec::new()),
            watch_buffer_size: watch_buffer_size.max(1),
        }
    }

    /// The kind of object held by this store.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The storage path this store was created for.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of stored objects.
    pub fn len(&self) -> StorageResult<usize> {
        Ok(self.read()?.by_key.len())
    }

    /// Returns `true` if nothing is stored.
    pub fn is_empty(&self) -> StorageResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Fetch one object by key.
    pub fn get(&self, key: &ObjectKey) -> StorageResult<ApiObject> {
        let objects = self.read()?;
        objects
            .by_key
            .get(key)
            .cloned()
            .ok_or_else(|| self.not_found(key))
    }

    /// List objects sorted by key, optionally within one namespace.
    pub fn list(&self, namespace: Option<&str>) -> StorageResult<Vec<ApiObject>> {
        let objects = self.read()?;
        let mut listed: Vec<ApiObject> = objects
            .by_key
            .values()
            .filter(|obj| namespace.map_or(true, |ns| obj.namespace == ns))
            .cloned()
            .collect();
        listed.sort_by(|a, b| a.key().cmp(&b.key()));
        Ok(listed)
    }

    /// Insert a new object, stamping it with the next revision.
    pub fn create(&self, mut object: ApiObject) -> StorageResult<ApiObject> {
        let mut objects = self.write()?;
        let key = object.key();
        if objects.by_key.contains_key(&key) {
            return Err(StorageError::AlreadyExists {
                kind: self.kind.clone(),
                key,
            });
        }

        objects.revision += 1;
        object.resource_version = objects.revision;
        objects.by_key.insert(key, object.clone());
        self.notify(WatchEvent::Added(object.clone()));
        Ok(object)
    }

    /// Replace a stored object with `merge(stored, incoming)`.
    ///
    /// A non-zero `resource_version` on `incoming` must match the stored one.
    pub fn update<F>(&self, incoming: ApiObject, merge: F) -> StorageResult<ApiObject>
    where
        F: FnOnce(&ApiObject, ApiObject) -> ApiObject,
    {
        let mut objects = self.write()?;
        let key = incoming.key();
        let stored = objects
            .by_key
            .get(&key)
            .ok_or_else(|| self.not_found(&key))?;

        if incoming.resource_version != 0 && incoming.resource_version != stored.resource_version {
            return Err(StorageError::Conflict {
                key,
                expected: incoming.resource_version,
                found: stored.resource_version,
            });
        }

        let mut updated = merge(stored, incoming);
        objects.revision += 1;
        updated.resource_version = objects.revision;
        objects.by_key.insert(key, updated.clone());
        self.notify(WatchEvent::Modified(updated.clone()));
        Ok(updated)
    }

    /// Remove an object. The returned object carries the deletion revision.
    pub fn delete(&self, key: &ObjectKey) -> StorageResult<ApiObject> {
        let mut objects = self.write()?;
        let mut removed = objects
            .by_key
            .remove(key)
            .ok_or_else(|| self.not_found(key))?;
        objects.revision += 1;
        removed.resource_version = objects.revision;
        self.notify(WatchEvent::Deleted(removed.clone()));
        Ok(removed)
    }

    /// Subscribe to every subsequent write.
    pub fn watch(&self) -> StorageResult<Receiver<WatchEvent>> {
        let (tx, rx) = crossbeam_channel::bounded(self.watch_buffer_size);
        self.watchers
            .lock()
            .map_err(|_| StorageError::Backend("Failed to acquire watchers lock".to_string()))?
            .push(tx);
        Ok(rx)
    }

    // Called with the object lock held so events arrive in revision order.
    fn notify(&self, event: WatchEvent) {
        let Ok(mut watchers) = self.watchers.lock() else {
            log::warn!("{}: watchers lock poisoned, dropping event", self.kind);
            return;
        };
        watchers.retain(|tx| match tx.try_send(event.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                log::warn!("{}: dropping watcher that fell behind", self.kind);
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        });
    }

    fn not_found(&self, key: &ObjectKey) -> StorageError {
        StorageError::NotFound {
            kind: self.kind.clone(),
            key: key.clone(),
        }
    }

    fn read(&self) -> StorageResult<std::sync::RwLockReadGuard<'_, Objects>> {
        self.objects
            .read()
            .map_err(|_| StorageError::Backend("Failed to acquire read lock".to_string()))
    }

    fn write(&self) -> StorageResult<std::sync::RwLockWriteGuard<'_, Objects>> {
        self.objects
            .write()
            .map_err(|_| StorageError::Backend("Failed to acquire write lock".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> MemoryStore {
        MemoryStore::new("Widget", "/registry/widgets", 16)
    }

    #[test]
    fn test_create_assigns_increasing_versions() {
        let store = store();
        let a = store.create(ApiObject::new("default", "a", json!({}))).unwrap();
        let b = store.create(ApiObject::new("default", "b", json!({}))).unwrap();

        assert_eq!(a.resource_version, 1);
        assert_eq!(b.resource_version, 2);
        assert_eq!(store.len().unwrap(), 2);
    }

    #[test]
    fn test_create_duplicate_fails() {
        let store = store();
        store.create(ApiObject::new("default", "a", json!({}))).unwrap();
        let err = store
            .create(ApiObject::new("default", "a", json!({})))
            .unwrap_err();
        assert!(matches!(err, StorageError::AlreadyExists { .. }));
    }

    #[test]
    fn test_update_rejects_stale_version() {
        let store = store();
        let created = store.create(ApiObject::new("default", "a", json!({}))).unwrap();
        store
            .update(created.clone(), |_, incoming| incoming)
            .unwrap();

        let err = store.update(created, |_, incoming| incoming).unwrap_err();
        assert_eq!(
            err,
            StorageError::Conflict {
                key: ObjectKey::new("default", "a"),
                expected: 1,
                found: 2,
            }
        );
    }

    #[test]
    fn test_list_filters_namespace_and_sorts() {
        let store = store();
        store.create(ApiObject::new("prod", "b", json!({}))).unwrap();
        store.create(ApiObject::new("dev", "c", json!({}))).unwrap();
        store.create(ApiObject::new("prod", "a", json!({}))).unwrap();

        let names: Vec<_> = store
            .list(Some("prod"))
            .unwrap()
            .into_iter()
            .map(|o| o.name)
            .collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(store.list(None).unwrap().len(), 3);
    }

    #[test]
    fn test_delete_missing_is_not_found() {
        let store = store();
        let err = store.delete(&ObjectKey::new("default", "ghost")).unwrap_err();
        assert!(matches!(err, StorageError::NotFound { .. }));
    }

    #[test]
    fn test_watch_receives_events_in_order() {
        let store = store();
        let events = store.watch().unwrap();

        let created = store.create(ApiObject::new("default", "a", json!({}))).unwrap();
        store.update(created, |_, incoming| incoming).unwrap();
        store.delete(&ObjectKey::new("default", "a")).unwrap();

        let received: Vec<_> = events.try_iter().collect();
        assert_eq!(received.len(), 3);
        assert!(matches!(received[0], WatchEvent::Added(_)));
        assert!(matches!(received[1], WatchEvent::Modified(_)));
        assert!(matches!(received[2], WatchEvent::Deleted(_)));
        assert_eq!(received[1].object().resource_version, 2);
        assert_eq!(received[2].object().resource_version, 3);
    }

    #[test]
    fn test_delete_advances_revision() {
        let store = store();
        store.create(ApiObject::new("default", "a", json!({}))).unwrap();
        let removed = store.delete(&ObjectKey::new("default", "a")).unwrap();
        assert_eq!(removed.resource_version, 2);
        assert!(store.is_empty().unwrap());

        // Revisions stay monotonic across deletes.
        let next = store.create(ApiObject::new("default", "b", json!({}))).unwrap();
        assert_eq!(next.resource_version, 3);
    }

    #[test]
    fn test_slow_watcher_is_dropped() {
        let store = MemoryStore::new("Widget", "/registry/widgets", 1);
        let events = store.watch().unwrap();

        store.create(ApiObject::new("default", "a", json!({}))).unwrap();
        store.create(ApiObject::new("default", "b", json!({}))).unwrap();
        store.create(ApiObject::new("default", "c", json!({}))).unwrap();

        // The first event fit; the second overflowed and removed the watcher.
        assert_eq!(events.try_iter().count(), 1);
        assert!(events.recv().is_err());
    }
}
