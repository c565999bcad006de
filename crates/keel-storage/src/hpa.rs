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

//! Storage for the horizontal pod autoscaler resource and its status
//! subresource.

use crate::memory::MemoryStore;
use crossbeam_channel::Receiver;
use keel_core::api::{GROUP_NAME, HORIZONTAL_POD_AUTOSCALERS};
use keel_core::{
    ApiObject, GroupResource, HandlerPair, ObjectKey, RestOptionsGetter, Storage, StorageError,
    StorageResult, WatchEvent,
};
use std::sync::Arc;

const KIND: &str = "HorizontalPodAutoscaler";

/// Builds the primary and status handlers of the autoscaler resource.
///
/// Both handlers share one [`MemoryStore`]. Fails if the options getter
/// cannot resolve options for the resource or returns an empty prefix.
pub fn new_rest(options: &dyn RestOptionsGetter) -> StorageResult<HandlerPair> {
    let resource = GroupResource::new(GROUP_NAME, HORIZONTAL_POD_AUTOSCALERS);
    let options = options.rest_options(&resource)?;
    if options.resource_prefix.trim_matches('/').is_empty() {
        return Err(StorageError::InvalidOptions(format!(
            "empty resource prefix for {resource}"
        )));
    }

    let path = options.resource_path(&resource);
    log::debug!("Creating {KIND} storage at {path}");
    let store = Arc::new(MemoryStore::new(KIND, path, options.watch_buffer_size));

    Ok(HandlerPair::new(
        Arc::new(HpaRest {
            store: Arc::clone(&store),
        }),
        Arc::new(HpaStatusRest { store }),
    ))
}

/// Full CRUD and watch access to autoscalers.
///
/// Status is owned by the status subresource: it is cleared on create and
/// carried over unchanged on update.
#[derive(Debug)]
pub struct HpaRest {
    store: Arc<MemoryStore>,
}

impl HpaRest {
    /// The store shared with the status handler.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl Storage for HpaRest {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn get(&self, key: &ObjectKey) -> StorageResult<ApiObject> {
        self.store.get(key)
    }

    fn list(&self, namespace: Option<&str>) -> StorageResult<Vec<ApiObject>> {
        self.store.list(namespace)
    }

    fn create(&self, mut object: ApiObject) -> StorageResult<ApiObject> {
        object.status = serde_json::Value::Null;
        self.store.create(object)
    }

    fn update(&self, object: ApiObject) -> StorageResult<ApiObject> {
        self.store.update(object, |stored, mut incoming| {
            incoming.status = stored.status.clone();
            incoming
        })
    }

    fn delete(&self, key: &ObjectKey) -> StorageResult<ApiObject> {
        self.store.delete(key)
    }

    fn watch(&self) -> StorageResult<Receiver<WatchEvent>> {
        self.store.watch()
    }
}

/// The `status` subresource: reads objects and writes only their status.
#[derive(Debug)]
pub struct HpaStatusRest {
    store: Arc<MemoryStore>,
}

impl HpaStatusRest {
    /// The store shared with the primary handler.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }
}

impl Storage for HpaStatusRest {
    fn as_any(&self) -> &dyn std::any::Any {
        self
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn get(&self, key: &ObjectKey) -> StorageResult<ApiObject> {
        self.store.get(key)
    }

    fn update(&self, object: ApiObject) -> StorageResult<ApiObject> {
        self.store.update(object, |stored, incoming| ApiObject {
            status: incoming.status,
            ..stored.clone()
        })
    }
}
