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

//! The opaque storage handler capability served for each registered resource.
//!
//! Registration code only moves [`Handler`] references around; the CRUD and
//! watch surface is consumed by the request-serving layer and implemented by a
//! storage engine.

use crate::api::{ApiObject, ObjectKey};
use crossbeam_channel::Receiver;
use std::fmt::Debug;
use std::sync::Arc;
use thiserror::Error;

/// Errors produced by storage handlers and storage construction.
///
/// The type is `Clone` so that a single construction failure can be handed,
/// unchanged, to every caller that observes it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// The requested object does not exist.
    #[error("{kind} \"{key}\" not found")]
    NotFound {
        /// Kind of the handler that was queried.
        kind: String,
        /// Key of the missing object.
        key: ObjectKey,
    },
    /// An object with the same key already exists.
    #[error("{kind} \"{key}\" already exists")]
    AlreadyExists {
        /// Kind of the handler that was written to.
        kind: String,
        /// Key of the conflicting object.
        key: ObjectKey,
    },
    /// The update was based on a stale resource version.
    #[error("conflict updating {key}: expected resource version {expected}, found {found}")]
    Conflict {
        /// Key of the object being updated.
        key: ObjectKey,
        /// Resource version supplied by the caller.
        expected: u64,
        /// Resource version currently stored.
        found: u64,
    },
    /// The handler does not serve this verb.
    #[error("method {verb} is not supported by {kind}")]
    MethodNotSupported {
        /// Kind of the handler.
        kind: String,
        /// The rejected verb (e.g. "create", "watch").
        verb: String,
    },
    /// The storage options supplied at construction time are unusable.
    #[error("invalid storage options: {0}")]
    InvalidOptions(String),
    /// The backing store failed.
    #[error("storage backend error: {0}")]
    Backend(String),
    /// The storage constructor panicked before producing an outcome.
    #[error("storage construction panicked: {0}")]
    ConstructionPanicked(String),
}

/// A specialized `Result` type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// A change notification delivered to watchers.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchEvent {
    /// An object was created.
    Added(ApiObject),
    /// An object was updated.
    Modified(ApiObject),
    /// An object was deleted. Carries the last stored state.
    Deleted(ApiObject),
}

impl WatchEvent {
    /// Returns the object carried by this event.
    pub fn object(&self) -> &ApiObject {
        match self {
            WatchEvent::Added(obj) | WatchEvent::Modified(obj) | WatchEvent::Deleted(obj) => obj,
        }
    }
}

/// The resource-serving capability set of a storage handler.
///
/// Every verb except `get` has a default body rejecting it with
/// [`StorageError::MethodNotSupported`], so subresource handlers only
/// implement the verbs they serve.
pub trait Storage: Send + Sync + Debug + 'static {
    /// Get a reference to this object as Any for downcasting
    fn as_any(&self) -> &dyn std::any::Any;

    /// Human-readable kind served by this handler (e.g. "HorizontalPodAutoscaler").
    fn kind(&self) -> &str;

    /// Retrieve an object by key.
    fn get(&self, key: &ObjectKey) -> StorageResult<ApiObject>;

    /// List objects, optionally restricted to one namespace.
    fn list(&self, _namespace: Option<&str>) -> StorageResult<Vec<ApiObject>> {
        Err(self.unsupported("list"))
    }

    /// Store a new object.
    fn create(&self, _object: ApiObject) -> StorageResult<ApiObject> {
        Err(self.unsupported("create"))
    }

    /// Replace an existing object.
    fn update(&self, _object: ApiObject) -> StorageResult<ApiObject> {
        Err(self.unsupported("update"))
    }

    /// Remove an object, returning its last stored state.
    fn delete(&self, _key: &ObjectKey) -> StorageResult<ApiObject> {
        Err(self.unsupported("delete"))
    }

    /// Subscribe to changes.
    fn watch(&self) -> StorageResult<Receiver<WatchEvent>> {
        Err(self.unsupported("watch"))
    }

    /// Builds the error returned for a verb this handler does not serve.
    fn unsupported(&self, verb: &str) -> StorageError {
        StorageError::MethodNotSupported {
            kind: self.kind().to_string(),
            verb: verb.to_string(),
        }
    }
}

/// A shared, read-only reference to a storage handler.
pub type Handler = Arc<dyn Storage>;

/// The handlers produced by one storage construction: the resource itself and
/// its status subresource, both backed by the same store.
#[derive(Debug, Clone)]
pub struct HandlerPair {
    /// Handler for the resource.
    pub primary: Handler,
    /// Handler for the `status` subresource.
    pub status: Handler,
}

impl HandlerPair {
    /// Creates a new pair.
    pub fn new(primary: Handler, status: Handler) -> Self {
        Self { primary, status }
    }

    /// Returns `true` if both pairs reference the same handler instances.
    pub fn same_instances(&self, other: &HandlerPair) -> bool {
        Arc::ptr_eq(&self.primary, &other.primary) && Arc::ptr_eq(&self.status, &other.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Read-only handler for testing the default verbs
    #[derive(Debug)]
    struct ReadOnly;

    impl Storage for ReadOnly {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn kind(&self) -> &str {
            "ReadOnly"
        }

        fn get(&self, key: &ObjectKey) -> StorageResult<ApiObject> {
            Err(StorageError::NotFound {
                kind: self.kind().to_string(),
                key: key.clone(),
            })
        }
    }

    #[test]
    fn test_default_verbs_are_unsupported() {
        let handler = ReadOnly;
        let err = handler
            .create(ApiObject::new("default", "a", serde_json::Value::Null))
            .unwrap_err();
        assert_eq!(
            err,
            StorageError::MethodNotSupported {
                kind: "ReadOnly".to_string(),
                verb: "create".to_string(),
            }
        );
        assert!(handler.watch().is_err());
        assert_eq!(
            err.to_string(),
            "method create is not supported by ReadOnly"
        );
    }

    #[test]
    fn test_pair_identity() {
        let primary: Handler = Arc::new(ReadOnly);
        let status: Handler = Arc::new(ReadOnly);
        let pair = HandlerPair::new(primary.clone(), status.clone());

        assert!(pair.same_instances(&pair.clone()));
        assert!(!pair.same_instances(&HandlerPair::new(status, primary)));
    }

    #[test]
    fn test_downcast_through_handler() {
        let handler: Handler = Arc::new(ReadOnly);
        assert!(handler.as_any().downcast_ref::<ReadOnly>().is_some());
    }
}
