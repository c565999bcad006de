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

//! Identifiers and object types shared by every API group.
//!
//! A resource is addressed by its group, version, and plural resource name.
//! The group is empty for the legacy "core" group, in which case display
//! forms drop it entirely.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display};

/// Name of the autoscaling API group.
pub const GROUP_NAME: &str = "autoscaling";

/// The `v1` schema version of the autoscaling group.
pub const V1: &str = "v1";

/// The `v2` schema version of the autoscaling group.
pub const V2: &str = "v2";

/// Plural resource name of the horizontal pod autoscaler.
pub const HORIZONTAL_POD_AUTOSCALERS: &str = "horizontalpodautoscalers";

/// Name of the status subresource.
pub const STATUS_SUBRESOURCE: &str = "status";

/// Returns the registration key of the status subresource of `resource`
/// (e.g. `"horizontalpodautoscalers/status"`).
pub fn status_key(resource: &str) -> String {
    format!("{resource}/{STATUS_SUBRESOURCE}")
}

/// An API group paired with one of its schema versions.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersion {
    /// The API group (empty for the core group).
    pub group: String,
    /// The schema version (e.g., "v1", "v2").
    pub version: String,
}

impl GroupVersion {
    /// Creates a new `GroupVersion`.
    pub fn new(group: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
        }
    }

    /// Qualifies a resource name with this group and version.
    pub fn with_resource(&self, resource: impl Into<String>) -> GroupVersionResource {
        GroupVersionResource {
            group: self.group.clone(),
            version: self.version.clone(),
            resource: resource.into(),
        }
    }
}

impl Display for GroupVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.version)
        } else {
            write!(f, "{}/{}", self.group, self.version)
        }
    }
}

/// A resource within a group, independent of the schema version.
///
/// Storage is keyed by group resource: every version of a group exposes the
/// same underlying objects.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupResource {
    /// The API group (empty for the core group).
    pub group: String,
    /// The plural resource name.
    pub resource: String,
}

impl GroupResource {
    /// Creates a new `GroupResource`.
    pub fn new(group: impl Into<String>, resource: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            resource: resource.into(),
        }
    }
}

impl Display for GroupResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)
        } else {
            write!(f, "{}.{}", self.resource, self.group)
        }
    }
}

/// Fully qualified resource identifier, used as the lookup key against a
/// [`ResourceGate`](crate::gate::ResourceGate).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GroupVersionResource {
    /// The API group (empty for the core group).
    pub group: String,
    /// The schema version.
    pub version: String,
    /// The plural resource name.
    pub resource: String,
}

impl GroupVersionResource {
    /// Creates a new `GroupVersionResource`.
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// Returns the group and version of this resource.
    pub fn group_version(&self) -> GroupVersion {
        GroupVersion::new(self.group.clone(), self.version.clone())
    }

    /// Returns the version-independent group resource.
    pub fn group_resource(&self) -> GroupResource {
        GroupResource::new(self.group.clone(), self.resource.clone())
    }
}

impl Display for GroupVersionResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}, Resource={}", self.group_version(), self.resource)
    }
}

/// Identifies a stored object within a resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectKey {
    /// The namespace the object lives in.
    pub namespace: String,
    /// The object name, unique within its namespace.
    pub name: String,
}

impl ObjectKey {
    /// Creates a new `ObjectKey`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// A stored API object.
///
/// The storage layer is schema-agnostic: `spec` and `status` are opaque JSON
/// documents. `resource_version` is assigned by the store on every write and
/// used for optimistic concurrency on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiObject {
    /// The namespace the object lives in.
    pub namespace: String,
    /// The object name.
    pub name: String,
    /// Store-assigned version of the object, `0` before the first write.
    #[serde(default)]
    pub resource_version: u64,
    /// Desired state.
    #[serde(default)]
    pub spec: serde_json::Value,
    /// Observed state, written through the status subresource.
    #[serde(default)]
    pub status: serde_json::Value,
}

impl ApiObject {
    /// Creates an object with the given spec and an empty status.
    pub fn new(
        namespace: impl Into<String>,
        name: impl Into<String>,
        spec: serde_json::Value,
    ) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            resource_version: 0,
            spec,
            status: serde_json::Value::Null,
        }
    }

    /// Returns the key this object is stored under.
    pub fn key(&self) -> ObjectKey {
        ObjectKey::new(self.namespace.clone(), self.name.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_key() {
        assert_eq!(
            status_key(HORIZONTAL_POD_AUTOSCALERS),
            "horizontalpodautoscalers/status"
        );
    }

    #[test]
    fn test_display_forms() {
        let gvr = GroupVersion::new(GROUP_NAME, V2).with_resource(HORIZONTAL_POD_AUTOSCALERS);
        assert_eq!(gvr.group_version().to_string(), "autoscaling/v2");
        assert_eq!(
            gvr.group_resource().to_string(),
            "horizontalpodautoscalers.autoscaling"
        );
        assert_eq!(
            gvr.to_string(),
            "autoscaling/v2, Resource=horizontalpodautoscalers"
        );
    }

    #[test]
    fn test_core_group_display_omits_group() {
        let gvr = GroupVersionResource::new("", "v1", "pods");
        assert_eq!(gvr.group_version().to_string(), "v1");
        assert_eq!(gvr.group_resource().to_string(), "pods");
    }

    #[test]
    fn test_object_deserializes_with_defaults() {
        let obj: ApiObject =
            serde_json::from_str(r#"{ "namespace": "default", "name": "web" }"#).unwrap();
        assert_eq!(obj.resource_version, 0);
        assert!(obj.spec.is_null());
        assert_eq!(obj.key(), ObjectKey::new("default", "web"));
    }
}
