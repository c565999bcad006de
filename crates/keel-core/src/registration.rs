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

//! Per-version resource maps and the group-wide registration handed to the
//! server bootstrap.

use crate::gate::ResourceGate;
use crate::options::RestOptionsGetter;
use crate::storage::{Handler, StorageResult};
use std::collections::HashMap;

/// Maps a resource name (including `"<name>/status"` subresource keys) to the
/// handler serving it within one version.
///
/// An empty map means the group serves nothing in that version.
pub type VersionResourceMap = HashMap<String, Handler>;

/// All versions an API group serves, with the storage for each resource.
///
/// Versions are kept in priority order (highest first). Empty version maps
/// are never recorded.
#[derive(Debug, Clone)]
pub struct GroupRegistration {
    group: String,
    versioned_resources: HashMap<String, VersionResourceMap>,
    prioritized_versions: Vec<String>,
}

impl GroupRegistration {
    /// Creates an empty registration for `group`.
    #[must_use]
    pub fn new(group: impl Into<String>) -> Self {
        Self {
            group: group.into(),
            versioned_resources: HashMap::new(),
            prioritized_versions: Vec::new(),
        }
    }

    /// Records the resource map of a version.
    ///
    /// Empty maps are ignored. Versions inserted earlier have higher priority;
    /// re-inserting a version replaces its map and keeps its priority.
    pub fn insert_version(&mut self, version: impl Into<String>, resources: VersionResourceMap) {
        if resources.is_empty() {
            return;
        }
        let version = version.into();
        if !self.versioned_resources.contains_key(&version) {
            self.prioritized_versions.push(version.clone());
        }
        self.versioned_resources.insert(version, resources);
    }

    /// Returns the API group this registration belongs to.
    pub fn group(&self) -> &str {
        &self.group
    }

    /// Returns the resource map of `version`, if the group serves it.
    #[must_use]
    pub fn version(&self, version: &str) -> Option<&VersionResourceMap> {
        self.versioned_resources.get(version)
    }

    /// Returns the served versions, highest priority first.
    pub fn versions(&self) -> &[String] {
        &self.prioritized_versions
    }

    /// Returns the number of served versions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.versioned_resources.len()
    }

    /// Returns `true` if no version is served.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.versioned_resources.is_empty()
    }

    /// Consumes the registration, returning the version to resource map.
    pub fn into_versioned_resources(self) -> HashMap<String, VersionResourceMap> {
        self.versioned_resources
    }
}

/// Builds the registration of one API group.
///
/// The upstream aggregator collects one provider per group and merges their
/// registrations.
pub trait RestStorageProvider {
    /// Constant name of the group this provider registers.
    fn group_name(&self) -> &'static str;

    /// Assembles the group's registration.
    ///
    /// Any storage construction failure aborts the whole group and is returned
    /// unchanged.
    fn new_rest_storage(
        &self,
        gate: &dyn ResourceGate,
        options: &dyn RestOptionsGetter,
    ) -> StorageResult<GroupRegistration>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{ApiObject, ObjectKey};
    use crate::storage::{Storage, StorageError};
    use std::sync::Arc;

    #[derive(Debug)]
    struct FakeHandler;

    impl Storage for FakeHandler {
        fn as_any(&self) -> &dyn std::any::Any {
            self
        }

        fn kind(&self) -> &str {
            "Fake"
        }

        fn get(&self, key: &ObjectKey) -> StorageResult<ApiObject> {
            Err(StorageError::NotFound {
                kind: "Fake".to_string(),
                key: key.clone(),
            })
        }
    }

    fn map_with(name: &str) -> VersionResourceMap {
        let mut map = VersionResourceMap::new();
        map.insert(name.to_string(), Arc::new(FakeHandler) as Handler);
        map
    }

    #[test]
    fn test_empty_maps_are_not_recorded() {
        let mut registration = GroupRegistration::new("autoscaling");
        registration.insert_version("v1", VersionResourceMap::new());

        assert!(registration.is_empty());
        assert!(registration.version("v1").is_none());
        assert!(registration.versions().is_empty());
    }

    #[test]
    fn test_versions_keep_insertion_priority() {
        let mut registration = GroupRegistration::new("autoscaling");
        registration.insert_version("v2", map_with("a"));
        registration.insert_version("v1", map_with("a"));
        registration.insert_version("v2", map_with("b"));

        assert_eq!(registration.versions(), ["v2", "v1"]);
        assert_eq!(registration.len(), 2);
        assert!(registration.version("v2").unwrap().contains_key("b"));
        assert_eq!(registration.group(), "autoscaling");
    }

    #[test]
    fn test_into_versioned_resources() {
        let mut registration = GroupRegistration::new("autoscaling");
        registration.insert_version("v1", map_with("a"));

        let resources = registration.into_versioned_resources();
        assert_eq!(resources.len(), 1);
        assert!(resources["v1"].contains_key("a"));
    }
}
