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

//! Decides which group/version/resource tuples are served.

use crate::api::{GroupVersion, GroupVersionResource, GROUP_NAME, V1, V2};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use thiserror::Error;

/// Answers whether a resource is turned on for a given group and version.
///
/// Implementations must be pure queries: the answer for a tuple does not
/// change during one registration run.
pub trait ResourceGate: Send + Sync {
    /// Returns `true` if `resource` should be served.
    fn resource_enabled(&self, resource: &GroupVersionResource) -> bool;
}

impl<F> ResourceGate for F
where
    F: Fn(&GroupVersionResource) -> bool + Send + Sync,
{
    fn resource_enabled(&self, resource: &GroupVersionResource) -> bool {
        self(resource)
    }
}

/// Errors raised while loading or saving a [`ResourceConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read or written.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The configuration is not valid JSON for this schema.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Declarative resource enablement.
///
/// A resource is enabled when an explicit per-resource override says so;
/// without an override it follows the enablement of its group-version.
/// Group-versions that were never enabled are disabled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceConfig {
    /// Group-versions whose resources are served by default.
    #[serde(default)]
    pub enabled_versions: BTreeSet<GroupVersion>,
    /// Per-resource overrides, taking precedence over the version setting.
    #[serde(default, with = "overrides")]
    pub resource_overrides: BTreeMap<GroupVersionResource, bool>,
}

impl ResourceConfig {
    /// Creates a configuration with everything disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables both versions of the autoscaling group.
    pub fn default_autoscaling() -> Self {
        Self::new()
            .enable_version(GroupVersion::new(GROUP_NAME, V2))
            .enable_version(GroupVersion::new(GROUP_NAME, V1))
    }

    /// Enables every resource of a group-version that has no override.
    pub fn enable_version(mut self, group_version: GroupVersion) -> Self {
        self.enabled_versions.insert(group_version);
        self
    }

    /// Disables every resource of a group-version that has no override.
    pub fn disable_version(mut self, group_version: &GroupVersion) -> Self {
        self.enabled_versions.remove(group_version);
        self
    }

    /// Forces a single resource on, regardless of its version.
    pub fn enable_resource(mut self, resource: GroupVersionResource) -> Self {
        self.resource_overrides.insert(resource, true);
        self
    }

    /// Forces a single resource off, regardless of its version.
    pub fn disable_resource(mut self, resource: GroupVersionResource) -> Self {
        self.resource_overrides.insert(resource, false);
        self
    }

    /// Returns `true` if the group-version is enabled as a whole.
    pub fn version_enabled(&self, group_version: &GroupVersion) -> bool {
        self.enabled_versions.contains(group_version)
    }

    /// Load configuration from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load configuration from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading resource config from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Save configuration to JSON file
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

impl ResourceGate for ResourceConfig {
    fn resource_enabled(&self, resource: &GroupVersionResource) -> bool {
        match self.resource_overrides.get(resource) {
            Some(&enabled) => enabled,
            None => self.version_enabled(&resource.group_version()),
        }
    }
}

// JSON object keys must be strings, so overrides are stored as a list of
// `{ group, version, resource, enabled }` entries.
mod overrides {
    use crate::api::GroupVersionResource;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    #[derive(Serialize, Deserialize)]
    struct Entry {
        #[serde(flatten)]
        resource: GroupVersionResource,
        enabled: bool,
    }

    pub fn serialize<S: Serializer>(
        map: &BTreeMap<GroupVersionResource, bool>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        let entries: Vec<Entry> = map
            .iter()
            .map(|(resource, &enabled)| Entry {
                resource: resource.clone(),
                enabled,
            })
            .collect();
        entries.serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<BTreeMap<GroupVersionResource, bool>, D::Error> {
        let entries = Vec::<Entry>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|entry| (entry.resource, entry.enabled))
            .collect())
    }
}
