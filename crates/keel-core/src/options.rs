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

//! Options handed to storage constructors.

use crate::api::GroupResource;
use crate::gate::ConfigError;
use crate::storage::StorageResult;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Settings a storage engine needs to back one resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    /// Key prefix under which objects of every resource are stored.
    pub resource_prefix: String,
    /// Capacity of each watcher's event buffer.
    /// Watchers that fall this far behind are dropped.
    pub watch_buffer_size: usize,
}

impl StorageOptions {
    /// Returns the storage path of a resource (e.g. "/registry/horizontalpodautoscalers").
    pub fn resource_path(&self, resource: &GroupResource) -> String {
        format!(
            "{}/{}",
            self.resource_prefix.trim_end_matches('/'),
            resource.resource
        )
    }

    /// Load options from JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Load options from JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        log::debug!("Loading storage options from {}", path.display());
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

impl Default for StorageOptions {
    fn default() -> Self {
        Self {
            resource_prefix: "/registry".to_string(),
            watch_buffer_size: 100,
        }
    }
}

/// Resolves [`StorageOptions`] for a resource.
pub trait RestOptionsGetter: Send + Sync {
    /// Returns the options for `resource`, or the reason they are unavailable.
    fn rest_options(&self, resource: &GroupResource) -> StorageResult<StorageOptions>;
}

impl RestOptionsGetter for StorageOptions {
    fn rest_options(&self, _resource: &GroupResource) -> StorageResult<StorageOptions> {
        Ok(self.clone())
    }
}
