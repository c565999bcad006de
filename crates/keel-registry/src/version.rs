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

//! Assembles the resource map of one version of the autoscaling group.

use crate::initializer::SharedStorageInitializer;
use keel_core::api::{status_key, HORIZONTAL_POD_AUTOSCALERS};
use keel_core::{GroupVersion, HandlerPair, ResourceGate, StorageResult, VersionResourceMap};

/// Builds the resource map served under `group_version`.
///
/// A resource the gate disables contributes nothing, and does not force
/// storage construction. An enabled resource is registered together with its
/// `status` subresource, both taken from the shared initializer. A
/// construction error is returned unchanged, with no partial map.
pub fn assemble_version<F>(
    group_version: &GroupVersion,
    gate: &dyn ResourceGate,
    initializer: &SharedStorageInitializer<F>,
) -> StorageResult<VersionResourceMap>
where
    F: FnOnce() -> StorageResult<HandlerPair>,
{
    let mut storage = VersionResourceMap::new();

    // horizontalpodautoscalers
    let resource = group_version.with_resource(HORIZONTAL_POD_AUTOSCALERS);
    if gate.resource_enabled(&resource) {
        let handlers = initializer.get_or_init()?;
        storage.insert(status_key(&resource.resource), handlers.status);
        storage.insert(resource.resource, handlers.primary);
    } else {
        log::debug!("{resource} is disabled, skipping");
    }

    Ok(storage)
}
