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

//! Registration of the autoscaling API group.

use crate::initializer::SharedStorageInitializer;
use crate::version::assemble_version;
use keel_core::api::{GROUP_NAME, V1, V2};
use keel_core::{
    GroupRegistration, GroupVersion, HandlerPair, ResourceGate, RestOptionsGetter,
    RestStorageProvider, StorageOptions, StorageResult,
};
use std::fmt;

/// Versions of the group, highest priority first.
///
/// The aggregator that merges groups relies on this order; a new version must
/// be given a priority there as well.
pub const VERSION_PRIORITY: [&str; 2] = [V2, V1];

/// Builds the handlers of the autoscaling resource from storage options.
pub trait StorageConstructor: Send + Sync {
    /// Constructs the primary and status handlers.
    fn construct(&self, options: &dyn RestOptionsGetter) -> StorageResult<HandlerPair>;
}

impl<F> StorageConstructor for F
where
    F: Fn(&dyn RestOptionsGetter) -> StorageResult<HandlerPair> + Send + Sync,
{
    fn construct(&self, options: &dyn RestOptionsGetter) -> StorageResult<HandlerPair> {
        self(options)
    }
}

/// Signature of the default constructor, [`keel_storage::new_rest`].
pub type NewRestFn = fn(&dyn RestOptionsGetter) -> StorageResult<HandlerPair>;

/// Assembles the registration of the autoscaling group.
///
/// Each call to [`build`](Self::build) or
/// [`new_rest_storage`](RestStorageProvider::new_rest_storage) is one
/// registration run: it creates a fresh [`SharedStorageInitializer`], so the
/// storage is constructed at most once per run and a failure in one run does
/// not leak into the next.
pub struct AutoscalingStorageProvider<C = NewRestFn> {
    constructor: C,
    options: StorageOptions,
}

impl AutoscalingStorageProvider {
    /// Creates a provider backed by the in-memory storage engine.
    pub fn in_memory() -> Self {
        Self::new(keel_storage::new_rest as NewRestFn)
    }
}

impl Default for AutoscalingStorageProvider {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl<C: StorageConstructor> AutoscalingStorageProvider<C> {
    /// Creates a provider that builds storage with `constructor`.
    pub fn new(constructor: C) -> Self {
        Self {
            constructor,
            options: StorageOptions::default(),
        }
    }

    /// Replaces the storage options used by [`build`](Self::build).
    pub fn with_options(mut self, options: StorageOptions) -> Self {
        self.options = options;
        self
    }

    /// The storage options used by [`build`](Self::build).
    pub fn options(&self) -> &StorageOptions {
        &self.options
    }

    /// Runs one registration with the provider's own storage options.
    pub fn build(&self, gate: &dyn ResourceGate) -> StorageResult<GroupRegistration> {
        self.new_rest_storage(gate, &self.options)
    }
}

impl<C: StorageConstructor> RestStorageProvider for AutoscalingStorageProvider<C> {
    fn group_name(&self) -> &'static str {
        GROUP_NAME
    }

    fn new_rest_storage(
        &self,
        gate: &dyn ResourceGate,
        options: &dyn RestOptionsGetter,
    ) -> StorageResult<GroupRegistration> {
        let mut registration = GroupRegistration::new(GROUP_NAME);
        let initializer = SharedStorageInitializer::new(|| self.constructor.construct(options));

        for version in VERSION_PRIORITY {
            let group_version = GroupVersion::new(GROUP_NAME, version);
            let storage = assemble_version(&group_version, gate, &initializer)?;
            log::debug!(
                "{group_version}: {} resource(s) enabled",
                storage.len()
            );
            registration.insert_version(version, storage);
        }

        if registration.is_empty() {
            log::info!("API group {GROUP_NAME} has no enabled versions");
        } else {
            log::info!(
                "Registered API group {GROUP_NAME} with versions [{}]",
                registration.versions().join(", ")
            );
        }
        Ok(registration)
    }
}

impl<C> fmt::Debug for AutoscalingStorageProvider<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AutoscalingStorageProvider")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::GroupVersionResource;

    #[test]
    fn test_group_name_is_constant() {
        let provider = AutoscalingStorageProvider::default();
        assert_eq!(provider.group_name(), "autoscaling");
    }

    #[test]
    fn test_v2_has_priority_over_v1() {
        assert_eq!(VERSION_PRIORITY, ["v2", "v1"]);
    }

    #[test]
    fn test_build_uses_provider_options() {
        let provider = AutoscalingStorageProvider::in_memory().with_options(StorageOptions {
            resource_prefix: "/custom".to_string(),
            ..Default::default()
        });
        let gate = |_: &GroupVersionResource| true;

        let registration = provider.build(&gate).unwrap();
        let handler = &registration.version("v2").unwrap()["horizontalpodautoscalers"];
        let rest = handler
            .as_any()
            .downcast_ref::<keel_storage::HpaRest>()
            .unwrap();

        assert_eq!(rest.store().path(), "/custom/horizontalpodautoscalers");
    }

    #[test]
    fn test_invalid_options_abort_the_build() {
        let provider = AutoscalingStorageProvider::in_memory().with_options(StorageOptions {
            resource_prefix: String::new(),
            ..Default::default()
        });
        let gate = |_: &GroupVersionResource| true;

        assert!(provider.build(&gate).is_err());
    }

    #[test]
    fn test_debug_lists_options() {
        let provider = AutoscalingStorageProvider::default();
        assert!(format!("{provider:?}").contains("resource_prefix"));
    }
}
