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

//! Runs one registration of the autoscaling group and prints what it serves.
//!
//! Usage: `sandbox [resource-config.json] [storage-options.json]`.
//! Without a resource config both autoscaling versions are enabled.

use anyhow::{Context, Result};
use keel_core::{ResourceConfig, RestStorageProvider, StorageOptions};
use keel_registry::AutoscalingStorageProvider;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let gate = match args.next() {
        Some(path) => ResourceConfig::from_file(&path)
            .with_context(|| format!("failed to load resource config from {path}"))?,
        None => ResourceConfig::default_autoscaling(),
    };
    let options = match args.next() {
        Some(path) => StorageOptions::from_file(&path)
            .with_context(|| format!("failed to load storage options from {path}"))?,
        None => StorageOptions::default(),
    };

    let provider = AutoscalingStorageProvider::in_memory().with_options(options);
    let registration = provider
        .build(&gate)
        .with_context(|| format!("failed to register API group {}", provider.group_name()))?;

    log::info!("--- API group: {} ---", registration.group());
    if registration.is_empty() {
        log::info!("  No versions enabled.");
    }
    for version in registration.versions() {
        let Some(resources) = registration.version(version) else {
            continue;
        };
        let mut names: Vec<_> = resources.keys().collect();
        names.sort();
        for name in names {
            log::info!("  {version}/{name} -> {}", resources[name].kind());
        }
    }

    Ok(())
}
