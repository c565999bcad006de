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

//! # Keel Registry
//!
//! Registers the autoscaling API group. One resource is exposed under two
//! schema versions, and every version is served by the same storage instance,
//! which is constructed at most once per registration run.

#![warn(missing_docs)]

pub mod initializer;
pub mod provider;
pub mod version;

pub use initializer::{InitPhase, InitializationState, SharedStorageInitializer};
pub use provider::{AutoscalingStorageProvider, NewRestFn, StorageConstructor, VERSION_PRIORITY};
pub use version::assemble_version;
