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

//! # Keel Core
//!
//! Foundational crate containing the API identifiers, the opaque storage
//! handler capability, the resource gate, and the registration structures
//! that API groups hand to the server bootstrap.

#![warn(missing_docs)]

pub mod api;
pub mod gate;
pub mod options;
pub mod registration;
pub mod storage;

pub use api::{ApiObject, GroupResource, GroupVersion, GroupVersionResource, ObjectKey};
pub use gate::{ConfigError, ResourceConfig, ResourceGate};
pub use options::{RestOptionsGetter, StorageOptions};
pub use registration::{GroupRegistration, RestStorageProvider, VersionResourceMap};
pub use storage::{Handler, HandlerPair, Storage, StorageError, StorageResult, WatchEvent};
