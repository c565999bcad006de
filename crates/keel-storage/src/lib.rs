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

//! Storage engines for Keel resources.
//!
//! [`MemoryStore`] keeps objects in process memory; [`hpa::new_rest`] builds
//! the handlers of the horizontal pod autoscaler resource on top of it.

pub mod hpa;
pub mod memory;

pub use hpa::{new_rest, HpaRest, HpaStatusRest};
pub use memory::MemoryStore;
