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

//! Lazily constructs the storage shared by every version of a group.
//!
//! The first call to [`SharedStorageInitializer::get_or_init`] runs the
//! constructor; callers arriving while it runs block until it finishes. The
//! outcome, success or failure, is cached for the lifetime of the initializer
//! and returned to every later caller without running the constructor again.
//! A failed construction is never retried: create a new initializer (i.e. a
//! new registration run) to try again.

use keel_core::{HandlerPair, StorageError, StorageResult};
use std::any::Any;
use std::fmt;
use std::mem;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};

/// Lifecycle of a [`SharedStorageInitializer`].
///
/// Moves `Uninitialized → InProgress → Done | Failed` exactly once.
/// `Done` and `Failed` are terminal.
pub enum InitializationState<F> {
    /// No caller has asked for the storage yet. Holds the constructor.
    Uninitialized(F),
    /// The constructor is running on some thread.
    InProgress,
    /// Construction succeeded.
    Done(HandlerPair),
    /// Construction failed.
    Failed(StorageError),
}

impl<F> InitializationState<F> {
    /// Returns the phase of this state, without its payload.
    pub fn phase(&self) -> InitPhase {
        match self {
            InitializationState::Uninitialized(_) => InitPhase::Uninitialized,
            InitializationState::InProgress => InitPhase::InProgress,
            InitializationState::Done(_) => InitPhase::Done,
            InitializationState::Failed(_) => InitPhase::Failed,
        }
    }
}

/// A payload-free snapshot of an [`InitializationState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitPhase {
    /// The constructor has not been invoked.
    Uninitialized,
    /// The constructor is running.
    InProgress,
    /// The handlers are available.
    Done,
    /// Construction failed; the error is sticky.
    Failed,
}

/// Constructs a [`HandlerPair`] at most once and caches the outcome.
pub struct SharedStorageInitializer<F> {
    state: Mutex<InitializationState<F>>,
    ready: Condvar,
}

impl<F> SharedStorageInitializer<F> {
    /// Returns the current phase.
    pub fn state(&self) -> InitPhase {
        self.lock().phase()
    }

    /// Returns `true` once the handlers have been constructed successfully.
    pub fn is_initialized(&self) -> bool {
        self.state() == InitPhase::Done
    }

    // The constructor runs outside the lock, so a poisoned state is still consistent.
    fn lock(&self) -> MutexGuard<'_, InitializationState<F>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<F> SharedStorageInitializer<F>
where
    F: FnOnce() -> StorageResult<HandlerPair>,
{
    /// Creates an initializer that will build the handlers with `constructor`.
    pub fn new(constructor: F) -> Self {
        Self {
            state: Mutex::new(InitializationState::Uninitialized(constructor)),
            ready: Condvar::new(),
        }
    }

    /// Returns the shared handlers, constructing them on first use.
    ///
    /// Every call on the same initializer observes the same outcome: clones
    /// of the same handler instances, or the same error.
    ///
    /// If the constructor panics, the initializer is left `Failed` with
    /// [`StorageError::ConstructionPanicked`], waiting callers are released
    /// with that error, and the panic is resumed on the constructing thread.
    pub fn get_or_init(&self) -> StorageResult<HandlerPair> {
        let mut state = self.lock();
        let constructor = loop {
            match &*state {
                InitializationState::Done(pair) => return Ok(pair.clone()),
                InitializationState::Failed(err) => return Err(err.clone()),
                InitializationState::InProgress => {
                    state = self
                        .ready
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
                InitializationState::Uninitialized(_) => {
                    if let InitializationState::Uninitialized(constructor) =
                        mem::replace(&mut *state, InitializationState::InProgress)
                    {
                        break constructor;
                    }
                }
            }
        };
        drop(state);

        log::debug!("Constructing shared storage");
        let result = panic::catch_unwind(AssertUnwindSafe(constructor));

        let mut state = self.lock();
        let outcome = match result {
            Ok(Ok(pair)) => {
                *state = InitializationState::Done(pair.clone());
                Ok(pair)
            }
            Ok(Err(err)) => {
                log::warn!("Shared storage construction failed: {err}");
                *state = InitializationState::Failed(err.clone());
                Err(err)
            }
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                log::error!("Shared storage construction panicked: {message}");
                *state = InitializationState::Failed(StorageError::ConstructionPanicked(message));
                drop(state);
                self.ready.notify_all();
                panic::resume_unwind(payload);
            }
        };
        drop(state);
        self.ready.notify_all();
        outcome
    }
}

impl<F> fmt::Debug for SharedStorageInitializer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedStorageInitializer")
            .field("state", &self.state())
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_core::StorageOptions;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn real_pair() -> StorageResult<HandlerPair> {
        keel_storage::new_rest(&StorageOptions::default())
    }

    #[test]
    fn test_constructor_is_not_run_eagerly() {
        let calls = AtomicUsize::new(0);
        let initializer = SharedStorageInitializer::new(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            real_pair()
        });

        assert_eq!(initializer.state(), InitPhase::Uninitialized);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_success_is_cached() {
        let calls = AtomicUsize::new(0);
        let initializer = SharedStorageInitializer::new(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            real_pair()
        });

        let first = initializer.get_or_init().unwrap();
        let second = initializer.get_or_init().unwrap();

        assert!(first.same_instances(&second));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(initializer.is_initialized());
    }

    #[test]
    fn test_failure_is_sticky() {
        let calls = AtomicUsize::new(0);
        let initializer = SharedStorageInitializer::new(|| {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(StorageError::Backend("store unreachable".to_string()))
        });

        let first = initializer.get_or_init().unwrap_err();
        let second = initializer.get_or_init().unwrap_err();

        assert_eq!(first, StorageError::Backend("store unreachable".to_string()));
        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(initializer.state(), InitPhase::Failed);
    }

    #[test]
    fn test_panicking_constructor_fails_permanently() {
        let initializer = Arc::new(SharedStorageInitializer::new(
            || -> StorageResult<HandlerPair> { panic!("disk on fire") },
        ));

        let cloned = Arc::clone(&initializer);
        let joined = std::thread::spawn(move || cloned.get_or_init()).join();
        assert!(joined.is_err(), "the panic should reach the constructing thread");

        assert_eq!(initializer.state(), InitPhase::Failed);
        assert_eq!(
            initializer.get_or_init().unwrap_err(),
            StorageError::ConstructionPanicked("disk on fire".to_string())
        );
    }

    #[test]
    fn test_debug_shows_phase() {
        let initializer = SharedStorageInitializer::new(real_pair);
        assert_eq!(
            format!("{initializer:?}"),
            "SharedStorageInitializer { state: Uninitialized }"
        );
    }
}
