// Copyright 2024 OctoFHIR Team
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

//! Process-wide cache of property metamodels

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use super::reflector::Reflector;
use super::types::TypeKey;
use crate::model::{Describe, HostObject};

type Slot = Arc<OnceCell<Arc<Reflector>>>;

/// Builds each type's [`Reflector`] at most once and hands out shared copies
///
/// Concurrent first requests for the same type wait on one build; the first
/// finished build is the one every caller receives from then on.
pub struct ReflectorFactory {
    class_cache_enabled: bool,
    reflector_map: DashMap<TypeKey, Slot>,
    builds: AtomicUsize,
}

impl Default for ReflectorFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl ReflectorFactory {
    /// Create a factory with caching enabled
    pub fn new() -> Self {
        Self::with_class_cache(true)
    }

    /// Create a factory, optionally building a fresh reflector on every request
    pub fn with_class_cache(class_cache_enabled: bool) -> Self {
        Self {
            class_cache_enabled,
            reflector_map: DashMap::new(),
            builds: AtomicUsize::new(0),
        }
    }

    /// Whether reflectors are cached
    pub fn is_class_cache_enabled(&self) -> bool {
        self.class_cache_enabled
    }

    /// Reflector for the [`Describe`] type `T`
    pub fn find_for_type<T: Describe>(&self) -> Arc<Reflector> {
        self.find_for(TypeKey::of::<T>(), || Reflector::for_type::<T>())
    }

    /// Reflector for the concrete type behind `object`
    pub fn find_for_object(&self, object: &HostObject) -> Arc<Reflector> {
        self.find_for(object.type_key(), || {
            Reflector::new(object.type_key(), &object.descriptor())
        })
    }

    fn find_for(&self, key: TypeKey, build: impl FnOnce() -> Reflector) -> Arc<Reflector> {
        if !self.class_cache_enabled {
            return Arc::new(self.counted(build));
        }

        // Fast path: already built
        if let Some(slot) = self.reflector_map.get(&key) {
            if let Some(reflector) = slot.get() {
                return Arc::clone(reflector);
            }
        }

        // Clone the slot out so the shard lock is released before building
        let slot: Slot = Arc::clone(self.reflector_map.entry(key).or_default().value());
        Arc::clone(slot.get_or_init(|| Arc::new(self.counted(build))))
    }

    fn counted(&self, build: impl FnOnce() -> Reflector) -> Reflector {
        self.builds.fetch_add(1, Ordering::Relaxed);
        build()
    }

    /// Get statistics about the cache
    pub fn stats(&self) -> ReflectorCacheStats {
        ReflectorCacheStats {
            entries: self.reflector_map.len(),
            builds: self.builds.load(Ordering::Relaxed),
        }
    }

    /// Drop every cached reflector
    pub fn clear(&self) {
        self.reflector_map.clear();
    }
}

impl std::fmt::Debug for ReflectorFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReflectorFactory")
            .field("class_cache_enabled", &self.class_cache_enabled)
            .field("stats", &self.stats())
            .finish()
    }
}

/// Statistics about the reflector cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReflectorCacheStats {
    /// Number of cached types
    pub entries: usize,
    /// Number of reflectors built so far
    pub builds: usize,
}
