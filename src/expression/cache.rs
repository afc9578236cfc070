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

//! Bounded cache of parsed expressions

use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::Arc;

use super::ast::ExpressionNode;
use super::error::ExpressionResult;
use super::parser::parse_expression;

/// Hit/miss counters for an [`ExpressionCache`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit ratio as percentage
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

struct Inner {
    entries: LruCache<String, Arc<ExpressionNode>>,
    stats: CacheStats,
}

/// LRU cache from expression text to its parsed tree
///
/// Parse failures are not cached.
pub struct ExpressionCache {
    inner: Mutex<Inner>,
}

impl ExpressionCache {
    /// Create a cache holding at most `capacity` trees (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            inner: Mutex::new(Inner {
                entries: LruCache::new(capacity),
                stats: CacheStats::default(),
            }),
        }
    }

    /// Parsed tree for `expression`, parsing on a miss
    pub fn get_or_parse(&self, expression: &str) -> ExpressionResult<Arc<ExpressionNode>> {
        {
            let mut inner = self.inner.lock();
            if let Some(node) = inner.entries.get(expression).cloned() {
                inner.stats.hits += 1;
                return Ok(node);
            }
            inner.stats.misses += 1;
        }

        // Parse outside the lock; a racing parse of the same text just overwrites
        let node = Arc::new(parse_expression(expression)?);
        self.inner
            .lock()
            .entries
            .put(expression.to_string(), Arc::clone(&node));
        Ok(node)
    }

    /// Number of cached trees
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Check if the cache is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of cached trees
    pub fn capacity(&self) -> usize {
        self.inner.lock().entries.cap().get()
    }

    /// Current hit/miss counters
    pub fn stats(&self) -> CacheStats {
        self.inner.lock().stats
    }

    /// Drop every entry and reset the counters
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        inner.entries.clear();
        inner.stats = CacheStats::default();
    }
}

impl std::fmt::Debug for ExpressionCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExpressionCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
