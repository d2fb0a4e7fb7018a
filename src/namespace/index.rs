use std::collections::BTreeSet;
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use super::{NamespaceKind, NamespaceSource};
use crate::error::ConfigError;

/// Cache of fully-qualified module names reachable under each namespace root.
///
/// The first lookup for a root walks the source; later lookups return the
/// same shared set. Concurrent first lookups may both walk, but only one
/// result is stored and every caller gets that one.
pub struct NamespaceIndex {
    source: Arc<dyn NamespaceSource>,
    cache: DashMap<String, Arc<BTreeSet<String>>>,
    walks: AtomicUsize,
}

impl NamespaceIndex {
    #[must_use]
    pub fn new(source: Arc<dyn NamespaceSource>) -> Self {
        Self {
            source,
            cache: DashMap::new(),
            walks: AtomicUsize::new(0),
        }
    }

    /// Every module name under `root`, the root included.
    ///
    /// Names whose last segment starts with `_` or `.` are private and
    /// skipped together with everything below them.
    pub fn list_namespaces(&self, root: &str) -> Result<Arc<BTreeSet<String>>, ConfigError> {
        if root.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if let Some(hit) = self.cache.get(root) {
            return Ok(Arc::clone(hit.value()));
        }
        if !self.source.is_loadable(root) {
            return Err(ConfigError::RootNotLoadable(root.to_string()));
        }

        let found = self.walk(root);
        self.walks.fetch_add(1, Ordering::Relaxed);
        info!(root = %root, modules = found.len(), "Namespace tree indexed");

        let entry = self.cache.entry(root.to_string()).or_insert(Arc::new(found));
        Ok(Arc::clone(entry.value()))
    }

    fn walk(&self, root: &str) -> BTreeSet<String> {
        let mut found = BTreeSet::new();
        found.insert(root.to_string());
        let mut pending = vec![root.to_string()];
        while let Some(package) = pending.pop() {
            for child in self.source.children(&package) {
                if is_private(&child.name) {
                    debug!(package = %package, child = %child.name, "Skipping private namespace");
                    continue;
                }
                let name = format!("{package}.{}", child.name);
                if found.insert(name.clone()) && child.kind == NamespaceKind::Package {
                    pending.push(name);
                }
            }
        }
        found
    }

    /// Whether `root` has already been walked.
    #[must_use]
    pub fn is_cached(&self, root: &str) -> bool {
        self.cache.contains_key(root)
    }

    /// Number of tree walks performed so far.
    #[must_use]
    pub fn walk_count(&self) -> usize {
        self.walks.load(Ordering::Relaxed)
    }

    /// Forget every cached root.
    pub fn clear(&self) {
        self.cache.clear();
    }
}

impl fmt::Debug for NamespaceIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceIndex")
            .field("cached_roots", &self.cache.len())
            .field("walks", &self.walk_count())
            .finish_non_exhaustive()
    }
}

fn is_private(segment: &str) -> bool {
    segment.starts_with('_') || segment.starts_with('.')
}
