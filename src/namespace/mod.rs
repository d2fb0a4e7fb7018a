//! Controller namespaces: where handler classes live and how they are found.
//!
//! Controllers are grouped in dotted module names under a configured root
//! (`api`, `api.users`, `api.users.admin`). A [`NamespaceSource`] answers two
//! questions about that tree: can a name be loaded, and what are a
//! package's children. [`NamespaceIndex`] walks the tree once per root and
//! caches the result; [`ControllerRegistry`] is the in-process source that
//! applications populate at startup.

mod index;
mod registry;

pub use index::NamespaceIndex;
pub use registry::{Attribute, ControllerRegistry, Module, ModuleInit, ModuleLoader};

/// Whether a namespace entry can contain further entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamespaceKind {
    /// Has sub-modules; the walk descends into it
    Package,
    /// Leaf module
    Module,
}

/// A direct child of a package, by its last name segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespaceEntry {
    pub name: String,
    pub kind: NamespaceKind,
}

impl NamespaceEntry {
    #[must_use]
    pub fn package(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NamespaceKind::Package,
        }
    }

    #[must_use]
    pub fn module(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NamespaceKind::Module,
        }
    }
}

/// Something that knows the shape of the controller namespace tree.
pub trait NamespaceSource: Send + Sync {
    /// Whether `name` (fully dotted) exists and can be loaded.
    fn is_loadable(&self, name: &str) -> bool;

    /// Direct children of `package`. Empty for leaf modules.
    fn children(&self, package: &str) -> Vec<NamespaceEntry>;
}
