use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use tracing::{debug, warn};

use super::{NamespaceEntry, NamespaceKind, NamespaceSource};
use crate::controller::ControllerClass;
use crate::error::LoadError;

/// A named attribute of a module.
#[derive(Debug, Clone)]
pub enum Attribute {
    /// A handler class the resolver may select
    Controller(Arc<ControllerClass>),
    /// Any other exported name (helpers, constants). Never selected as a class.
    Symbol,
}

/// A loaded controller module: a dotted name plus its attributes.
#[derive(Debug, Clone)]
pub struct Module {
    name: String,
    attributes: BTreeMap<String, Attribute>,
}

impl Module {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// Export `class` under its own name.
    #[must_use]
    pub fn with_controller(mut self, class: Arc<ControllerClass>) -> Self {
        self.attributes
            .insert(class.name().to_string(), Attribute::Controller(class));
        self
    }

    /// Export a non-controller name.
    #[must_use]
    pub fn with_symbol(mut self, name: impl Into<String>) -> Self {
        self.attributes.insert(name.into(), Attribute::Symbol);
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The controller class exported as `name`, if that attribute is one.
    #[must_use]
    pub fn controller(&self, name: &str) -> Option<&Arc<ControllerClass>> {
        match self.attributes.get(name)? {
            Attribute::Controller(class) => Some(class),
            Attribute::Symbol => None,
        }
    }

    #[must_use]
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.contains_key(name)
    }

    /// Names of exported controller classes, sorted.
    pub fn controller_names(&self) -> impl Iterator<Item = &str> {
        self.attributes.iter().filter_map(|(name, attr)| match attr {
            Attribute::Controller(_) => Some(name.as_str()),
            Attribute::Symbol => None,
        })
    }
}

/// Loads modules by fully dotted name.
pub trait ModuleLoader: Send + Sync {
    fn load(&self, name: &str) -> Result<Arc<Module>, LoadError>;
}

/// Builds a module the first time it is loaded.
pub type ModuleInit = Box<dyn Fn() -> anyhow::Result<Module> + Send + Sync>;

enum Slot {
    Ready(Arc<Module>),
    Deferred {
        init: ModuleInit,
        cell: OnceCell<Arc<Module>>,
    },
}

/// In-process module registry: the usual [`NamespaceSource`] and
/// [`ModuleLoader`] for a dispatcher.
///
/// Registering `api.users.admin` also registers empty `api` and `api.users`
/// packages if they are not there yet, so the namespace walk can reach it.
#[derive(Default)]
pub struct ControllerRegistry {
    modules: BTreeMap<String, Slot>,
}

impl ControllerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a ready module, replacing any previous one with that name.
    pub fn register(&mut self, module: Module) -> &mut Self {
        let name = module.name().to_string();
        self.ensure_parents(&name);
        debug!(module = %name, "Registered controller module");
        self.modules.insert(name, Slot::Ready(Arc::new(module)));
        self
    }

    /// Register a module that is built on first load.
    ///
    /// A failing initialiser is reported as a load error and retried on the
    /// next load.
    pub fn register_deferred<F>(&mut self, name: &str, init: F) -> &mut Self
    where
        F: Fn() -> anyhow::Result<Module> + Send + Sync + 'static,
    {
        self.ensure_parents(name);
        debug!(module = %name, "Registered deferred controller module");
        self.modules.insert(
            name.to_string(),
            Slot::Deferred {
                init: Box::new(init),
                cell: OnceCell::new(),
            },
        );
        self
    }

    fn ensure_parents(&mut self, name: &str) {
        let mut end = 0;
        while let Some(dot) = name[end..].find('.') {
            let parent = &name[..end + dot];
            if !self.modules.contains_key(parent) {
                self.modules
                    .insert(parent.to_string(), Slot::Ready(Arc::new(Module::new(parent))));
            }
            end += dot + 1;
        }
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.modules.contains_key(name)
    }

    /// Registered module names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.modules.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for ControllerRegistry {
    fn load(&self, name: &str) -> Result<Arc<Module>, LoadError> {
        match self.modules.get(name) {
            None => Err(LoadError::Missing(name.to_string())),
            Some(Slot::Ready(module)) => Ok(Arc::clone(module)),
            Some(Slot::Deferred { init, cell }) => cell
                .get_or_try_init(|| init().map(Arc::new))
                .map(Arc::clone)
                .map_err(|source| {
                    warn!(module = %name, error = %source, "Deferred module failed to initialise");
                    LoadError::Init {
                        name: name.to_string(),
                        source,
                    }
                }),
        }
    }
}

impl NamespaceSource for ControllerRegistry {
    fn is_loadable(&self, name: &str) -> bool {
        self.contains(name)
    }

    fn children(&self, package: &str) -> Vec<NamespaceEntry> {
        let prefix = format!("{package}.");
        let mut children: BTreeMap<&str, NamespaceKind> = BTreeMap::new();
        for rest in self.modules.keys().filter_map(|k| k.strip_prefix(prefix.as_str())) {
            match rest.split_once('.') {
                Some((child, _)) => {
                    children.insert(child, NamespaceKind::Package);
                }
                None => {
                    children.entry(rest).or_insert(NamespaceKind::Module);
                }
            }
        }
        children
            .into_iter()
            .map(|(name, kind)| NamespaceEntry {
                name: name.to_string(),
                kind,
            })
            .collect()
    }
}

impl fmt::Debug for ControllerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ControllerRegistry")
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}
