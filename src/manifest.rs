//! Controller manifests: a YAML description of a controller tree.
//!
//! A manifest lists modules, the handler classes each one exports (with
//! their methods) and any decoy symbols. Loading it yields a
//! [`ControllerRegistry`] of echo controllers that answer with the
//! resolution they were reached through, which is what the CLI uses to
//! explore routing without writing any handler code.
//!
//! ```yaml
//! prefix: api
//! modules:
//!   api:
//!     classes:
//!       Default: [GET]
//!   api.foo:
//!     classes:
//!       Bar: [GET, POST]
//!       Versioned:
//!         default_version: v1
//!         versions:
//!           GET:
//!             GET_1: ["", "v1"]
//!             GET_2: ["v2"]
//!     symbols: [Helper]
//!   api.lazy:
//!     deferred: true
//!     classes:
//!       Default: [GET]
//! ```
//!
//! Alternatives under `versions` are declared in name order.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use tracing::info;

use crate::controller::ControllerClass;
use crate::echo::{echo_class, with_echo_method, with_echo_version};
use crate::namespace::{ControllerRegistry, Module};

/// Parsed manifest file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Manifest {
    /// Controller prefix to use when the caller does not give one
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub modules: BTreeMap<String, Option<ModuleSpec>>,
}

/// One module entry.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModuleSpec {
    #[serde(default)]
    pub classes: BTreeMap<String, ClassSpec>,
    #[serde(default)]
    pub symbols: Vec<String>,
    /// Build the module on first load instead of up front
    #[serde(default)]
    pub deferred: bool,
}

/// A class: either just its method names, or the detailed form.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ClassSpec {
    Methods(Vec<String>),
    Detailed(ClassDetail),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClassDetail {
    #[serde(default)]
    pub methods: Vec<String>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub default_version: Option<String>,
    /// Visible method name to alternative name to the versions it serves
    #[serde(default)]
    pub versions: BTreeMap<String, BTreeMap<String, Vec<String>>>,
}

impl Manifest {
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let manifest: Self = serde_yaml::from_str(raw).context("parsing controller manifest")?;
        manifest.validate()?;
        Ok(manifest)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading controller manifest {}", path.display()))?;
        Self::from_yaml_str(&raw).with_context(|| format!("loading {}", path.display()))
    }

    fn validate(&self) -> Result<()> {
        for (name, spec) in &self.modules {
            if name.is_empty() || name.split('.').any(str::is_empty) {
                bail!("invalid module name `{name}`");
            }
            let Some(spec) = spec else { continue };
            for (class, class_spec) in &spec.classes {
                if class.is_empty() {
                    bail!("module `{name}` declares a class with an empty name");
                }
                if class_spec.method_names().any(str::is_empty) {
                    bail!("class `{name}.{class}` declares an empty method name");
                }
            }
        }
        Ok(())
    }

    /// Build a registry of echo controllers.
    pub fn registry(&self) -> Result<ControllerRegistry> {
        let mut registry = ControllerRegistry::new();
        for (name, spec) in &self.modules {
            let spec = spec.clone().unwrap_or_default();
            if spec.deferred {
                let module_name = name.clone();
                registry.register_deferred(name, move || build_module(&module_name, &spec));
            } else {
                registry.register(build_module(name, &spec)?);
            }
        }
        info!(modules = registry.len(), "Controller manifest loaded");
        Ok(registry)
    }
}

impl ClassSpec {
    fn method_names(&self) -> impl Iterator<Item = &str> {
        let (methods, versions) = match self {
            ClassSpec::Methods(methods) => (methods.as_slice(), None),
            ClassSpec::Detailed(detail) => (detail.methods.as_slice(), Some(&detail.versions)),
        };
        methods.iter().map(String::as_str).chain(
            versions
                .into_iter()
                .flat_map(|v| v.iter())
                .flat_map(|(visible, alts)| {
                    std::iter::once(visible.as_str()).chain(alts.keys().map(String::as_str))
                }),
        )
    }

    fn build(&self, name: &str) -> Arc<ControllerClass> {
        match self {
            ClassSpec::Methods(methods) => methods
                .iter()
                .fold(echo_class(name), |b, m| with_echo_method(b, m))
                .build(),
            ClassSpec::Detailed(detail) => {
                let mut builder = echo_class(name);
                if let Some(content_type) = &detail.content_type {
                    builder = builder.content_type(content_type.clone());
                }
                if let Some(version) = &detail.default_version {
                    builder = builder.default_version(version.clone());
                }
                for method in &detail.methods {
                    builder = with_echo_method(builder, method);
                }
                for (visible, alternatives) in &detail.versions {
                    for (alternative, versions) in alternatives {
                        builder = with_echo_version(builder, visible, alternative, versions);
                    }
                }
                builder.build()
            }
        }
    }
}

fn build_module(name: &str, spec: &ModuleSpec) -> Result<Module> {
    let mut module = Module::new(name);
    for (class, class_spec) in &spec.classes {
        module = module.with_controller(class_spec.build(class));
    }
    for symbol in &spec.symbols {
        if spec.classes.contains_key(symbol) {
            bail!("`{name}.{symbol}` is declared both as a class and a symbol");
        }
        module = module.with_symbol(symbol.clone());
    }
    Ok(module)
}
