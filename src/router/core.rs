use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::{DispatchConfig, ResolveMode, VersionMode};
use crate::controller::{ControllerClass, DEFAULT_CLASS};
use crate::error::{CallError, ConfigError};
use crate::namespace::{ControllerRegistry, Module, ModuleLoader, NamespaceIndex, NamespaceSource};
use crate::route::negotiate_version;
use crate::server::{CallRequest, Kwargs};

/// Module used by simple resolution when the path names none.
pub const DEFAULT_MODULE: &str = "default";

/// Where a request landed: module, class, method and the arguments left over.
///
/// Built fresh for every request and never modified afterwards.
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionResult {
    /// Fully dotted module name (`controllers.foo`)
    pub module_name: String,
    /// `module_name` split into its segments
    pub namespace_path: Vec<String>,
    pub class_name: String,
    /// Entry point to call (`GET`, or `GET_v1` for method-suffix versioning)
    pub method_name: String,
    /// The resolved class definition
    #[serde(skip)]
    pub class: Arc<ControllerClass>,
    /// Path segments not consumed by module or class
    pub positional_args: Vec<String>,
    /// Query parameters
    pub keyword_args: Kwargs,
    /// Version negotiated during resolution, if any
    pub version: Option<String>,
}

impl PartialEq for ResolutionResult {
    fn eq(&self, other: &Self) -> bool {
        self.module_name == other.module_name
            && self.namespace_path == other.namespace_path
            && self.class_name == other.class_name
            && self.method_name == other.method_name
            && Arc::ptr_eq(&self.class, &other.class)
            && self.positional_args == other.positional_args
            && self.keyword_args == other.keyword_args
            && self.version == other.version
    }
}

/// Maps requests onto controller classes.
///
/// In the default advanced mode the path is read as
/// `/<longest known module>/<optional class>/<args...>`:
///
/// ```text
/// GET  /foo            -> controllers.foo.Default.GET()
/// POST /foo/bar        -> controllers.foo.Bar.POST()
/// GET  /foo/bar/che    -> controllers.foo.Bar.GET("che")
/// POST /foo/bar/che?x= -> controllers.foo.Bar.POST("che", x=..)
/// ```
pub struct Resolver {
    config: DispatchConfig,
    index: NamespaceIndex,
    loader: Arc<dyn ModuleLoader>,
}

impl Resolver {
    /// Create a resolver over any namespace source and module loader.
    pub fn new(
        config: DispatchConfig,
        source: Arc<dyn NamespaceSource>,
        loader: Arc<dyn ModuleLoader>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            index: NamespaceIndex::new(source),
            loader,
        })
    }

    /// Create a resolver that both discovers and loads modules from `registry`.
    pub fn from_registry(
        config: DispatchConfig,
        registry: Arc<ControllerRegistry>,
    ) -> Result<Self, ConfigError> {
        let source: Arc<dyn NamespaceSource> = Arc::clone(&registry) as Arc<dyn NamespaceSource>;
        let loader: Arc<dyn ModuleLoader> = registry;
        Self::new(config, source, loader)
    }

    #[must_use]
    pub fn config(&self) -> &DispatchConfig {
        &self.config
    }

    #[must_use]
    pub fn index(&self) -> &NamespaceIndex {
        &self.index
    }

    /// Namespace root for this request, and the version that selected it.
    pub fn effective_prefix(&self, request: &CallRequest) -> Result<(String, Option<String>), CallError> {
        match self.config.versioning {
            VersionMode::Disabled => Ok((self.config.controller_prefix.clone(), None)),
            VersionMode::Namespace => {
                let version = negotiate_version(
                    request,
                    self.config.content_type.as_deref(),
                    self.config.default_version.as_deref(),
                )?;
                if !is_namespace_segment(&version) {
                    debug!(
                        request_id = %request.request_id,
                        version = %version,
                        "Version cannot name a namespace root"
                    );
                    return Err(CallError::VersionMismatch {
                        content_type: self.config.content_type.clone().unwrap_or_default(),
                        requested: Some(version),
                        accepted: Vec::new(),
                    });
                }
                Ok((
                    format!("{}.{}", self.config.controller_prefix, version),
                    Some(version),
                ))
            }
        }
    }

    /// Resolve `request` to a module, class and method.
    pub fn resolve(&self, request: &CallRequest) -> Result<ResolutionResult, CallError> {
        let segments = request.path_args();
        if let Some(first) = segments.first().filter(|s| s.starts_with('_')) {
            debug!(request_id = %request.request_id, segment = %first, "Private path segment rejected");
            return Err(CallError::not_found(format!(
                "{} not found because of error: {} is private",
                request.path, first
            )));
        }

        let (root, version) = self.effective_prefix(request)?;
        let (module, class, consumed) = match self.config.resolve_mode {
            ResolveMode::Advanced => self.locate_advanced(request, &root)?,
            ResolveMode::Simple => self.locate_simple(request, &root)?,
        };

        let (method_name, version) = method_name(request, &class, version)?;
        if !class.responds_to(&method_name) {
            warn!(
                request_id = %request.request_id,
                module = %module.name(),
                class = %class.name(),
                method = %method_name,
                "Resolved class does not answer the method"
            );
            return Err(CallError::method_not_allowed(format!(
                "{} {} not supported",
                request.method, request.path
            )));
        }

        let module_name = module.name().to_string();
        let result = ResolutionResult {
            namespace_path: module_name.split('.').map(str::to_string).collect(),
            module_name,
            class_name: class.name().to_string(),
            method_name,
            class,
            positional_args: segments[consumed..].to_vec(),
            keyword_args: request.query_kwargs(),
            version,
        };
        debug!(
            request_id = %request.request_id,
            module = %result.module_name,
            class = %result.class_name,
            method = %result.method_name,
            args = result.positional_args.len(),
            kwargs = result.keyword_args.len(),
            "Request resolved"
        );
        Ok(result)
    }

    /// Longest known module, then an optional class segment.
    fn locate_advanced(
        &self,
        request: &CallRequest,
        root: &str,
    ) -> Result<(Arc<Module>, Arc<ControllerClass>, usize), CallError> {
        let known = self.index.list_namespaces(root).map_err(|e| match e {
            ConfigError::RootNotLoadable(_) => {
                CallError::not_found(format!("{} not found because of error: {e}", request.path))
            }
            other => CallError::Config(other),
        })?;

        let segments = request.path_args();
        let mut module_name = root.to_string();
        let mut consumed = 0;
        for segment in segments {
            let candidate = format!("{module_name}.{segment}");
            if !known.contains(&candidate) {
                break;
            }
            module_name = candidate;
            consumed += 1;
        }
        debug!(
            request_id = %request.request_id,
            module = %module_name,
            consumed,
            "Namespace walk finished"
        );

        let module = self.load(request, &module_name)?;

        let mut class_name = DEFAULT_CLASS.to_string();
        if let Some(segment) = segments.get(consumed).filter(|s| !s.starts_with('_')) {
            let candidate = capitalize(segment);
            if module.controller(&candidate).is_some() {
                class_name = candidate;
                consumed += 1;
            }
        }

        let class = lookup_class(request, &module, &class_name)?;
        Ok((module, class, consumed))
    }

    /// Exactly `/module/class/args`.
    fn locate_simple(
        &self,
        request: &CallRequest,
        root: &str,
    ) -> Result<(Arc<Module>, Arc<ControllerClass>, usize), CallError> {
        let segments = request.path_args();
        let mut consumed = 0;

        let module_segment = match segments.first() {
            Some(segment) => {
                consumed += 1;
                segment.as_str()
            }
            None => DEFAULT_MODULE,
        };
        let module = self.load(request, &format!("{root}.{module_segment}"))?;

        let class_name = match segments.get(consumed) {
            Some(segment) if segment.starts_with('_') => {
                return Err(CallError::not_found(format!(
                    "{} not found because of error: {} is private",
                    request.path, segment
                )));
            }
            Some(segment) => {
                consumed += 1;
                capitalize(segment)
            }
            None => DEFAULT_CLASS.to_string(),
        };

        let class = lookup_class(request, &module, &class_name)?;
        Ok((module, class, consumed))
    }

    fn load(&self, request: &CallRequest, module_name: &str) -> Result<Arc<Module>, CallError> {
        self.loader.load(module_name).map_err(|e| {
            warn!(
                request_id = %request.request_id,
                module = %module_name,
                error = %e,
                "Controller module failed to load"
            );
            CallError::not_found(format!("{} not found because of error: {e}", request.path))
        })
    }
}

/// Whether `segment` can stand alone as one public namespace component.
fn is_namespace_segment(segment: &str) -> bool {
    !segment.is_empty() && !segment.starts_with('_') && !segment.contains('.')
}

/// Upper-case the first character, leaving the rest untouched.
pub(crate) fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lookup_class(
    request: &CallRequest,
    module: &Module,
    class_name: &str,
) -> Result<Arc<ControllerClass>, CallError> {
    module.controller(class_name).map(Arc::clone).ok_or_else(|| {
        CallError::not_found(format!(
            "{} not found because of error: module `{}` has no handler class `{}`",
            request.path,
            module.name(),
            class_name
        ))
    })
}

/// Entry point name for `request` on `class`.
///
/// Classes with method-suffix versioning get `GET_<version>`; the version is
/// the namespace version when there is one, else negotiated against the
/// class's own content type and default. `OPTIONS` is never suffixed.
fn method_name(
    request: &CallRequest,
    class: &ControllerClass,
    version: Option<String>,
) -> Result<(String, Option<String>), CallError> {
    let base = request.method.as_str().to_ascii_uppercase();
    if !class.version_suffixed() || base == "OPTIONS" {
        return Ok((base, version));
    }
    let version = match version {
        Some(version) => version,
        None => negotiate_version(request, class.content_type(), class.default_version())?,
    };
    Ok((format!("{base}_{version}"), Some(version)))
}
