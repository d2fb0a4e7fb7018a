use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use http::Method;
use serde_json::json;

use crate::config::{DispatchConfig, ResolveMode};
use crate::dispatcher::Dispatcher;
use crate::manifest::Manifest;
use crate::namespace::{ControllerRegistry, NamespaceIndex};
use crate::router::Resolver;
use crate::server::CallRequest;

/// Command-line interface for exploring a controller tree
#[derive(Parser)]
#[command(name = "endpoints")]
#[command(about = "Resolve and dispatch requests against a controller manifest", long_about = None)]
pub struct Cli {
    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List every module reachable under the controller prefix
    Namespaces {
        #[command(flatten)]
        tree: TreeArgs,
    },
    /// Show where a request would be routed
    Resolve {
        #[command(flatten)]
        tree: TreeArgs,
        #[command(flatten)]
        request: RequestArgs,
    },
    /// Dispatch a request to echo controllers and print the response
    Dispatch {
        #[command(flatten)]
        tree: TreeArgs,
        #[command(flatten)]
        request: RequestArgs,
    },
}

/// Where the controller tree comes from and how it is read.
#[derive(Args, Debug, Clone)]
pub struct TreeArgs {
    /// Path to the controller manifest (YAML)
    #[arg(short, long, env = "ENDPOINTS_MANIFEST")]
    pub manifest: PathBuf,

    /// Controller prefix; defaults to the manifest's `prefix`
    #[arg(short, long)]
    pub prefix: Option<String>,

    /// Append the negotiated version to the prefix
    #[arg(long, default_value_t = false)]
    pub namespace_versioning: bool,

    /// Version used when the Accept header names none
    #[arg(long)]
    pub default_version: Option<String>,

    /// Path interpretation
    #[arg(long, value_enum, default_value_t = ModeArg::Advanced)]
    pub mode: ModeArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Advanced,
    Simple,
}

/// The request to route.
#[derive(Args, Debug, Clone)]
pub struct RequestArgs {
    /// HTTP method
    #[arg(short = 'X', long, default_value = "GET")]
    pub method: String,

    /// Request target, e.g. `/foo/bar?x=1`
    #[arg(default_value = "/")]
    pub path: String,

    /// Accept header value
    #[arg(long)]
    pub accept: Option<String>,

    /// Extra header as `Name: value` (repeatable)
    #[arg(short = 'H', long = "header")]
    pub headers: Vec<String>,

    /// JSON request body
    #[arg(long)]
    pub body: Option<String>,
}

impl TreeArgs {
    fn load(&self) -> Result<(DispatchConfig, Arc<ControllerRegistry>)> {
        let manifest = Manifest::load(&self.manifest)?;
        let prefix = self
            .prefix
            .clone()
            .or_else(|| manifest.prefix.clone())
            .ok_or_else(|| anyhow!("no controller prefix: pass --prefix or set `prefix` in the manifest"))?;

        let mut config = DispatchConfig::new(prefix).with_resolve_mode(match self.mode {
            ModeArg::Advanced => ResolveMode::Advanced,
            ModeArg::Simple => ResolveMode::Simple,
        });
        if self.namespace_versioning {
            config = config.with_namespace_versioning(self.default_version.as_deref());
        } else {
            config.default_version = self.default_version.clone();
        }
        config.validate()?;
        Ok((config, Arc::new(manifest.registry()?)))
    }
}

impl RequestArgs {
    fn build(&self) -> Result<CallRequest> {
        let method = Method::from_bytes(self.method.to_ascii_uppercase().as_bytes())
            .with_context(|| format!("invalid HTTP method `{}`", self.method))?;
        let mut request = CallRequest::new(method, &self.path);
        if let Some(accept) = &self.accept {
            request.set_header("Accept", accept.clone());
        }
        for header in &self.headers {
            let (name, value) = header
                .split_once(':')
                .ok_or_else(|| anyhow!("header `{header}` is not `Name: value`"))?;
            request.set_header(name.trim(), value.trim().to_string());
        }
        if let Some(body) = &self.body {
            request.body = Some(serde_json::from_str(body).context("request body is not JSON")?);
        }
        Ok(request)
    }
}

/// Parse the process arguments and run the selected command on stdout.
pub fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let stdout = io::stdout();
    run_command(&cli.command, &mut stdout.lock())
}

/// Run `command`, writing its JSON output to `out`.
pub fn run_command(command: &Commands, out: &mut dyn Write) -> Result<()> {
    match command {
        Commands::Namespaces { tree } => {
            let (config, registry) = tree.load()?;
            let index = NamespaceIndex::new(registry);
            let names = index.list_namespaces(&config.controller_prefix)?;
            for name in names.iter() {
                writeln!(out, "{name}")?;
            }
        }
        Commands::Resolve { tree, request } => {
            let (config, registry) = tree.load()?;
            let resolver = Resolver::from_registry(config, registry)?;
            let request = request.build()?;
            let output = match resolver.resolve(&request) {
                Ok(resolution) => serde_json::to_value(&resolution)?,
                Err(err) => json!({ "status": err.status(), "error": err.to_string() }),
            };
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        }
        Commands::Dispatch { tree, request } => {
            let (config, registry) = tree.load()?;
            let dispatcher = Dispatcher::new(config, registry)?;
            let response = dispatcher.handle(&request.build()?);
            let headers: serde_json::Map<String, serde_json::Value> = response
                .headers
                .iter()
                .map(|(k, v)| (k.to_string(), json!(v)))
                .collect();
            let output = json!({
                "status": response.status,
                "reason": response.reason(),
                "headers": headers,
                "body": response.body(),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&output)?)?;
        }
    }
    Ok(())
}
