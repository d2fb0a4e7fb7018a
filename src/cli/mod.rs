//! # CLI Module
//!
//! Command-line tooling for inspecting how requests route through a
//! controller tree described by a [manifest](crate::manifest).
//!
//! ## Commands
//!
//! ### `namespaces`
//!
//! List every module reachable under the prefix:
//!
//! ```bash
//! endpoints namespaces --manifest controllers.yaml --prefix api
//! ```
//!
//! ### `resolve`
//!
//! Print the resolution for a request as JSON, or the error it fails with:
//!
//! ```bash
//! endpoints resolve --manifest controllers.yaml -X POST /foo/bar/che?x=1
//! ```
//!
//! ### `dispatch`
//!
//! Run the request through the dispatcher against echo controllers and print
//! status, headers and body:
//!
//! ```bash
//! endpoints dispatch --manifest controllers.yaml \
//!     --accept "application/json;version=v2" /foo/versioned
//! ```
//!
//! Options shared by every command:
//! - `--manifest <FILE>` - controller manifest (or `ENDPOINTS_MANIFEST`)
//! - `--prefix <NAME>` - controller prefix (default: the manifest's `prefix`)
//! - `--namespace-versioning` - resolve under `prefix.<version>`
//! - `--default-version <V>` - version assumed when the request names none
//! - `--mode advanced|simple` - path interpretation

mod commands;


pub use commands::{run_cli, run_command, Cli, Commands, ModeArg, RequestArgs, TreeArgs};
