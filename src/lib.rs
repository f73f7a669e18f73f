//! unfw - declarative firewall rule compiler
//!
//! unfw turns a JSON document describing named IP-address sources and named
//! destination firewalls into a compiled, in-memory rule set grouped by the
//! firewall that must apply it.
//!
//! # Architecture
//!
//! - [`core`] - Rule data model, registries, the compiler, and the apply stage
//! - [`config`] - Rule set document parsing and the file-loading pipeline
//! - [`sources`] - IP source backends (Cloudflare published IP lists)
//! - [`firewalls`] - Firewall backends (Hetzner Cloud, ufw)
//!
//! # Pipeline
//!
//! 1. Parse the document into typed declarations ([`config`])
//! 2. Build the source and firewall registries from the `configuration`
//!    section, one capability instance per entry ([`core::registry`])
//! 3. Resolve and group every rule declaration ([`core::compiler`])
//! 4. Hand the resulting [`CompiledRuleSet`] to [`core::apply`]
//!
//! Every validation failure is fail-fast: the first bad entry or rule aborts
//! the whole compilation and no partial rule set is ever returned.

// Allow pedantic clippy warnings that are not worth fixing for this codebase
#![allow(clippy::must_use_candidate)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_errors_doc)]

pub mod config;
pub mod core;
pub mod firewalls;
pub mod sources;

// Re-export commonly used types
pub use core::compiler::{CompiledDestination, CompiledRuleSet};
pub use core::error::{Error, Result};
pub use core::rule::{Action, Firewall, FirewallType, Rule, Source, SourceType};
