//! Core rule compilation functionality
//!
//! This module contains the types and logic that turn parsed configuration
//! into a compiled rule set. It provides:
//!
//! - [`rule`]: The rule data model and the `Source`/`Firewall` capability traits
//! - [`registry`]: Construction of named source and firewall instances
//! - [`compiler`]: Resolution and grouping of rule declarations
//! - [`apply`]: Pushing a compiled rule set into the destination firewalls
//! - [`error`]: Error types for configuration and compilation failures

pub mod apply;
pub mod compiler;
pub mod error;
pub mod registry;
pub mod rule;

#[cfg(test)]
mod tests;
