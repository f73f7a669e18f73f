//! Rule data model and capability traits
//!
//! This module defines the closed type enumerations, the [`Rule`] struct, and
//! the two capability traits the compiler resolves against:
//!
//! - [`Source`]: a named provider of IP networks (e.g. a CDN's published list)
//! - [`Firewall`]: a named target that accepts rule-addition requests
//!
//! A [`Rule`] does not own its source; it holds a shared reference resolved
//! by the compiler. The port fields are carried verbatim from the document -
//! validating their combination is left to the firewall backend applying the
//! rule.

use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::core::error::Result;

/// The available IP source backends
///
/// Closed, string-tagged set: an unrecognized tag in the configuration is a
/// validation error, never silently ignored.
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    /// Cloudflare's published edge IP ranges
    #[strum(serialize = "cloudflare")]
    Cloudflare,
}

/// The available firewall backends
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum FirewallType {
    /// Hetzner Cloud's network firewall
    #[strum(serialize = "hetzner")]
    Hetzner,
    /// The local ufw (Uncomplicated Firewall) frontend
    #[strum(serialize = "ufw")]
    Ufw,
}

/// What a rule does with traffic from its source
#[derive(
    Debug,
    Clone,
    Copy,
    Serialize,
    Deserialize,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
    strum::AsRefStr,
)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    /// Let traffic from the source through
    #[strum(serialize = "allow")]
    Allow,
    /// Block traffic from the source
    #[strum(serialize = "deny")]
    Deny,
}

impl Action {
    /// Returns the lowercase action tag as a static string
    pub const fn as_str(self) -> &'static str {
        match self {
            Action::Allow => "allow",
            Action::Deny => "deny",
        }
    }
}

/// A named provider of IP addresses to allow or deny.
///
/// Implementations may fetch the list over the network; nothing in the
/// compiler ever calls [`ip_addresses`](Source::ip_addresses) - only the
/// apply stage and the firewall backends do.
pub trait Source: Send + Sync {
    /// The IP networks this source currently publishes.
    ///
    /// Bare addresses are represented as host networks (/32 or /128).
    fn ip_addresses(&self) -> Result<Vec<IpNetwork>>;

    /// The backend tag this instance was constructed from.
    fn source_type(&self) -> SourceType;
}

/// A named target system capable of accepting rule-addition requests.
pub trait Firewall: Send + Sync {
    /// Applies one compiled rule to the underlying firewall.
    fn add_rule(&self, rule: &Rule) -> Result<()>;

    /// The backend tag this instance was constructed from.
    fn firewall_type(&self) -> FirewallType;
}

// Registries and compiled rule sets carry these as trait objects; rendering
// the backend tag keeps them debuggable without forcing Debug on every
// implementation.
impl fmt::Debug for dyn Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Source({})", self.source_type())
    }
}

impl fmt::Debug for dyn Firewall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Firewall({})", self.firewall_type())
    }
}

/// One allow/deny directive, fully resolved.
///
/// Produced by the compiler; `source` is shared with the source registry the
/// rule was resolved against. The port and interface fields are mutually
/// non-exclusive here - which combinations make sense is up to the backend.
#[derive(Clone)]
pub struct Rule {
    pub action: Action,
    pub source: Arc<dyn Source>,
    /// Single port, if the declaration carried one
    pub port: Option<u16>,
    /// Discrete port list; empty when absent from the declaration
    pub ports: Vec<u16>,
    /// Inclusive port range
    pub port_range: Option<(u16, u16)>,
    /// Network interfaces the rule is scoped to; empty means all
    pub interfaces: Vec<String>,
}

impl fmt::Debug for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rule")
            .field("action", &self.action)
            .field("source", &self.source)
            .field("port", &self.port)
            .field("ports", &self.ports)
            .field("port_range", &self.port_range)
            .field("interfaces", &self.interfaces)
            .finish()
    }
}
