//! Resolution and grouping of rule declarations
//!
//! The compiler walks the document's rule list in declaration order,
//! resolves each declaration's destination and source against the populated
//! registries, validates the action tag, and appends the resulting [`Rule`]
//! to its destination's list. The output groups by the destination's
//! declared (lowercased) name and carries the resolved firewall instance
//! alongside each list, so the capability type never needs to be comparable
//! or hashable.
//!
//! Compilation is fail-fast: the first unresolved reference or invalid
//! action aborts the whole run and no partial rule set is returned. It
//! performs no I/O and never mutates the registries.

use serde::Deserialize;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{Error, Result};
use crate::core::registry::{FirewallRegistry, SourceRegistry};
use crate::core::rule::{Action, Firewall, Rule};

/// One raw rule entry from the document, before resolution.
///
/// The reference fields default to empty strings so a structurally valid
/// document with an incomplete rule still parses and is then rejected with
/// the proper rule-index error instead of a serde message.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleDeclaration {
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub port: Option<u16>,
    #[serde(default)]
    pub ports: Vec<u16>,
    #[serde(default)]
    pub port_range: Option<(u16, u16)>,
    #[serde(default)]
    pub interfaces: Vec<String>,
}

/// A destination firewall together with its accumulated rules
#[derive(Debug, Clone)]
pub struct CompiledDestination {
    /// The lowercased configuration name the rules were grouped under
    pub name: String,
    /// The firewall instance that must apply the rules
    pub firewall: Arc<dyn Firewall>,
    /// Rules in declaration order
    pub rules: Vec<Rule>,
}

/// The compiler's output: destination firewalls and their ordered rule lists.
///
/// Destinations appear in order of first mention; a destination no rule
/// names has no entry. Read-only after compilation.
#[derive(Debug, Clone, Default)]
pub struct CompiledRuleSet {
    destinations: Vec<CompiledDestination>,
}

impl CompiledRuleSet {
    /// Looks a destination up by its lowercased configuration name.
    pub fn get(&self, name: &str) -> Option<&CompiledDestination> {
        self.destinations.iter().find(|d| d.name == name)
    }

    /// Iterates destinations in order of first mention.
    pub fn iter(&self) -> std::slice::Iter<'_, CompiledDestination> {
        self.destinations.iter()
    }

    /// Number of destinations with at least one rule.
    pub fn len(&self) -> usize {
        self.destinations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.destinations.is_empty()
    }

    fn push_rule(&mut self, name: &str, firewall: &Arc<dyn Firewall>, rule: Rule) {
        match self.destinations.iter_mut().find(|d| d.name == name) {
            Some(destination) => destination.rules.push(rule),
            None => self.destinations.push(CompiledDestination {
                name: name.to_string(),
                firewall: Arc::clone(firewall),
                rules: vec![rule],
            }),
        }
    }
}

impl<'a> IntoIterator for &'a CompiledRuleSet {
    type Item = &'a CompiledDestination;
    type IntoIter = std::slice::Iter<'a, CompiledDestination>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Resolves and groups rule declarations against the populated registries.
///
/// For each declaration, by positional index: resolve the lowercased
/// destination name, resolve the lowercased source name, parse the
/// lowercased action, then append the rule to its destination's list. The
/// port and interface fields are copied verbatim - their internal
/// consistency is the applying backend's concern.
pub fn compile(
    declarations: &[RuleDeclaration],
    sources: &SourceRegistry,
    firewalls: &FirewallRegistry,
) -> Result<CompiledRuleSet> {
    let mut compiled = CompiledRuleSet::default();

    for (index, declaration) in declarations.iter().enumerate() {
        let destination_name = declaration.destination.to_lowercase();
        let firewall = firewalls
            .get(&destination_name)
            .ok_or(Error::DestinationNotConfigured { index })?;

        let source_name = declaration.source.to_lowercase();
        let source = sources
            .get(&source_name)
            .ok_or(Error::SourceNotConfigured { index })?;

        let action = Action::from_str(&declaration.action.to_lowercase()).map_err(|_| {
            Error::InvalidAction {
                index,
                value: declaration.action.clone(),
            }
        })?;

        let rule = Rule {
            action,
            source: Arc::clone(source),
            port: declaration.port,
            ports: declaration.ports.clone(),
            port_range: declaration.port_range,
            interfaces: declaration.interfaces.clone(),
        };

        compiled.push_rule(&destination_name, firewall, rule);
    }

    Ok(compiled)
}
