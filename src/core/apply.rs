//! Pushing a compiled rule set into the destination firewalls
//!
//! This is the only place the [`Firewall`](crate::core::rule::Firewall)
//! capability is exercised. Backend failures are wrapped with the
//! destination name so the caller can tell which firewall rejected which
//! configuration. No retry or backoff; a rejected rule aborts the run.

use tracing::debug;

use crate::core::compiler::CompiledRuleSet;
use crate::core::error::{Error, Result};

/// Applies every rule to its destination firewall, in compilation order.
///
/// Fail-fast: the first backend error aborts the remaining destinations.
/// Rules already applied before the failure are not rolled back.
pub fn apply(rule_set: &CompiledRuleSet) -> Result<()> {
    for destination in rule_set {
        debug!(
            destination = %destination.name,
            rules = destination.rules.len(),
            "applying rules"
        );

        for rule in &destination.rules {
            destination
                .firewall
                .add_rule(rule)
                .map_err(|e| Error::Backend {
                    name: destination.name.clone(),
                    source: Box::new(e),
                })?;
        }
    }

    Ok(())
}
