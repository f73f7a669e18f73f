//! ufw (Uncomplicated Firewall) backend
//!
//! Renders compiled rules into `ufw` command invocations and runs them
//! through the local binary. One invocation per (source network, interface)
//! combination, since ufw takes a single `from` address and at most one
//! `in on` clause per command.
//!
//! Property bag: `binary` (optional path override, mainly for tests).

use std::process::Command;
use tracing::debug;

use crate::core::error::{Error, Result};
use crate::core::rule::{Firewall, FirewallType, Rule};

/// A [`Firewall`] that shells out to the local `ufw` binary.
pub struct UfwFirewall {
    binary: String,
}

impl UfwFirewall {
    /// Constructs the backend from its configuration property bag.
    pub fn from_config(extra: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let binary = match extra.get("binary") {
            None => "ufw".to_string(),
            Some(serde_json::Value::String(path)) => path.clone(),
            Some(_) => return Err(Error::InvalidValue("binary")),
        };

        Ok(Self { binary })
    }

    fn run(&self, args: &[String]) -> Result<()> {
        debug!(binary = %self.binary, ?args, "running ufw");

        let output = Command::new(&self.binary).args(args).output()?;
        if output.status.success() {
            return Ok(());
        }

        Err(Error::Ufw {
            message: format!("command `ufw {}` failed", args.join(" ")),
            stderr: Some(String::from_utf8_lossy(&output.stderr).into_owned()),
            exit_code: output.status.code(),
        })
    }
}

impl Firewall for UfwFirewall {
    fn add_rule(&self, rule: &Rule) -> Result<()> {
        let networks = rule.source.ip_addresses()?;

        for network in &networks {
            if rule.interfaces.is_empty() {
                self.run(&command_args(rule, &network.to_string(), None))?;
            } else {
                for interface in &rule.interfaces {
                    self.run(&command_args(rule, &network.to_string(), Some(interface)))?;
                }
            }
        }

        Ok(())
    }

    fn firewall_type(&self) -> FirewallType {
        FirewallType::Ufw
    }
}

/// Renders one rule for one source network into ufw arguments.
///
/// Shapes like `allow in on eth0 from 203.0.113.0/24 to any port 443 proto tcp`.
pub fn command_args(rule: &Rule, network: &str, interface: Option<&str>) -> Vec<String> {
    let mut args = vec![rule.action.as_str().to_string()];

    if let Some(interface) = interface {
        args.push("in".to_string());
        args.push("on".to_string());
        args.push(interface.to_string());
    }

    args.push("from".to_string());
    args.push(network.to_string());
    args.push("to".to_string());
    args.push("any".to_string());

    if let Some(clause) = port_clause(rule) {
        args.push("port".to_string());
        args.push(clause);
        args.push("proto".to_string());
        args.push("tcp".to_string());
    }

    args
}

/// Picks the single port clause ufw accepts per command: an explicit port
/// wins, then the range (colon-separated in ufw syntax), then the list.
fn port_clause(rule: &Rule) -> Option<String> {
    if let Some(port) = rule.port {
        return Some(port.to_string());
    }
    if let Some((start, end)) = rule.port_range {
        return Some(format!("{start}:{end}"));
    }
    if !rule.ports.is_empty() {
        let joined: Vec<String> = rule.ports.iter().map(ToString::to_string).collect();
        return Some(joined.join(","));
    }
    None
}
