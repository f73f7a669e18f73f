//! Hetzner Cloud network firewall backend
//!
//! Hetzner's API has no incremental rule addition; `set_rules` replaces the
//! whole rule list of a firewall. This backend therefore accumulates every
//! rule it is handed and re-posts the full set on each call, which keeps the
//! one-rule-at-a-time [`Firewall`] contract while staying honest about the
//! wire semantics.
//!
//! Property bag: `token` (required), `firewall_id` (required),
//! `api_base` (optional, for tests).
//!
//! Hetzner cloud firewalls are default-deny with allow rules only, so deny
//! rules are rejected as unsupported. Interface scoping does not exist on
//! this backend and is ignored.

use std::sync::Mutex;
use tracing::debug;

use crate::core::error::{Error, Result};
use crate::core::rule::{Action, Firewall, FirewallType, Rule};

/// Production API endpoint
const DEFAULT_API_BASE: &str = "https://api.hetzner.cloud/v1";

/// A [`Firewall`] that manages rules of one Hetzner Cloud firewall.
pub struct HetznerFirewall {
    client: reqwest::blocking::Client,
    token: String,
    firewall_id: u64,
    api_base: String,
    /// Wire-format rules applied so far; re-sent wholesale on every call
    /// because the API only supports replacing the full set.
    pending: Mutex<Vec<serde_json::Value>>,
}

impl HetznerFirewall {
    /// Constructs the backend from its configuration property bag.
    ///
    /// Missing credentials are a construction failure, surfaced before any
    /// rule is compiled against this destination.
    pub fn from_config(extra: &serde_json::Map<String, serde_json::Value>) -> Result<Self> {
        let token = match extra.get("token") {
            Some(serde_json::Value::String(token)) if !token.is_empty() => token.clone(),
            Some(serde_json::Value::String(_)) | None => {
                return Err(Error::MissingValue("token"));
            }
            Some(_) => return Err(Error::InvalidValue("token")),
        };

        let firewall_id = match extra.get("firewall_id") {
            Some(value) => value
                .as_u64()
                .ok_or(Error::InvalidValue("firewall_id"))?,
            None => return Err(Error::MissingValue("firewall_id")),
        };

        let api_base = match extra.get("api_base") {
            None => DEFAULT_API_BASE.to_string(),
            Some(serde_json::Value::String(base)) => base.trim_end_matches('/').to_string(),
            Some(_) => return Err(Error::InvalidValue("api_base")),
        };

        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            token,
            firewall_id,
            api_base,
            pending: Mutex::new(Vec::new()),
        })
    }

    /// Renders one compiled rule into Hetzner wire-format rule objects, one
    /// per port constraint.
    fn render_rule(rule: &Rule, source_ips: &[String]) -> Result<Vec<serde_json::Value>> {
        if rule.action == Action::Deny {
            return Err(Error::UnsupportedRule(
                "hetzner firewalls are default-deny; deny rules cannot be expressed".into(),
            ));
        }

        // TODO: carry a protocol field on Rule; the API wants one per rule
        // and tcp is assumed here.
        let wire = |port: Option<String>| {
            let mut rule = serde_json::json!({
                "direction": "in",
                "protocol": "tcp",
                "source_ips": source_ips,
            });
            if let Some(port) = port {
                rule["port"] = serde_json::Value::String(port);
            }
            rule
        };

        let mut rules = Vec::new();
        if let Some(port) = rule.port {
            rules.push(wire(Some(port.to_string())));
        }
        for port in &rule.ports {
            rules.push(wire(Some(port.to_string())));
        }
        if let Some((start, end)) = rule.port_range {
            rules.push(wire(Some(format!("{start}-{end}"))));
        }
        if rules.is_empty() {
            rules.push(wire(None));
        }

        Ok(rules)
    }
}

impl Firewall for HetznerFirewall {
    fn add_rule(&self, rule: &Rule) -> Result<()> {
        let source_ips: Vec<String> = rule
            .source
            .ip_addresses()?
            .into_iter()
            .map(|network| network.to_string())
            .collect();

        let rendered = Self::render_rule(rule, &source_ips)?;

        let mut pending = self
            .pending
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        pending.extend(rendered);

        let url = format!(
            "{}/firewalls/{}/actions/set_rules",
            self.api_base, self.firewall_id
        );
        debug!(url = %url, rules = pending.len(), "replacing hetzner rule set");

        self.client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({ "rules": &*pending }))
            .send()?
            .error_for_status()?;

        Ok(())
    }

    fn firewall_type(&self) -> FirewallType {
        FirewallType::Hetzner
    }
}
