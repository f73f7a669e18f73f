//! Construction of named source and firewall instances
//!
//! The registries materialize one capability instance per entry in the
//! `configuration` section of the document. Dispatch is a closed match over
//! the backend enums, so adding a new backend is a single new arm the
//! compiler forces you to write.
//!
//! Both builders are order-independent: validation is purely local per
//! entry, and names are lowercased before they become registry keys so rule
//! declarations can reference them case-insensitively.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::Arc;

use crate::core::error::{EntryKind, Error, Result};
use crate::core::rule::{Firewall, FirewallType, Source, SourceType};
use crate::firewalls::hetzner::HetznerFirewall;
use crate::firewalls::ufw::UfwFirewall;
use crate::sources::cloudflare::CloudflareSource;

/// One entry under `configuration.sources` or `configuration.destinations`.
///
/// Only `type` is inspected here; everything else in the property bag is
/// opaque to the registry and passed verbatim to the matched constructor.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntryDeclaration {
    /// The backend tag selecting a constructor. Optional so its absence is
    /// reported as a missing-type error rather than a parse failure.
    #[serde(rename = "type")]
    pub type_tag: Option<String>,

    /// Backend-specific properties (credentials, ids, endpoint overrides)
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Named source instances keyed by lowercased configuration name
pub type SourceRegistry = BTreeMap<String, Arc<dyn Source>>;

/// Named firewall instances keyed by lowercased configuration name
pub type FirewallRegistry = BTreeMap<String, Arc<dyn Firewall>>;

/// Builds one [`Source`] instance per configured entry.
///
/// Fails on the first entry with a missing or unrecognized `type`, or whose
/// constructor rejects its property bag; the underlying construction error
/// is wrapped with the entry name for traceability.
pub fn build_sources(entries: &BTreeMap<String, EntryDeclaration>) -> Result<SourceRegistry> {
    let mut sources: SourceRegistry = BTreeMap::new();

    for (declared_name, entry) in entries {
        let name = declared_name.to_lowercase();

        let tag = entry.type_tag.as_deref().ok_or_else(|| Error::MissingType {
            kind: EntryKind::Source,
            name: name.clone(),
        })?;

        let source_type =
            SourceType::from_str(&tag.to_lowercase()).map_err(|_| Error::UnknownType {
                kind: EntryKind::Source,
                value: tag.to_string(),
            })?;

        let source: Arc<dyn Source> = match source_type {
            SourceType::Cloudflare => {
                let backend = CloudflareSource::from_config(&entry.extra).map_err(|e| {
                    Error::Construction {
                        kind: EntryKind::Source,
                        name: name.clone(),
                        source: Box::new(e),
                    }
                })?;
                Arc::new(backend)
            }
        };

        sources.insert(name, source);
    }

    Ok(sources)
}

/// Builds one [`Firewall`] instance per configured destination entry.
///
/// Identical contract to [`build_sources`], applied to the firewall-type
/// dispatch table.
pub fn build_firewalls(entries: &BTreeMap<String, EntryDeclaration>) -> Result<FirewallRegistry> {
    let mut firewalls: FirewallRegistry = BTreeMap::new();

    for (declared_name, entry) in entries {
        let name = declared_name.to_lowercase();

        let tag = entry.type_tag.as_deref().ok_or_else(|| Error::MissingType {
            kind: EntryKind::Firewall,
            name: name.clone(),
        })?;

        let firewall_type =
            FirewallType::from_str(&tag.to_lowercase()).map_err(|_| Error::UnknownType {
                kind: EntryKind::Firewall,
                value: tag.to_string(),
            })?;

        let firewall: Arc<dyn Firewall> = match firewall_type {
            FirewallType::Hetzner => {
                let backend = HetznerFirewall::from_config(&entry.extra)
                    .map_err(|e| wrap_firewall_construction(&name, e))?;
                Arc::new(backend)
            }
            FirewallType::Ufw => {
                let backend = UfwFirewall::from_config(&entry.extra)
                    .map_err(|e| wrap_firewall_construction(&name, e))?;
                Arc::new(backend)
            }
        };

        firewalls.insert(name, firewall);
    }

    Ok(firewalls)
}

fn wrap_firewall_construction(name: &str, source: Error) -> Error {
    Error::Construction {
        kind: EntryKind::Firewall,
        name: name.to_string(),
        source: Box::new(source),
    }
}
