//! Rule set document parsing and the file-loading pipeline
//!
//! A rule set document is a single JSON file:
//!
//! ```json
//! {
//!   "configuration": {
//!     "sources":      { "cloudflare": { "type": "cloudflare" } },
//!     "destinations": { "edge": { "type": "hetzner", "token": "...", "firewall_id": 42 } }
//!   },
//!   "rules": [
//!     { "action": "allow", "source": "cloudflare", "destination": "edge", "port": 443 }
//!   ]
//! }
//! ```
//!
//! Entry names are matched case-insensitively; per-entry fields beyond
//! `type` are backend property bags passed verbatim to the matched
//! constructor.

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::core::compiler::{self, CompiledRuleSet, RuleDeclaration};
use crate::core::error::Result;
use crate::core::registry::{self, EntryDeclaration};

/// The top-level document shape
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RuleSetDocument {
    /// Named source and destination declarations
    #[serde(default)]
    pub configuration: ConfigurationSection,
    /// Rule declarations, in application order
    #[serde(default)]
    pub rules: Vec<RuleDeclaration>,
}

/// The `configuration` section: the names rules may reference
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigurationSection {
    #[serde(default)]
    pub sources: BTreeMap<String, EntryDeclaration>,
    #[serde(default)]
    pub destinations: BTreeMap<String, EntryDeclaration>,
}

/// Parses a rule set document from a JSON string.
///
/// Structural failures surface as [`Error::Malformed`](crate::Error::Malformed)
/// with serde's own message; reference and enum validation happens later, in
/// the registries and the compiler.
pub fn load_from_str(json: &str) -> Result<RuleSetDocument> {
    Ok(serde_json::from_str(json)?)
}

/// Compiles an already-parsed document into a grouped rule set.
///
/// Builds the source and firewall registries (independent, either may fail
/// first) and then resolves every rule declaration against them.
pub fn compile_document(document: &RuleSetDocument) -> Result<CompiledRuleSet> {
    let sources = registry::build_sources(&document.configuration.sources)?;
    let firewalls = registry::build_firewalls(&document.configuration.destinations)?;
    compiler::compile(&document.rules, &sources, &firewalls)
}

/// Reads the given JSON file and returns the compiled rule set, grouped by
/// the destination firewall that must apply it.
pub fn load_rules_from_file(path: impl AsRef<Path>) -> Result<CompiledRuleSet> {
    let contents = std::fs::read_to_string(path)?;
    let document = load_from_str(&contents)?;
    compile_document(&document)
}
