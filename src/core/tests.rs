//! Core registry and compiler tests
//!
//! Backend construction here never touches the network: building a
//! Cloudflare or ufw instance is pure, and the Hetzner entries carry dummy
//! credentials that are only validated, never used.

use proptest::prelude::*;
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::config;
use crate::core::compiler::{self, RuleDeclaration};
use crate::core::error::Error;
use crate::core::registry::{self, EntryDeclaration};
use crate::core::rule::{Action, FirewallType, SourceType};

fn entry(json: serde_json::Value) -> EntryDeclaration {
    serde_json::from_value(json).unwrap()
}

fn entries(pairs: &[(&str, serde_json::Value)]) -> BTreeMap<String, EntryDeclaration> {
    pairs
        .iter()
        .map(|(name, value)| ((*name).to_string(), entry(value.clone())))
        .collect()
}

fn hetzner_entry() -> serde_json::Value {
    serde_json::json!({ "type": "hetzner", "token": "secret", "firewall_id": 42 })
}

fn declaration(destination: &str, source: &str, action: &str) -> RuleDeclaration {
    RuleDeclaration {
        action: action.to_string(),
        source: source.to_string(),
        destination: destination.to_string(),
        ..RuleDeclaration::default()
    }
}

#[test]
fn test_source_registry_keeps_every_recognized_entry() {
    let sources = registry::build_sources(&entries(&[
        ("Edge", serde_json::json!({ "type": "cloudflare" })),
        ("cdn", serde_json::json!({ "type": "Cloudflare" })),
    ]))
    .unwrap();

    assert_eq!(sources.len(), 2);
    assert!(sources.contains_key("edge"));
    assert!(sources.contains_key("cdn"));
    assert_eq!(sources["edge"].source_type(), SourceType::Cloudflare);
}

#[test]
fn test_source_missing_type_names_the_entry() {
    let err =
        registry::build_sources(&entries(&[("Office", serde_json::json!({ "a": "b" }))]))
            .unwrap_err();

    assert_eq!(err.to_string(), "source office: missing type");
}

#[test]
fn test_source_unknown_type_names_the_value() {
    let err = registry::build_sources(&entries(&[(
        "office",
        serde_json::json!({ "type": "fastly" }),
    )]))
    .unwrap_err();

    assert_eq!(err.to_string(), "source fastly: unknown type");
}

#[test]
fn test_firewall_registry_builds_every_backend() {
    let firewalls = registry::build_firewalls(&entries(&[
        ("Cloud", hetzner_entry()),
        ("local", serde_json::json!({ "type": "ufw" })),
    ]))
    .unwrap();

    assert_eq!(firewalls.len(), 2);
    assert_eq!(firewalls["cloud"].firewall_type(), FirewallType::Hetzner);
    assert_eq!(firewalls["local"].firewall_type(), FirewallType::Ufw);
}

#[test]
fn test_firewall_missing_type_names_the_entry() {
    let err =
        registry::build_firewalls(&entries(&[("edge", serde_json::json!({}))])).unwrap_err();

    assert_eq!(err.to_string(), "firewall edge: missing type");
}

#[test]
fn test_firewall_unknown_type_names_the_value() {
    let err = registry::build_firewalls(&entries(&[(
        "edge",
        serde_json::json!({ "type": "iptables" }),
    )]))
    .unwrap_err();

    assert_eq!(err.to_string(), "firewall iptables: unknown type");
}

#[test]
fn test_construction_failure_is_wrapped_with_the_entry_name() {
    let err = registry::build_firewalls(&entries(&[(
        "Cloud",
        serde_json::json!({ "type": "hetzner" }),
    )]))
    .unwrap_err();

    match &err {
        Error::Construction { name, source, .. } => {
            assert_eq!(name, "cloud");
            assert!(matches!(**source, Error::MissingValue("token")));
        }
        other => panic!("expected construction error, got: {other}"),
    }
    assert_eq!(
        err.to_string(),
        "firewall cloud: missing configuration value: token"
    );
}

#[test]
fn test_unconfigured_destination_aborts_with_the_rule_index() {
    let sources = registry::build_sources(&BTreeMap::new()).unwrap();
    let firewalls = registry::build_firewalls(&BTreeMap::new()).unwrap();

    let err = compiler::compile(
        &[declaration("unknown", "cdn", "allow")],
        &sources,
        &firewalls,
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "rule index 0: destination not configured");
}

#[test]
fn test_unconfigured_source_aborts_with_the_rule_index() {
    let sources = registry::build_sources(&BTreeMap::new()).unwrap();
    let firewalls =
        registry::build_firewalls(&entries(&[("edge", serde_json::json!({ "type": "ufw" }))]))
            .unwrap();

    let err = compiler::compile(
        &[
            declaration("edge", "", ""),
            declaration("edge", "unknown", "allow"),
        ],
        &sources,
        &firewalls,
    )
    .unwrap_err();

    // fail-fast: the first bad declaration wins
    assert_eq!(err.to_string(), "rule index 0: source not configured");
}

#[test]
fn test_invalid_action_aborts_even_when_references_resolve() {
    let sources = registry::build_sources(&entries(&[(
        "cdn",
        serde_json::json!({ "type": "cloudflare" }),
    )]))
    .unwrap();
    let firewalls =
        registry::build_firewalls(&entries(&[("edge", serde_json::json!({ "type": "ufw" }))]))
            .unwrap();

    let err = compiler::compile(
        &[declaration("edge", "cdn", "permit")],
        &sources,
        &firewalls,
    )
    .unwrap_err();

    assert_eq!(err.to_string(), "rule index 0: action permit invalid");
}

#[test]
fn test_action_matching_is_case_insensitive() {
    let sources = registry::build_sources(&entries(&[(
        "cdn",
        serde_json::json!({ "type": "cloudflare" }),
    )]))
    .unwrap();
    let firewalls =
        registry::build_firewalls(&entries(&[("edge", serde_json::json!({ "type": "ufw" }))]))
            .unwrap();

    let compiled = compiler::compile(
        &[
            declaration("edge", "cdn", "ALLOW"),
            declaration("edge", "cdn", "Deny"),
        ],
        &sources,
        &firewalls,
    )
    .unwrap();

    let rules = &compiled.get("edge").unwrap().rules;
    assert_eq!(rules[0].action, Action::Allow);
    assert_eq!(rules[1].action, Action::Deny);
}

#[test]
fn test_name_resolution_is_case_insensitive() {
    let sources = registry::build_sources(&entries(&[(
        "CDN",
        serde_json::json!({ "type": "cloudflare" }),
    )]))
    .unwrap();
    let firewalls =
        registry::build_firewalls(&entries(&[("Edge", serde_json::json!({ "type": "ufw" }))]))
            .unwrap();

    let compiled = compiler::compile(
        &[declaration("EDGE", "Cdn", "allow")],
        &sources,
        &firewalls,
    )
    .unwrap();

    assert_eq!(compiled.len(), 1);
    assert!(compiled.get("edge").is_some());
}

#[test]
fn test_declaration_order_is_preserved_per_destination() {
    let sources = registry::build_sources(&entries(&[(
        "cdn",
        serde_json::json!({ "type": "cloudflare" }),
    )]))
    .unwrap();
    let firewalls = registry::build_firewalls(&entries(&[
        ("a", serde_json::json!({ "type": "ufw" })),
        ("b", serde_json::json!({ "type": "ufw" })),
    ]))
    .unwrap();

    // a at indices 0, 2, 4 with distinct ports; b interleaved at 1, 3
    let mut declarations = Vec::new();
    for (index, destination) in ["a", "b", "a", "b", "a"].iter().enumerate() {
        let mut decl = declaration(destination, "cdn", "allow");
        decl.port = Some(u16::try_from(1000 + index).unwrap());
        declarations.push(decl);
    }

    let compiled = compiler::compile(&declarations, &sources, &firewalls).unwrap();

    let ports_of = |name: &str| -> Vec<u16> {
        compiled
            .get(name)
            .unwrap()
            .rules
            .iter()
            .map(|r| r.port.unwrap())
            .collect()
    };
    assert_eq!(ports_of("a"), vec![1000, 1002, 1004]);
    assert_eq!(ports_of("b"), vec![1001, 1003]);

    // destinations are listed in order of first mention
    let names: Vec<&str> = compiled.iter().map(|d| d.name.as_str()).collect();
    assert_eq!(names, vec!["a", "b"]);
}

#[test]
fn test_round_trip_single_rule_document() {
    let document = config::load_from_str(
        r#"{
            "configuration": {
                "destinations": {
                    "hetzner": { "type": "hetzner", "token": "secret", "firewall_id": 42 }
                },
                "sources": {
                    "cloudflare": { "type": "cloudflare" }
                }
            },
            "rules": [
                {
                    "destination": "hetzner",
                    "source": "cloudflare",
                    "action": "allow",
                    "port": 8080
                }
            ]
        }"#,
    )
    .unwrap();

    let compiled = config::compile_document(&document).unwrap();

    assert_eq!(compiled.len(), 1);
    let destination = compiled.get("hetzner").unwrap();
    assert_eq!(destination.firewall.firewall_type(), FirewallType::Hetzner);
    assert_eq!(destination.rules.len(), 1);

    let rule = &destination.rules[0];
    assert_eq!(rule.action, Action::Allow);
    assert_eq!(rule.source.source_type(), SourceType::Cloudflare);
    assert_eq!(rule.port, Some(8080));
    assert!(rule.ports.is_empty());
    assert!(rule.port_range.is_none());
    assert!(rule.interfaces.is_empty());
}

#[test]
fn test_empty_document_compiles_to_empty_rule_set() {
    let document = config::load_from_str("{}").unwrap();
    let compiled = config::compile_document(&document).unwrap();
    assert!(compiled.is_empty());
}

#[test]
fn test_capability_debug_renders_the_backend_tag() {
    let sources = registry::build_sources(&entries(&[(
        "cdn",
        serde_json::json!({ "type": "cloudflare" }),
    )]))
    .unwrap();
    let firewalls =
        registry::build_firewalls(&entries(&[("edge", serde_json::json!({ "type": "ufw" }))]))
            .unwrap();

    assert_eq!(format!("{:?}", sources["cdn"]), "Source(cloudflare)");
    assert_eq!(format!("{:?}", firewalls["edge"]), "Firewall(ufw)");

    // compiled sets are debuggable end to end, trait objects included
    let compiled = compiler::compile(
        &[declaration("edge", "cdn", "allow")],
        &sources,
        &firewalls,
    )
    .unwrap();
    let debugged = format!("{compiled:?}");
    assert!(debugged.contains("edge"));
    assert!(debugged.contains("Firewall(ufw)"));
    assert!(debugged.contains("Source(cloudflare)"));
}

#[test]
fn test_tags_round_trip_through_strum() {
    assert_eq!(Action::from_str("allow").unwrap(), Action::Allow);
    assert_eq!(Action::Deny.to_string(), "deny");
    assert_eq!(
        SourceType::from_str("cloudflare").unwrap(),
        SourceType::Cloudflare
    );
    assert_eq!(FirewallType::Ufw.as_ref(), "ufw");
    assert!(Action::from_str("reject").is_err());
}

proptest! {
    /// Registry keys are always the lowercased entry names, whatever casing
    /// the document used, and no case-distinct entry is dropped.
    #[test]
    fn prop_source_keys_are_lowercased(
        names in proptest::collection::btree_set("[a-zA-Z][a-zA-Z0-9_-]{0,15}", 1..8)
    ) {
        let lowered: std::collections::BTreeSet<String> =
            names.iter().map(|n| n.to_lowercase()).collect();

        let input: BTreeMap<String, EntryDeclaration> = names
            .iter()
            .map(|name| (name.clone(), entry(serde_json::json!({ "type": "cloudflare" }))))
            .collect();

        let sources = registry::build_sources(&input).unwrap();

        prop_assert_eq!(sources.len(), lowered.len());
        for key in sources.keys() {
            prop_assert_eq!(key.clone(), key.to_lowercase());
            prop_assert!(lowered.contains(key));
        }
    }
}
