use std::fmt;
use thiserror::Error;

/// Which half of the `configuration` section an entry error refers to.
///
/// Only affects error rendering: source entries are reported as `source
/// <name>`, destination entries as `firewall <name>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// An entry under `configuration.sources`
    Source,
    /// An entry under `configuration.destinations`
    Firewall,
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntryKind::Source => write!(f, "source"),
            EntryKind::Firewall => write!(f, "firewall"),
        }
    }
}

/// Core error types for unfw
///
/// Every variant carries enough context (entry name or rule index) to locate
/// the offending configuration line without a stack trace. All errors are
/// fail-fast: the first one encountered terminates the whole compilation.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Rule set document failed to parse as the expected structure
    #[error("JSON error: {0}")]
    Malformed(#[from] serde_json::Error),

    /// A source or destination entry lacks a `type` field
    #[error("{kind} {name}: missing type")]
    MissingType { kind: EntryKind, name: String },

    /// A `type` value is not in the closed dispatch table
    #[error("{kind} {value}: unknown type")]
    UnknownType { kind: EntryKind, value: String },

    /// The matched constructor itself failed (credentials, connectivity)
    #[error("{kind} {name}: {source}")]
    Construction {
        kind: EntryKind,
        name: String,
        #[source]
        source: Box<Error>,
    },

    /// A rule names a destination not present in the firewall registry
    #[error("rule index {index}: destination not configured")]
    DestinationNotConfigured { index: usize },

    /// A rule names a source not present in the source registry
    #[error("rule index {index}: source not configured")]
    SourceNotConfigured { index: usize },

    /// A rule's action string matches no known action
    #[error("rule index {index}: action {value} invalid")]
    InvalidAction { index: usize, value: String },

    /// A backend property bag lacks a required value
    #[error("missing configuration value: {0}")]
    MissingValue(&'static str),

    /// A backend property bag value has the wrong shape
    #[error("invalid configuration value: {0}")]
    InvalidValue(&'static str),

    /// HTTP request to a backend failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// A published IP list entry failed to parse as an address or network
    #[error("address parse error: {0}")]
    Addr(#[from] ipnetwork::IpNetworkError),

    /// A rule cannot be expressed by the target firewall backend
    #[error("unsupported rule: {0}")]
    UnsupportedRule(String),

    /// ufw command execution failed
    #[error("ufw error: {message}")]
    Ufw {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    /// A firewall backend rejected a rule during the apply stage
    #[error("firewall {name}: {source}")]
    Backend {
        name: String,
        #[source]
        source: Box<Error>,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
