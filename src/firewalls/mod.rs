//! Firewall backends
//!
//! Each backend implements [`Firewall`](crate::core::rule::Firewall) and is
//! constructed by the firewall registry from its configuration property bag.

pub mod hetzner;
pub mod ufw;
