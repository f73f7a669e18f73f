//! IP source backends
//!
//! Each backend implements [`Source`](crate::core::rule::Source) and is
//! constructed by the source registry from its configuration property bag.

pub mod cloudflare;
