//! Registry of known peer nodes.
//!
//! Peers are tracked by their canonical network location, a bare
//! `host:port`. Address strings arrive in whatever form an operator typed
//! them (with or without a scheme, sometimes with a path) and are reduced to
//! that location before insertion, so registration is idempotent across
//! spellings.

use crate::error::{ChainError, Result};
use std::collections::HashSet;
use url::Url;

#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    nodes: HashSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Canonicalize and insert one address. Registering the same resolved
    /// location twice leaves the set unchanged.
    pub fn register(&mut self, address: &str) -> Result<String> {
        let location = canonical_location(address)?;
        self.nodes.insert(location.clone());
        Ok(location)
    }

    /// Register a batch atomically: every address is canonicalized before the
    /// first insertion, so a bad entry rejects the whole batch with no
    /// mutation.
    pub fn register_many(&mut self, addresses: &[String]) -> Result<Vec<String>> {
        let locations = addresses
            .iter()
            .map(|address| canonical_location(address))
            .collect::<Result<Vec<_>>>()?;
        for location in &locations {
            self.nodes.insert(location.clone());
        }
        Ok(locations)
    }

    /// Snapshot of the peer set, sorted for stable output.
    pub fn members(&self) -> Vec<String> {
        let mut members: Vec<String> = self.nodes.iter().cloned().collect();
        members.sort();
        members
    }

    pub fn contains(&self, location: &str) -> bool {
        self.nodes.contains(location)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

/// Reduce an address string to its `host:port` network location, discarding
/// scheme and path. Bare `host:port` input is accepted as-is; a host without
/// an explicit port stays portless.
pub fn canonical_location(address: &str) -> Result<String> {
    let trimmed = address.trim();
    if trimmed.is_empty() {
        return Err(ChainError::InvalidPeerAddress("empty address".to_string()));
    }

    let parsed = match Url::parse(trimmed) {
        Ok(url) if url.has_host() => url,
        _ if trimmed.contains("://") => {
            return Err(ChainError::InvalidPeerAddress(trimmed.to_string()));
        }
        // Bare "host:port" parses as scheme + path, so retry with a scheme
        // prepended.
        _ => Url::parse(&format!("http://{trimmed}"))
            .map_err(|e| ChainError::InvalidPeerAddress(format!("{trimmed}: {e}")))?,
    };

    let host = parsed
        .host_str()
        .ok_or_else(|| ChainError::InvalidPeerAddress(format!("{trimmed}: no host")))?;

    Ok(match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}
