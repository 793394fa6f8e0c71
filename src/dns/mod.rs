//! Target host resolution and address caching
//!
//! Two layers: a [`NameLookup`] performs the actual query (system resolver in
//! production, a fixed table in tests) and a [`Resolver`] decides how long an
//! answer is reused. Both caching policies live in [`cache`].

pub mod cache;

use crate::{
    defaults::DNS_CACHE_TTL,
    error::{AppError, Result},
    types::DnsStrategy,
};
use async_trait::async_trait;
use std::{net::IpAddr, sync::Arc, time::Duration};
use trust_dns_resolver::{
    config::{ResolverConfig, ResolverOpts},
    system_conf, TokioAsyncResolver,
};

pub use cache::{OneShotResolver, RefreshingResolver};

/// Raw name lookup without any caching policy
#[async_trait]
pub trait NameLookup: Send + Sync {
    /// Resolve a host name to its addresses
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>>;
}

/// Address source for the connection provider
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Addresses currently believed valid for `host`. Never returns an empty set.
    async fn candidates(&self, host: &str) -> Result<Vec<IpAddr>>;

    /// Caching policy implemented by this resolver
    fn strategy(&self) -> DnsStrategy;
}

/// Lookup backed by the operating system's resolver configuration
pub struct SystemLookup {
    resolver: TokioAsyncResolver,
}

impl SystemLookup {
    /// Build from `/etc/resolv.conf` (or the platform equivalent).
    ///
    /// Falls back to the library's default upstream servers when the system
    /// configuration cannot be read.
    pub fn new() -> Self {
        let (config, opts) = system_conf::read_system_conf()
            .unwrap_or_else(|_| (ResolverConfig::default(), ResolverOpts::default()));

        Self {
            resolver: TokioAsyncResolver::tokio(config, opts),
        }
    }

    /// Whether the system configuration is readable
    pub fn system_config_available() -> bool {
        system_conf::read_system_conf().is_ok()
    }
}

impl Default for SystemLookup {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NameLookup for SystemLookup {
    async fn lookup(&self, host: &str) -> Result<Vec<IpAddr>> {
        let response = self
            .resolver
            .lookup_ip(host)
            .await
            .map_err(|e| AppError::dns_resolution(format!("DNS lookup failed for {}: {}", host, e)))?;

        Ok(response.iter().collect())
    }
}

/// Parse a host that is already an address, including bracketed IPv6
pub fn ip_literal(host: &str) -> Option<IpAddr> {
    host.trim_start_matches('[')
        .trim_end_matches(']')
        .parse::<IpAddr>()
        .ok()
}

/// Build the resolver for the configured strategy
pub fn create_resolver(strategy: DnsStrategy, lookup: Arc<dyn NameLookup>) -> Arc<dyn Resolver> {
    create_resolver_with_ttl(strategy, lookup, DNS_CACHE_TTL)
}

/// Build the resolver for the configured strategy with an explicit refresh TTL
pub fn create_resolver_with_ttl(
    strategy: DnsStrategy,
    lookup: Arc<dyn NameLookup>,
    ttl: Duration,
) -> Arc<dyn Resolver> {
    match strategy {
        DnsStrategy::Once => Arc::new(OneShotResolver::new(lookup)),
        DnsStrategy::Refresh => Arc::new(RefreshingResolver::new(lookup, ttl)),
    }
}
