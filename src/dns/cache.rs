//! Caching policies for resolved target addresses

use super::{ip_literal, NameLookup, Resolver};
use crate::{
    error::{AppError, Result},
    types::DnsStrategy,
};
use async_trait::async_trait;
use std::{collections::HashMap, net::IpAddr, sync::Arc, time::Duration};
use tokio::{sync::RwLock, time::Instant};

/// Query the lookup and reject empty answers
async fn resolve_non_empty(lookup: &dyn NameLookup, host: &str) -> Result<Vec<IpAddr>> {
    let addresses = lookup.lookup(host).await?;
    if addresses.is_empty() {
        return Err(AppError::dns_resolution(format!("No addresses found for {}", host)));
    }
    Ok(addresses)
}

/// Resolves each host once and keeps the answer for the process lifetime
pub struct OneShotResolver {
    lookup: Arc<dyn NameLookup>,
    cache: RwLock<HashMap<String, Vec<IpAddr>>>,
}

impl OneShotResolver {
    pub fn new(lookup: Arc<dyn NameLookup>) -> Self {
        Self {
            lookup,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Cached answer for `host`, if any
    pub async fn cached(&self, host: &str) -> Option<Vec<IpAddr>> {
        self.cache.read().await.get(host).cloned()
    }
}

#[async_trait]
impl Resolver for OneShotResolver {
    async fn candidates(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Some(ip) = ip_literal(host) {
            return Ok(vec![ip]);
        }

        if let Some(addresses) = self.cached(host).await {
            return Ok(addresses);
        }

        let addresses = resolve_non_empty(self.lookup.as_ref(), host).await?;
        self.cache
            .write()
            .await
            .insert(host.to_string(), addresses.clone());
        Ok(addresses)
    }

    fn strategy(&self) -> DnsStrategy {
        DnsStrategy::Once
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    addresses: Vec<IpAddr>,
    fetched_at: Instant,
    refreshing: bool,
}

type SharedCache = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Keeps answers for a positive TTL.
///
/// A stale entry is still served immediately while one background task
/// re-resolves it. A failed refresh keeps the stale answer until the next
/// attempt.
pub struct RefreshingResolver {
    lookup: Arc<dyn NameLookup>,
    ttl: Duration,
    cache: SharedCache,
}

impl RefreshingResolver {
    pub fn new(lookup: Arc<dyn NameLookup>, ttl: Duration) -> Self {
        Self {
            lookup,
            ttl,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Mark a stale entry as refreshing and spawn the refresh, unless one is already running
    async fn schedule_refresh(&self, host: &str) {
        {
            let mut cache = self.cache.write().await;
            match cache.get_mut(host) {
                Some(entry) if !entry.refreshing => entry.refreshing = true,
                _ => return,
            }
        }

        let lookup = Arc::clone(&self.lookup);
        let cache = Arc::clone(&self.cache);
        let host = host.to_string();

        tokio::spawn(async move {
            let result = resolve_non_empty(lookup.as_ref(), &host).await;
            let mut cache = cache.write().await;
            match result {
                Ok(addresses) => {
                    cache.insert(
                        host,
                        CacheEntry {
                            addresses,
                            fetched_at: Instant::now(),
                            refreshing: false,
                        },
                    );
                }
                Err(_) => {
                    if let Some(entry) = cache.get_mut(&host) {
                        entry.refreshing = false;
                    }
                }
            }
        });
    }
}

#[async_trait]
impl Resolver for RefreshingResolver {
    async fn candidates(&self, host: &str) -> Result<Vec<IpAddr>> {
        if let Some(ip) = ip_literal(host) {
            return Ok(vec![ip]);
        }

        let cached = self.cache.read().await.get(host).cloned();
        if let Some(entry) = cached {
            if entry.fetched_at.elapsed() >= self.ttl {
                self.schedule_refresh(host).await;
            }
            return Ok(entry.addresses);
        }

        let addresses = resolve_non_empty(self.lookup.as_ref(), host).await?;
        self.cache.write().await.insert(
            host.to_string(),
            CacheEntry {
                addresses: addresses.clone(),
                fetched_at: Instant::now(),
                refreshing: false,
            },
        );
        Ok(addresses)
    }

    fn strategy(&self) -> DnsStrategy {
        DnsStrategy::Refresh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::test_support::StaticLookup;

    fn ip(s: &str) -> IpAddr {
        s.parse().unwrap()
    }

    #[tokio::test]
    async fn test_one_shot_resolves_once() {
        let lookup = Arc::new(StaticLookup::new().with_host("probe.test", &["10.0.0.1", "10.0.0.2"]));
        let resolver = OneShotResolver::new(lookup.clone());

        let first = resolver.candidates("probe.test").await.unwrap();
        lookup.set("probe.test", &["10.9.9.9"]);
        let second = resolver.candidates("probe.test").await.unwrap();

        assert_eq!(first, vec![ip("10.0.0.1"), ip("10.0.0.2")]);
        assert_eq!(second, first);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_one_shot_does_not_cache_failures() {
        let lookup = Arc::new(StaticLookup::new());
        let resolver = OneShotResolver::new(lookup.clone());

        let err = resolver.candidates("missing.test").await.unwrap_err();
        assert!(matches!(err, AppError::DnsResolution(_)));

        lookup.set("missing.test", &["10.0.0.3"]);
        assert_eq!(resolver.candidates("missing.test").await.unwrap(), vec![ip("10.0.0.3")]);
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn test_empty_answer_is_an_error() {
        let lookup = Arc::new(StaticLookup::new().with_host("empty.test", &[]));
        let resolver = OneShotResolver::new(lookup.clone());

        let err = resolver.candidates("empty.test").await.unwrap_err();
        assert!(matches!(err, AppError::DnsResolution(_)));
        assert!(resolver.cached("empty.test").await.is_none());

        let refreshing = RefreshingResolver::new(lookup, Duration::from_secs(600));
        assert!(refreshing.candidates("empty.test").await.is_err());
    }

    #[tokio::test]
    async fn test_ip_literals_bypass_lookup() {
        let lookup = Arc::new(StaticLookup::new());
        let once = OneShotResolver::new(lookup.clone());
        let refresh = RefreshingResolver::new(lookup.clone(), Duration::from_secs(600));

        assert_eq!(once.candidates("127.0.0.1").await.unwrap(), vec![ip("127.0.0.1")]);
        assert_eq!(refresh.candidates("[::1]").await.unwrap(), vec![ip("::1")]);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn test_hosts_are_cached_separately() {
        let lookup = Arc::new(
            StaticLookup::new()
                .with_host("a.test", &["10.0.0.1"])
                .with_host("b.test", &["10.0.0.2"]),
        );
        let resolver = OneShotResolver::new(lookup.clone());

        assert_eq!(resolver.candidates("a.test").await.unwrap(), vec![ip("10.0.0.1")]);
        assert_eq!(resolver.candidates("b.test").await.unwrap(), vec![ip("10.0.0.2")]);
        assert_eq!(resolver.candidates("a.test").await.unwrap(), vec![ip("10.0.0.1")]);
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn test_refreshing_serves_fresh_entries_from_cache() {
        let lookup = Arc::new(StaticLookup::new().with_host("probe.test", &["10.0.0.1"]));
        let resolver = RefreshingResolver::new(lookup.clone(), Duration::from_secs(600));

        for _ in 0..5 {
            assert_eq!(resolver.candidates("probe.test").await.unwrap(), vec![ip("10.0.0.1")]);
        }
        assert_eq!(lookup.calls(), 1);
        assert_eq!(resolver.ttl(), Duration::from_secs(600));
    }

    #[tokio::test]
    async fn test_refreshing_serves_stale_then_updates() {
        let lookup = Arc::new(StaticLookup::new().with_host("probe.test", &["10.0.0.1"]));
        let resolver = RefreshingResolver::new(lookup.clone(), Duration::from_millis(50));

        assert_eq!(resolver.candidates("probe.test").await.unwrap(), vec![ip("10.0.0.1")]);

        lookup.set("probe.test", &["10.0.0.2"]);
        tokio::time::sleep(Duration::from_millis(80)).await;

        // Stale answer comes back synchronously, refresh runs in the background
        assert_eq!(resolver.candidates("probe.test").await.unwrap(), vec![ip("10.0.0.1")]);

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(resolver.candidates("probe.test").await.unwrap(), vec![ip("10.0.0.2")]);
        assert_eq!(lookup.calls(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_stale_entry() {
        let lookup = Arc::new(StaticLookup::new().with_host("probe.test", &["10.0.0.1"]));
        let resolver = RefreshingResolver::new(lookup.clone(), Duration::from_millis(30));

        resolver.candidates("probe.test").await.unwrap();
        lookup.set("probe.test", &[]);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(resolver.candidates("probe.test").await.unwrap(), vec![ip("10.0.0.1")]);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(resolver.candidates("probe.test").await.unwrap(), vec![ip("10.0.0.1")]);
    }
}
