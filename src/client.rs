//! HTTP client, connection provider and time-to-first-byte measurement


use crate::{
    dns::Resolver,
    error::{AppError, Result},
    models::ProbeConfig,
};
use async_trait::async_trait;
use rand::{seq::SliceRandom, Rng};
use reqwest::{
    dns::{Addrs, Name, Resolve, Resolving},
    header::{HeaderMap, HeaderValue, CONNECTION},
    Client, Request, Url,
};
use std::{
    net::{IpAddr, SocketAddr},
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::time::timeout;

/// TCP keep-alive probe interval on dialed sockets
pub const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
/// How long an idle pooled connection is kept
pub const IDLE_CONNECTION_TIMEOUT: Duration = Duration::from_secs(30);
/// Extra dispatch allowance for the TLS handshake on https targets
pub const TLS_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);
/// User agent sent with every probe request
pub const USER_AGENT: &str = concat!("httping-probe/", env!("CARGO_PKG_VERSION"));

/// HTTP client trait for abstraction and testing
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Send the request and return the wall time from dispatch until the
    /// first body byte (or end of an empty body). The rest of the body is
    /// drained and discarded before returning.
    async fn time_to_first_byte(&self, request: Request) -> Result<Duration>;
}

/// Pick one address uniformly at random. Never dials from an empty set.
pub fn choose_address<R: Rng + ?Sized>(candidates: &[IpAddr], rng: &mut R) -> Result<IpAddr> {
    candidates
        .choose(rng)
        .copied()
        .ok_or_else(|| AppError::dns_resolution("No resolved addresses to connect to"))
}

/// Supplies the dial address for every new connection.
///
/// Plugged into reqwest as its DNS resolver: each connection attempt asks the
/// [`Resolver`] for the cached address set and picks one entry at random. The
/// returned socket address carries port 0, which the connector replaces with
/// the port of the request URL.
#[derive(Clone)]
pub struct ConnectionProvider {
    resolver: Arc<dyn Resolver>,
    lookup_timeout: Duration,
}

impl ConnectionProvider {
    pub fn new(resolver: Arc<dyn Resolver>, lookup_timeout: Duration) -> Self {
        Self {
            resolver,
            lookup_timeout,
        }
    }

    /// Resolve `host` (bounded by the lookup timeout) and pick one address
    pub async fn select_address(&self, host: &str) -> Result<IpAddr> {
        let candidates = timeout(self.lookup_timeout, self.resolver.candidates(host))
            .await
            .map_err(|_| {
                AppError::timeout(format!(
                    "DNS resolution for {} exceeded {}ms",
                    host,
                    self.lookup_timeout.as_millis()
                ))
            })??;

        let mut rng = rand::thread_rng();
        choose_address(&candidates, &mut rng)
    }
}

impl Resolve for ConnectionProvider {
    fn resolve(&self, name: Name) -> Resolving {
        let provider = self.clone();
        Box::pin(async move {
            let ip = provider.select_address(name.as_str()).await?;
            let addrs: Addrs = Box::new(std::iter::once(SocketAddr::new(ip, 0)));
            Ok(addrs)
        })
    }
}

/// Map a reqwest error back to the probe's error taxonomy.
///
/// Errors raised by [`ConnectionProvider`] travel through reqwest's source
/// chain and are recovered as-is.
pub fn classify_error(error: reqwest::Error) -> AppError {
    use std::error::Error as _;

    let mut source: Option<&(dyn std::error::Error + 'static)> = error.source();
    while let Some(cause) = source {
        if let Some(app_error) = cause.downcast_ref::<AppError>() {
            return app_error.clone();
        }
        source = cause.source();
    }
    AppError::from(error)
}

/// reqwest-backed probe client
pub struct NetworkClient {
    client: Client,
    timeout: Duration,
    disable_keepalive: bool,
}

impl NetworkClient {
    /// Create a client for the given configuration
    pub fn new(provider: ConnectionProvider, config: &ProbeConfig) -> Result<Self> {
        Self::with_options(provider, config.timeout(), config.disable_keepalive)
    }

    /// Create a client with an explicit timeout and keep-alive setting
    pub fn with_options(
        provider: ConnectionProvider,
        timeout: Duration,
        disable_keepalive: bool,
    ) -> Result<Self> {
        let mut builder = Client::builder()
            .dns_resolver(Arc::new(provider))
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .tcp_keepalive(TCP_KEEPALIVE)
            .pool_idle_timeout(IDLE_CONNECTION_TIMEOUT)
            .redirect(reqwest::redirect::Policy::none())
            .http1_only()
            .user_agent(USER_AGENT);

        if disable_keepalive {
            let mut headers = HeaderMap::new();
            headers.insert(CONNECTION, HeaderValue::from_static("close"));
            builder = builder.pool_max_idle_per_host(0).default_headers(headers);
        }

        let client = builder
            .build()
            .map_err(|e| AppError::network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout,
            disable_keepalive,
        })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn keepalive_disabled(&self) -> bool {
        self.disable_keepalive
    }

    /// Upper bound from dispatch until response headers.
    ///
    /// Every socket read, the response header read included, is already
    /// bounded by the timeout; https targets get the handshake allowance on top.
    pub fn dispatch_budget(&self, url: &Url) -> Duration {
        if url.scheme() == "https" {
            self.timeout + TLS_HANDSHAKE_TIMEOUT
        } else {
            self.timeout
        }
    }

    /// Read and discard the remaining body so the connection can be reused
    async fn drain(&self, mut response: reqwest::Response) {
        let _ = timeout(self.timeout, async {
            while let Ok(Some(_)) = response.chunk().await {}
        })
        .await;
    }
}

#[async_trait]
impl HttpClient for NetworkClient {
    async fn time_to_first_byte(&self, request: Request) -> Result<Duration> {
        let budget = self.dispatch_budget(request.url());

        let start = Instant::now();
        let mut response = timeout(budget, self.client.execute(request))
            .await
            .map_err(|_| AppError::timeout(format!("No response headers within {}ms", budget.as_millis())))?
            .map_err(classify_error)?;

        let first_read = timeout(self.timeout, async {
            loop {
                match response.chunk().await {
                    Ok(Some(chunk)) if chunk.is_empty() => continue,
                    Ok(_) => return Ok(()),
                    Err(e) => return Err(classify_error(e)),
                }
            }
        })
        .await
        .map_err(|_| AppError::timeout(format!("No response body within {}ms", self.timeout.as_millis())))?;
        first_read?;

        let elapsed = start.elapsed();
        self.drain(response).await;
        Ok(elapsed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{create_resolver, test_support::StaticLookup};
    use crate::types::DnsStrategy;
    use rand::{rngs::StdRng, SeedableRng};
    use std::collections::HashSet;

    fn provider_for(host: &str, addresses: &[&str]) -> (Arc<StaticLookup>, ConnectionProvider) {
        let lookup = Arc::new(StaticLookup::new().with_host(host, addresses));
        let resolver = create_resolver(DnsStrategy::Once, lookup.clone());
        (lookup, ConnectionProvider::new(resolver, Duration::from_secs(1)))
    }

    #[test]
    fn test_choose_address_empty_set() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = choose_address(&[], &mut rng).unwrap_err();
        assert!(matches!(err, AppError::DnsResolution(_)));
    }

    #[test]
    fn test_choose_address_single() {
        let mut rng = StdRng::seed_from_u64(7);
        let only: IpAddr = "192.0.2.1".parse().unwrap();
        for _ in 0..10 {
            assert_eq!(choose_address(&[only], &mut rng).unwrap(), only);
        }
    }

    #[test]
    fn test_choose_address_covers_all_candidates() {
        let candidates: Vec<IpAddr> = ["192.0.2.1", "192.0.2.2", "192.0.2.3"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        let mut rng = StdRng::seed_from_u64(42);

        let seen: HashSet<IpAddr> = (0..300)
            .map(|_| choose_address(&candidates, &mut rng).unwrap())
            .collect();

        assert_eq!(seen.len(), candidates.len());
    }

    #[tokio::test]
    async fn test_select_address_uses_cached_set() {
        let (lookup, provider) = provider_for("probe.test", &["192.0.2.1", "192.0.2.2"]);

        for _ in 0..20 {
            let ip = provider.select_address("probe.test").await.unwrap();
            assert!(ip == "192.0.2.1".parse::<IpAddr>().unwrap() || ip == "192.0.2.2".parse::<IpAddr>().unwrap());
        }
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn test_select_address_propagates_resolution_failure() {
        let (_, provider) = provider_for("probe.test", &["192.0.2.1"]);
        let err = provider.select_address("other.test").await.unwrap_err();
        assert!(matches!(err, AppError::DnsResolution(_)));
    }

    #[tokio::test]
    async fn test_dispatch_budget_adds_handshake_for_https() {
        let (_, provider) = provider_for("probe.test", &["192.0.2.1"]);
        let client = NetworkClient::with_options(provider, Duration::from_millis(500), false).unwrap();

        let http = Url::parse("http://probe.test/").unwrap();
        let https = Url::parse("https://probe.test/").unwrap();
        assert_eq!(client.dispatch_budget(&http), Duration::from_millis(500));
        assert_eq!(client.dispatch_budget(&https), Duration::from_millis(500) + TLS_HANDSHAKE_TIMEOUT);
    }

    #[tokio::test]
    async fn test_client_from_config() {
        let (_, provider) = provider_for("probe.test", &["192.0.2.1"]);
        let mut config = ProbeConfig::new("http://probe.test/", "probe");
        config.timeout_ms = 750;
        config.disable_keepalive = true;

        let client = NetworkClient::new(provider, &config).unwrap();
        assert_eq!(client.timeout(), Duration::from_millis(750));
        assert!(client.keepalive_disabled());
    }

    #[test]
    fn test_user_agent_carries_version() {
        assert!(USER_AGENT.starts_with("httping-probe/"));
        assert!(USER_AGENT.ends_with(crate::VERSION));
    }
}
