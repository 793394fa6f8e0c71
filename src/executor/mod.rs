//! Measurement loop
//!
//! One unmeasured warm-up request, then `count` requests spaced by the
//! configured interval. Each attempt either records its time to first byte
//! or counts as an error; the run never aborts on a per-sample failure.
//! The only fatal path is a target URL that cannot be turned into a request,
//! in which case the count lines are still emitted before the error returns.

use crate::{
    client::{ConnectionProvider, HttpClient, NetworkClient},
    dns::{create_resolver, NameLookup},
    error::{AppError, Result},
    logging::ProbeLogger,
    models::ProbeConfig,
    output::MetricsEmitter,
    stats::{duration_to_ms, LatencySummary, SampleSet},
    types::RunPhase,
};
use reqwest::{Method, Request, Url};
use std::{io::Write, sync::Arc};

/// Drives one probe run against the configured target
pub struct ProbeExecutor {
    config: ProbeConfig,
    client: Arc<dyn HttpClient>,
    logger: ProbeLogger,
    phase: RunPhase,
}

impl ProbeExecutor {
    pub fn new(config: ProbeConfig, client: Arc<dyn HttpClient>, logger: ProbeLogger) -> Self {
        Self {
            config,
            client,
            logger,
            phase: RunPhase::Idle,
        }
    }

    /// Wire the production stack: lookup, caching resolver, connection provider, reqwest client
    pub fn with_lookup(config: ProbeConfig, lookup: Arc<dyn NameLookup>, logger: ProbeLogger) -> Result<Self> {
        let resolver = create_resolver(config.dns_strategy, lookup);
        let provider = ConnectionProvider::new(resolver, config.timeout());
        let client = NetworkClient::new(provider, &config)?;
        Ok(Self::new(config, Arc::new(client), logger))
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    fn advance(&mut self, phase: RunPhase) {
        self.phase = phase;
        self.logger.phase(phase);
    }

    /// Build a GET request for the target URL.
    ///
    /// Fails for unparseable URLs, schemes other than http/https and URLs
    /// without a host.
    pub fn build_request(&self) -> Result<Request> {
        let url = Url::parse(self.config.url.trim())?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(AppError::parse(format!(
                    "Unsupported URL scheme '{}' (expected http or https)",
                    scheme
                )))
            }
        }

        if url.host_str().map_or(true, str::is_empty) {
            return Err(AppError::parse(format!("URL has no host: {}", self.config.url)));
        }

        Ok(Request::new(Method::GET, url))
    }

    /// Execute the run and emit its metrics.
    ///
    /// Returns the emitted summary. An `Err` means either the request could
    /// not be built (count lines already emitted) or the metrics could not be
    /// written.
    pub async fn run<W: Write>(&mut self, emitter: &mut MetricsEmitter<W>) -> Result<LatencySummary> {
        let count = self.config.count;

        let warm_up = match self.build_request() {
            Ok(request) => request,
            Err(error) => {
                self.logger.aborted(&self.config.url, &error);
                emitter.emit(&LatencySummary::aborted(count))?;
                self.advance(RunPhase::Done);
                return Err(error);
            }
        };
        let host = warm_up.url().host_str().unwrap_or_default().to_string();

        self.advance(RunPhase::WarmUp);
        let result = self.client.time_to_first_byte(warm_up).await;
        self.logger.warm_up(&host, &result);

        self.advance(RunPhase::Measuring);
        let interval = self.config.interval();
        let mut samples = SampleSet::with_capacity(count as usize);

        for attempt in 1..=count {
            tokio::time::sleep(interval).await;

            let outcome = match self.build_request() {
                Ok(request) => self.client.time_to_first_byte(request).await,
                Err(error) => Err(error),
            };

            match outcome {
                Ok(elapsed) => {
                    samples.record_success(elapsed);
                    self.logger.attempt_succeeded(attempt, &host, duration_to_ms(elapsed));
                }
                Err(error) => {
                    samples.record_error();
                    self.logger.attempt_failed(attempt, &host, &error);
                }
            }
        }

        self.advance(RunPhase::Aggregating);
        let summary = samples.summarize();
        emitter.emit(&summary)?;
        self.logger.summary(&summary);

        self.advance(RunPhase::Done);
        Ok(summary)
    }
}
