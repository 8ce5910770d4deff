//! Purge orchestration
//!
//! Turns a [`PurgeRequest`] into a sequence of vendor exchanges: one for a
//! full purge, or one per batch-limit chunk for a URL purge. Chunks run
//! strictly in order. The first chunk that still fails after the retry
//! policy is exhausted stops the run.

use futures::future::join_all;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn, Instrument};

use crate::config::{GatewaySettings, HttpSettings, RetryConfig};
use crate::domain::{ProviderConfig, PurgeRequest, PurgeResult, PurgeScope};
use crate::errors::Result;
use crate::observability::{ChunkOutcome, MetricsRecorder};
use crate::providers::{chunk_urls, CdnClient, ProviderClient};

/// Executes purges against whichever provider a config names
#[derive(Debug, Clone, Default)]
pub struct PurgeOrchestrator {
    http: HttpSettings,
    retry: RetryConfig,
    metrics: MetricsRecorder,
}

impl PurgeOrchestrator {
    pub fn new(http: HttpSettings, retry: RetryConfig) -> Self {
        Self { http, retry, metrics: MetricsRecorder::new() }
    }

    pub fn from_settings(settings: &GatewaySettings) -> Self {
        Self::new(settings.http.clone(), settings.retry.clone())
    }

    pub fn retry_config(&self) -> &RetryConfig {
        &self.retry
    }

    /// Purge with a fresh client built from `config`.
    ///
    /// Never returns an error: every failure is reported inside the result.
    pub async fn purge(&self, config: &ProviderConfig, request: &PurgeRequest) -> PurgeResult {
        self.purge_with_cancel(config, request, &CancellationToken::new()).await
    }

    /// Like [`purge`](Self::purge), checking `cancel` before every chunk.
    pub async fn purge_with_cancel(
        &self,
        config: &ProviderConfig,
        request: &PurgeRequest,
        cancel: &CancellationToken,
    ) -> PurgeResult {
        match CdnClient::from_config(config, &self.http) {
            Ok(client) => self.purge_with_client(&client, request, cancel).await,
            Err(error) => {
                warn!(provider = %config.kind, error = %error, "could not build provider client");
                PurgeResult::rejected(config.kind, &error)
            }
        }
    }

    /// Run the chunk loop against an already constructed client
    pub async fn purge_with_client(
        &self,
        client: &dyn ProviderClient,
        request: &PurgeRequest,
        cancel: &CancellationToken,
    ) -> PurgeResult {
        let provider = client.kind();
        let scope = request.scope_label();
        let span = crate::purge_span!(provider, scope);

        async {
            let started = Instant::now();
            self.metrics.record_purge(provider, scope);

            let result = self.run(client, request, cancel).await;
            let result = result.with_duration_ms(started.elapsed().as_millis() as u64);
            self.metrics.record_purge_result(&result);

            match result.error() {
                None => info!(
                    success = result.success(),
                    chunks = result.chunks_attempted(),
                    cancelled = result.was_cancelled(),
                    duration_ms = result.duration_ms(),
                    "purge finished"
                ),
                Some(failure) => warn!(
                    chunks = result.chunks_attempted(),
                    failed = result.chunks_failed(),
                    kind = %failure.kind,
                    error = %failure.message,
                    "purge failed"
                ),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run(
        &self,
        client: &dyn ProviderClient,
        request: &PurgeRequest,
        cancel: &CancellationToken,
    ) -> PurgeResult {
        let provider = client.kind();

        let checked = match &request.scope {
            PurgeScope::Full => client.check_full_purge_config(),
            PurgeScope::Urls(_) => client.check_purge_config(),
        };
        if let Err(error) = checked {
            return PurgeResult::rejected(provider, &error);
        }
        if let Err(error) = request.validate() {
            return PurgeResult::rejected(provider, &error);
        }

        let chunks: Vec<Option<&[String]>> = match &request.scope {
            PurgeScope::Full => vec![None],
            PurgeScope::Urls(urls) => chunk_urls(urls, client.batch_limit()).map(Some).collect(),
        };

        let mut attempted: u32 = 0;
        for chunk in chunks {
            if cancel.is_cancelled() {
                info!(chunks = attempted, "purge cancelled between chunks");
                return PurgeResult::cancelled(provider, attempted);
            }

            attempted += 1;
            match self.run_chunk(client, chunk, cancel).await {
                Ok(()) => self.metrics.record_chunk(provider, ChunkOutcome::Success),
                Err(error) => {
                    self.metrics.record_chunk(provider, ChunkOutcome::Failure);
                    warn!(chunk = attempted, error = %error, "purge chunk failed, aborting run");
                    return PurgeResult::failed(provider, attempted, &error);
                }
            }
        }

        PurgeResult::completed(provider, attempted)
    }

    /// One chunk with the retry policy applied; retries are not new chunks.
    async fn run_chunk(
        &self,
        client: &dyn ProviderClient,
        chunk: Option<&[String]>,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let mut retries = 0;
        loop {
            let outcome = match chunk {
                None => client.purge_all().await,
                Some(urls) => client.purge_batch(urls).await,
            };
            let error = match outcome {
                Ok(()) => return Ok(()),
                Err(error) => error,
            };
            if !error.is_retryable() || retries >= self.retry.max_retries {
                return Err(error);
            }

            retries += 1;
            let backoff = self.retry.backoff_for(retries, error.retry_after());
            self.metrics.record_chunk(client.kind(), ChunkOutcome::Retry);
            warn!(
                attempt = retries,
                max_retries = self.retry.max_retries,
                backoff_ms = backoff.as_millis() as u64,
                error = %error,
                "retryable purge failure, backing off"
            );

            tokio::select! {
                _ = cancel.cancelled() => return Err(error),
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }

    /// Purge several providers concurrently, one independent client each.
    /// Results come back in input order.
    pub async fn purge_many(
        &self,
        configs: &[ProviderConfig],
        request: &PurgeRequest,
    ) -> Vec<PurgeResult> {
        join_all(configs.iter().map(|config| self.purge(config, request))).await
    }

    /// Confirm the credentials in `config` with one read-only vendor request
    pub async fn validate(&self, config: &ProviderConfig) -> Result<()> {
        let client = CdnClient::from_config(config, &self.http)?;
        let span = crate::provider_span!(config.kind, "validate_credentials");
        client.validate_credentials().instrument(span).await
    }
}
