//! HTTP implementation of [`ComplianceClient`].

use std::time::Duration;

use anyhow::{Context, Result};
use futures::StreamExt;
use reqwest::{Client, Response, Url};
use tokio::sync::oneshot;
use tracing::{debug, info};

use super::{ClientError, ComplianceClient, RetrieveConfig, Retrieval, RunStatus};
use crate::archive::pipe::{self, PipeWriter};
use crate::config::ServerConfig;

/// Talks to a compliance service over HTTP.
///
/// `GET {endpoint}/namespaces/{ns}/status` returns the run status as JSON,
/// `GET {endpoint}/namespaces/{ns}/results` streams the results tarball.
#[derive(Debug, Clone)]
pub struct HttpComplianceClient {
    client: Client,
    endpoint: Url,
}

impl HttpComplianceClient {
    pub fn new(settings: &ServerConfig) -> Result<Self> {
        let endpoint = Url::parse(&settings.endpoint)
            .map_err(|_| ClientError::InvalidEndpoint(settings.endpoint.clone()))?;
        if endpoint.cannot_be_a_base() {
            return Err(ClientError::InvalidEndpoint(settings.endpoint.clone()).into());
        }

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(settings.connect_timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client, endpoint })
    }

    fn namespace_url(&self, namespace: &str, leaf: &str) -> Result<Url> {
        let mut url = self.endpoint.clone();
        url.path_segments_mut()
            .map_err(|_| ClientError::InvalidEndpoint(self.endpoint.to_string()))?
            .pop_if_empty()
            .extend(["namespaces", namespace, leaf]);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ComplianceClient for HttpComplianceClient {
    async fn status(&self, namespace: &str) -> Result<RunStatus> {
        let url = self.namespace_url(namespace, "status")?;
        debug!(%url, "fetching compliance status");

        let response = get(&self.client, &url).await?;
        let status = response
            .json::<RunStatus>()
            .await
            .context("failed to decode compliance status")?;

        debug!(status = %status.status, plugins = status.plugins.len(), "compliance status");
        Ok(status)
    }

    fn retrieve_results(&self, config: &RetrieveConfig) -> Retrieval {
        let (reader, writer) = pipe::pipe(pipe::DEFAULT_CAPACITY);
        let (err_tx, err_rx) = oneshot::channel();
        let client = self.client.clone();
        let url = self.namespace_url(&config.namespace, "results");

        tokio::spawn(async move {
            let result = match url {
                Ok(url) => download(&client, &url, &writer).await,
                Err(err) => Err(err),
            };
            // Report before closing the pipe so the failure is visible
            // before the consumer sees a truncated stream.
            if let Err(err) = result {
                let _ = err_tx.send(err);
            }
            drop(writer);
        });

        Retrieval {
            reader,
            errors: err_rx,
        }
    }
}

async fn get(client: &Client, url: &Url) -> Result<Response> {
    let response = client
        .get(url.clone())
        .send()
        .await
        .with_context(|| format!("request to {url} failed"))?;

    let status = response.status();
    if !status.is_success() {
        return Err(ClientError::UnexpectedStatus {
            url: url.to_string(),
            status,
        }
        .into());
    }
    Ok(response)
}

async fn download(client: &Client, url: &Url, writer: &PipeWriter) -> Result<()> {
    info!(%url, "downloading compliance results");
    let response = get(client, url).await?;

    let mut stream = response.bytes_stream();
    let mut total = 0u64;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk.context("failed to read compliance results stream")?;
        total += chunk.len() as u64;
        if writer.send(chunk).await.is_err() {
            // The consumer stopped reading and reports its own error.
            debug!(bytes = total, "results reader closed before download finished");
            return Ok(());
        }
    }

    debug!(bytes = total, "compliance results downloaded");
    Ok(())
}
