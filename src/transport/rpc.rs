use async_trait::async_trait;
use chrono::Utc;
use crate::error::{SimError, SimResult};
use crate::transport::interface::{Transport, VehicleReport};
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Seconds a node may hold a message before discarding it
const MESSAGE_TTL_SECS: i64 = 60;

/// Longest slice of an error body echoed into a failure message
const MAX_ERROR_BODY: usize = 240;

#[derive(Debug, Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'static str,
    params: MessageParams<'a>,
}

#[derive(Debug, Serialize)]
struct MessageParams<'a> {
    service_name: &'a str,
    /// Absolute Unix time after which the node drops the message
    timeout: i64,
    parameters: &'a [VehicleReport],
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    error: Option<serde_json::Value>,
}

/// Sends reports to a telemetry node as JSON-RPC `message` calls over HTTP
pub struct JsonRpcTransport {
    url: Url,
    client: reqwest::Client,
    /// Id of the last request sent; the first request uses 1
    transaction_id: u64,
}

impl JsonRpcTransport {
    pub fn new(url: Url, timeout: Duration) -> SimResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            url,
            client,
            transaction_id: 0,
        })
    }

    fn next_request<'a>(
        &mut self,
        destination: &'a str,
        reports: &'a [VehicleReport],
        now: i64,
    ) -> RpcRequest<'a> {
        self.transaction_id += 1;
        RpcRequest {
            jsonrpc: "2.0",
            id: self.transaction_id,
            method: "message",
            params: MessageParams {
                service_name: destination,
                timeout: now + MESSAGE_TTL_SECS,
                parameters: reports,
            },
        }
    }
}

#[async_trait]
impl Transport for JsonRpcTransport {
    fn name(&self) -> &str {
        self.url.as_str()
    }

    async fn send(&mut self, destination: &str, reports: &[VehicleReport]) -> SimResult<()> {
        let request = self.next_request(destination, reports, Utc::now().timestamp());
        let id = request.id;

        let response = self.client.post(self.url.clone()).json(&request).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let body: String = body.trim().chars().take(MAX_ERROR_BODY).collect();
            return Err(SimError::transport(format!(
                "transaction {id}: HTTP status {status} ({body})"
            )));
        }

        // Bodies that are not JSON-RPC responses are accepted as-is
        if let Ok(RpcResponse { error: Some(error) }) = serde_json::from_str::<RpcResponse>(&body) {
            return Err(SimError::transport(format!("transaction {id}: {error}")));
        }

        debug!("Transaction {} delivered to {}", id, destination);
        Ok(())
    }
}
