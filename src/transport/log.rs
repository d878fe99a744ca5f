use async_trait::async_trait;
use crate::error::{SimError, SimResult};
use crate::transport::interface::{Transport, VehicleReport};
use tracing::info;

/// Transport that only logs what it would have sent
pub struct LogTransport {
    name: String,
}

impl LogTransport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
        }
    }
}

#[async_trait]
impl Transport for LogTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, destination: &str, reports: &[VehicleReport]) -> SimResult<()> {
        let body = serde_json::to_string(reports).map_err(|e| SimError::transport(e.to_string()))?;
        info!("Sending to {}: {}", destination, body);
        Ok(())
    }
}
