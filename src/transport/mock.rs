use async_trait::async_trait;
use crate::error::{SimError, SimResult};
use crate::transport::interface::{Transport, VehicleReport};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// Recording transport for tests
///
/// Every delivery attempt is numbered from 0; attempts listed with
/// [`MockTransport::fail_attempts`] return a transport failure instead of
/// being recorded.
pub struct MockTransport {
    name: String,
    delivered: Arc<Mutex<Vec<(String, VehicleReport)>>>,
    failing: HashSet<usize>,
    attempts: usize,
}

impl MockTransport {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            delivered: Arc::new(Mutex::new(Vec::new())),
            failing: HashSet::new(),
            attempts: 0,
        }
    }

    pub fn fail_attempts(mut self, attempts: &[usize]) -> Self {
        self.failing = attempts.iter().copied().collect();
        self
    }

    /// Shared view of delivered reports, usable after the transport is boxed
    pub fn delivered(&self) -> Arc<Mutex<Vec<(String, VehicleReport)>>> {
        self.delivered.clone()
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        &self.name
    }

    async fn send(&mut self, destination: &str, reports: &[VehicleReport]) -> SimResult<()> {
        let attempt = self.attempts;
        self.attempts += 1;

        if self.failing.contains(&attempt) {
            return Err(SimError::transport(format!("injected failure on attempt {attempt}")));
        }

        let mut delivered = self.delivered.lock().unwrap();
        for report in reports {
            delivered.push((destination.to_string(), report.clone()));
        }
        Ok(())
    }
}
