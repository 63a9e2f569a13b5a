//! Remote-service telemetry source
//!
//! Adapts a request/response client (for example a SOME/IP service proxy)
//! to the [`TelemetrySource`] contract. The client is constructed by the
//! caller and owned by the source; there is no process-wide instance.

use super::TelemetrySource;
use crate::core::Result;
use tracing::warn;

/// Connection to a service that answers telemetry requests
pub trait TelemetryClient: Send {
    fn init(&mut self) -> Result<()>;

    fn connect(&mut self) -> Result<()>;

    fn disconnect(&mut self) {}

    fn is_connected(&self) -> bool;

    /// Ask the service for one reading. An empty reply means no reading.
    fn request_telemetry(&mut self) -> Result<String>;
}

pub struct ProxySource<C: TelemetryClient> {
    client: C,
    name: String,
}

impl<C: TelemetryClient> ProxySource<C> {
    pub fn new(client: C) -> Self {
        Self::with_name(client, "proxy")
    }

    pub fn with_name(client: C, name: impl Into<String>) -> Self {
        Self {
            client,
            name: name.into(),
        }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }
}

impl<C: TelemetryClient> TelemetrySource for ProxySource<C> {
    fn open(&mut self) -> Result<()> {
        self.client.init()?;
        self.client.connect()
    }

    fn read(&mut self) -> Option<String> {
        if !self.client.is_connected() {
            return None;
        }
        match self.client.request_telemetry() {
            Ok(reply) => Some(reply),
            Err(e) => {
                warn!(source = %self.name, error = %e, "telemetry request failed");
                Some(String::new())
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<C: TelemetryClient> Drop for ProxySource<C> {
    fn drop(&mut self) {
        self.client.disconnect();
    }
}
