//! Liveness probes for backend nodes.

use std::future::Future;
use std::time::Duration;

use url::Url;

/// Whatever a probe implementation fails with; only success or failure
/// matters to the heartbeat loop.
pub type ProbeError = Box<dyn std::error::Error + Send + Sync>;

/// Backend liveness probe. Success means the host is considered live.
pub trait HealthProbe: Send + Sync + 'static {
    fn check(&self, addr: &Url) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// HTTP GET probe with a dedicated client and a per-check timeout.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            timeout,
        }
    }
}

impl Default for HttpProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(3))
    }
}

impl HealthProbe for HttpProbe {
    async fn check(&self, addr: &Url) -> Result<(), ProbeError> {
        let response = self
            .client
            .get(addr.clone())
            .timeout(self.timeout)
            .send()
            .await?;
        response.error_for_status()?;
        Ok(())
    }
}
