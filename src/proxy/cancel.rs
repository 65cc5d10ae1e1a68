//! Remote cancellation of queries that outlive their deadline.

use std::sync::LazyLock;
use std::time::Duration;

use thiserror::Error;

use crate::proxy::scope::Scope;

/// Ceiling on one cancellation round-trip, connect to last body byte.
const KILL_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an error response body is kept for the error message.
const RESPONSE_SNIPPET_LIMIT: usize = 1024;

/// Shared client for cancellation calls.
static KILL_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(reqwest::Client::new);

#[derive(Debug, Error)]
pub enum CancelError {
    #[error("error while executing query \"{query}\" at \"{addr}\": {source}")]
    Transport {
        query: String,
        addr: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(
        "unexpected status code returned from query \"{query}\" at \"{addr}\": {status}. \
         Response body: \"{body}\""
    )]
    UnexpectedStatus {
        query: String,
        addr: String,
        status: u16,
        body: String,
    },
}

impl Scope {
    /// Ask the backend to stop the query dispatched under this scope's id.
    ///
    /// Succeeds immediately when the cluster has no kill-query credentials
    /// configured. Advisory either way: the counters are untouched; the
    /// normal completion path releases them whether or not the backend
    /// honors the kill.
    pub async fn cancel(&self) -> Result<(), CancelError> {
        let Some(kill_user) = self.cluster().kill_query_user() else {
            return Ok(());
        };

        let query = format!("KILL QUERY WHERE query_id = '{}'", self.id());
        tracing::debug!(scope_id = self.id(), %query, "execution deadline exceeded, cancelling remotely");

        let addr = self.host().addr().clone();
        let response = KILL_CLIENT
            .post(addr.clone())
            .basic_auth(&kill_user.name, Some(&kill_user.password))
            .timeout(KILL_QUERY_TIMEOUT)
            .body(query.clone())
            .send()
            .await
            .map_err(|source| CancelError::Transport {
                query: query.clone(),
                addr: addr.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = read_snippet(response).await;
            return Err(CancelError::UnexpectedStatus {
                query,
                addr: addr.to_string(),
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(scope_id = self.id(), "query successfully killed");
        Ok(())
    }
}

/// Read at most RESPONSE_SNIPPET_LIMIT bytes of the response body.
async fn read_snippet(mut response: reqwest::Response) -> String {
    let mut buf: Vec<u8> = Vec::new();
    while let Ok(Some(chunk)) = response.chunk().await {
        let room = RESPONSE_SNIPPET_LIMIT - buf.len();
        buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
        if buf.len() >= RESPONSE_SNIPPET_LIMIT {
            break;
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}
