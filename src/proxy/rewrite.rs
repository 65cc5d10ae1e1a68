//! Outbound request rewriting.
//!
//! # Responsibilities
//! - Purify the query string down to the parameters we intend to forward
//! - Swap the caller's credentials for the cluster user's
//! - Point the URL at the selected host
//! - Stamp the identity trail into the User-Agent

use std::net::SocketAddr;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use http::header::{AUTHORIZATION, USER_AGENT};
use http::uri::{Authority, PathAndQuery, Scheme, Uri};
use http::{HeaderValue, Request};
use thiserror::Error;
use url::form_urlencoded;

use crate::proxy::scope::Scope;

/// Socket addresses of the accepted connection. The listener inserts this
/// into the request extensions; when absent, "unknown" is reported.
#[derive(Debug, Clone, Copy)]
pub struct ConnInfo {
    pub remote: SocketAddr,
    pub local: Option<SocketAddr>,
}

/// Failures assembling the rewritten URI or headers. Unreachable for
/// well-formed host addresses, but the http types are fallible.
#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("invalid rewritten uri component: {0}")]
    UriComponent(#[from] http::uri::InvalidUri),

    #[error("invalid rewritten uri: {0}")]
    Uri(#[from] http::uri::InvalidUriParts),

    #[error("invalid rewritten header value: {0}")]
    Header(#[from] http::header::InvalidHeaderValue),
}

impl Scope {
    /// Rewrite `req` in place for dispatch to the selected host.
    ///
    /// The outbound query string carries exactly `query_id` (this scope's
    /// id, which `cancel` later targets) plus the inbound `query` parameter
    /// when one was sent; every other inbound parameter is dropped. The
    /// Authorization header is replaced with the cluster user's Basic
    /// credentials, the URL's scheme and authority are pointed at the
    /// selected host (path preserved), and the body is left untouched.
    ///
    /// The User-Agent prefix concatenates on every call; decorate a
    /// request once per scope.
    pub fn decorate<B>(&self, req: &mut Request<B>) -> Result<(), RewriteError> {
        // fresh parameter map to purify the URL
        let mut params = form_urlencoded::Serializer::new(String::new());
        params.append_pair("query_id", &self.id().to_string());
        if let Some(raw) = req.uri().query() {
            if let Some((_, query)) =
                form_urlencoded::parse(raw.as_bytes()).find(|(key, _)| key == "query")
            {
                params.append_pair("query", &query);
            }
        }
        let query = params.finish();

        let addr = self.host().addr();
        let mut parts = req.uri().clone().into_parts();
        parts.scheme = Some(match addr.scheme() {
            "https" => Scheme::HTTPS,
            _ => Scheme::HTTP,
        });
        parts.authority = Some(Authority::try_from(self.host().name().as_str())?);
        let path = req.uri().path();
        parts.path_and_query = Some(PathAndQuery::try_from(
            format!("{path}?{query}").as_str(),
        )?);
        *req.uri_mut() = Uri::from_parts(parts)?;

        // rewrite any previous auth; the backend sees the cluster user
        let basic = BASE64.encode(format!(
            "{}:{}",
            self.cluster_user().name,
            self.cluster_user().password
        ));
        req.headers_mut()
            .insert(AUTHORIZATION, HeaderValue::from_str(&format!("Basic {basic}"))?);

        // identity trail for the backend's query log
        let conn = req.extensions().get::<ConnInfo>().copied();
        let remote = conn
            .map(|c| c.remote.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let local = conn
            .and_then(|c| c.local)
            .map(|a| a.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let original_ua = req
            .headers()
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let ua = format!(
            "RemoteAddr: {remote}; LocalAddr: {local}; CHProxy-User: {}; CHProxy-ClusterUser: {}; {original_ua}",
            self.user().name,
            self.cluster_user().name,
        );
        req.headers_mut()
            .insert(USER_AGENT, HeaderValue::from_str(&ua)?);

        tracing::debug!(scope_id = self.id(), uri = %req.uri(), "request decorated");
        Ok(())
    }
}
