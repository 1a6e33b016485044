//! Authorization step evaluated after the token is confirmed live.
//!
//! Token liveness answers "who is calling"; a policy answers "may they do
//! this". The edge ships only [`PermitAll`]. A deployment that needs role or
//! permission checks supplies its own [`AccessPolicy`], and a denial from it
//! is the only path to a 403.

use async_trait::async_trait;
use std::collections::HashMap;

/// Attributes of the request under evaluation. The token is not included.
#[derive(Debug, Clone, Copy)]
pub struct RequestContext<'a> {
    /// Request path
    pub path: &'a str,
    /// HTTP method, empty when the proxy did not send one
    pub method: &'a str,
    /// Request headers as forwarded by the proxy
    pub headers: &'a HashMap<String, String>,
}

/// Decides whether an authenticated request may proceed.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    /// `true` to allow, `false` to answer 403.
    async fn permits(&self, request: &RequestContext<'_>) -> bool;

    /// Name for logs.
    fn name(&self) -> &'static str;
}

/// Allows every authenticated request.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermitAll;

#[async_trait]
impl AccessPolicy for PermitAll {
    async fn permits(&self, _request: &RequestContext<'_>) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "permit-all"
    }
}
