//! Auth Edge Service - proxy-facing authorization adapter.
//!
//! A reverse proxy calls `Check` once per inbound request. Whitelisted paths
//! pass untouched; everything else must carry a live Bearer token, confirmed
//! against the session service. Any doubt resolves to 401.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod adapter;
pub mod authority;
pub mod config;
pub mod decision;
pub mod error;
pub mod grpc;
pub mod observability;
pub mod policy;

// Include generated protobuf code
/// Generated protobuf code.
#[allow(missing_docs)]
pub mod proto {
    pub mod envoy {
        pub mod service {
            pub mod auth {
                pub mod v3 {
                    tonic::include_proto!("envoy.service.auth.v3");
                }
            }
        }
    }
}

pub use adapter::EdgeAuthorizer;
pub use authority::{LocalSessionAuthority, RemoteSessionAuthority, SessionAuthority};
pub use config::Config;
pub use decision::AuthorizationDecision;
pub use error::{EdgeError, ErrorCode};
pub use policy::{AccessPolicy, PermitAll, RequestContext};
