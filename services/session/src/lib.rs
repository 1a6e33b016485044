//! Session Service library.
//!
//! A TTL-based liveness cache for opaque access tokens. Tokens are issued
//! elsewhere; this service only records that a token is live, slides its
//! expiration on every successful check and forgets it at logout. A static
//! whitelist names the request identifiers that skip token checks entirely.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod grpc;
pub mod metrics;
pub mod service;
pub mod storage;
pub mod validation;
pub mod whitelist;

/// Generated protobuf code.
#[allow(missing_docs)]
pub mod proto {
    pub mod auth {
        pub mod v1 {
            tonic::include_proto!("auth.v1");
        }
    }
}

pub use config::Config;
pub use error::SessionError;
pub use service::AuthDecisionService;
pub use storage::{MemoryBackend, RedisBackend, SessionBackend, TokenStore, Validation};
pub use whitelist::WhitelistMatcher;
