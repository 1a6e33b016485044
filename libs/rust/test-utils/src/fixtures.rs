//! Test fixtures with sample data.

/// TTL the edge adapter requests on every check: seven days.
pub const EDGE_AUTH_DURATION_SECS: i64 = 7 * 24 * 60 * 60;

/// Whitelisted login/registration endpoints plus a health probe.
#[must_use]
pub fn sample_whitelist() -> Vec<String> {
    vec![
        "/user.v1.UserService/Login".to_string(),
        "/user.v1.UserService/Register".to_string(),
        "/healthz".to_string(),
    ]
}

/// An identifier that is never in [`sample_whitelist`].
pub const PROTECTED_METHOD: &str = "/user.v1.UserService/GetProfile";
