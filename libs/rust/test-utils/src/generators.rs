//! Shared proptest generators.

use proptest::prelude::*;

/// Generate opaque access tokens of the shape issued at login.
pub fn token_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "[A-Za-z0-9_-]{16,64}",
        "[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}",
    ]
}

/// Generate TTLs in seconds, up to one week.
pub fn duration_secs_strategy() -> impl Strategy<Value = i64> {
    1i64..=604_800
}

/// Generate full gRPC method names such as `/user.v1.UserService/Login`.
pub fn rpc_method_strategy() -> impl Strategy<Value = String> {
    ("[a-z]{3,10}", "[A-Z][a-z]{3,10}", "[A-Z][A-Za-z]{2,15}")
        .prop_map(|(pkg, svc, method)| format!("/{pkg}.v1.{svc}Service/{method}"))
}

/// Generate HTTP request paths.
pub fn http_path_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec("[a-z0-9_-]{1,12}", 1..5)
        .prop_map(|segments| format!("/{}", segments.join("/")))
}

/// Generate request identifiers of either kind.
pub fn identifier_strategy() -> impl Strategy<Value = String> {
    prop_oneof![rpc_method_strategy(), http_path_strategy()]
}

/// Generate `authorization` values of at most 7 bytes.
pub fn short_header_strategy() -> impl Strategy<Value = String> {
    "[ -~]{0,7}"
}

/// Generate `authorization` values that do not start with `Bearer `.
pub fn non_bearer_header_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        "Basic [A-Za-z0-9+/=]{8,40}",
        "Token [A-Za-z0-9]{8,40}",
        "Bearer[A-Za-z0-9]{8,40}",
        "[A-Za-z0-9]{8,40}",
    ]
}

/// Generate the `Bearer` scheme in arbitrary ASCII case.
pub fn bearer_scheme_case_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(any::<bool>(), 6).prop_map(|upper| {
        "bearer"
            .chars()
            .zip(upper)
            .map(|(c, up)| if up { c.to_ascii_uppercase() } else { c })
            .collect()
    })
}

/// Build a well-formed `authorization` value for `token`.
#[must_use]
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}
