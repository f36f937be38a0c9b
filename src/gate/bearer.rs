use http::header::AUTHORIZATION;
use http::HeaderMap;

/// Extract the credential of an `Authorization: Bearer <token>` header.
///
/// The scheme is matched case-insensitively. Other schemes, non-ASCII
/// header values and empty credentials all count as no token.
pub fn extract_bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, credential) = value.trim_start().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let credential = credential.trim();
    (!credential.is_empty()).then_some(credential)
}
