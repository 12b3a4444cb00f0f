use subtle::ConstantTimeEq;

/// Header carrying the admin API key for locale sync.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Constant-time string comparison for secrets
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check a presented admin key against the configured one.
/// An empty configured key never matches.
pub fn verify_api_key(provided: Option<&str>, expected: &str) -> bool {
    match provided {
        Some(key) if !expected.is_empty() => constant_time_compare(key.trim(), expected),
        _ => false,
    }
}

/// Extract the token from an `Authorization: Bearer <token>` value.
pub fn bearer_token(authorization: &str) -> Option<&str> {
    let (scheme, token) = authorization.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_compare() {
        assert!(constant_time_compare("secret123", "secret123"));
        assert!(!constant_time_compare("secret123", "secret124"));
        assert!(!constant_time_compare("secret123", "secret12"));
    }

    #[test]
    fn test_verify_api_key() {
        assert!(verify_api_key(Some("admin-key"), "admin-key"));
        assert!(!verify_api_key(Some("wrong"), "admin-key"));
        assert!(!verify_api_key(None, "admin-key"));
        assert!(!verify_api_key(Some(""), ""));
    }

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer  abc"), Some("abc"));
        assert_eq!(bearer_token("Basic abc"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("abc"), None);
    }
}
