//! URL helpers for joining the API base with endpoint paths.

/// Strip surrounding whitespace and trailing slashes from a base URL.
///
/// ```
/// use datachat::utils::url::normalize_base_url;
///
/// assert_eq!(normalize_base_url("http://localhost:8000/"), "http://localhost:8000");
/// assert_eq!(normalize_base_url(" https://api.example.com//"), "https://api.example.com");
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// An empty base produces a root-relative path.
///
/// ```
/// use datachat::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("http://localhost:8000/", "/modules/chat-with-data/analyze"),
///     "http://localhost:8000/modules/chat-with-data/analyze"
/// );
/// assert_eq!(construct_api_url("", "modules/x"), "/modules/x");
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}

/// Returns the override only when it carries a non-blank value.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_base_url() {
        assert_eq!(
            normalize_base_url("https://api.example.com/v1"),
            "https://api.example.com/v1"
        );
        assert_eq!(
            normalize_base_url("https://api.example.com/v1///"),
            "https://api.example.com/v1"
        );
        assert_eq!(normalize_base_url("  "), "");
        assert_eq!(normalize_base_url("///"), "");
    }

    #[test]
    fn test_construct_api_url() {
        assert_eq!(
            construct_api_url("https://api.example.com", "modules/chat-with-data/analyze"),
            "https://api.example.com/modules/chat-with-data/analyze"
        );
        assert_eq!(
            construct_api_url("https://api.example.com/base/", "///analyze"),
            "https://api.example.com/base/analyze"
        );
        assert_eq!(construct_api_url("/", "analyze"), "/analyze");
    }

    #[test]
    fn blank_values_are_treated_as_absent() {
        assert_eq!(non_blank(None), None);
        assert_eq!(non_blank(Some("   ")), None);
        assert_eq!(non_blank(Some(" http://x ")), Some("http://x"));
    }
}
