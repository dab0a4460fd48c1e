//! URL helpers for building API endpoints from configurable base URLs.

/// Strip trailing slashes from a base URL.
///
/// ```
/// use act_companion::utils::url::normalize_base_url;
///
/// assert_eq!(
///     normalize_base_url("https://docs.googleapis.com/v1///"),
///     "https://docs.googleapis.com/v1"
/// );
/// ```
pub fn normalize_base_url(base_url: &str) -> String {
    base_url.trim_end_matches('/').to_string()
}

/// Join a base URL and an endpoint path with exactly one slash.
///
/// ```
/// use act_companion::utils::url::construct_api_url;
///
/// assert_eq!(
///     construct_api_url("https://docs.googleapis.com/v1/", "/documents/abc"),
///     "https://docs.googleapis.com/v1/documents/abc"
/// );
/// ```
pub fn construct_api_url(base_url: &str, endpoint: &str) -> String {
    let normalized_base = normalize_base_url(base_url);
    let endpoint = endpoint.trim_start_matches('/');
    format!("{normalized_base}/{endpoint}")
}
