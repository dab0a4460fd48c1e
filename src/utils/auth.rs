//! Authentication headers for outbound API requests.

/// Header carrying the model API key.
pub const API_KEY_HEADER: &str = "x-goog-api-key";

/// Attach the model API key to a request.
pub fn add_auth_headers(request: reqwest::RequestBuilder, api_key: &str) -> reqwest::RequestBuilder {
    request.header(API_KEY_HEADER, api_key)
}

/// Attach an OAuth2 access token to a request.
pub fn add_bearer_auth(request: reqwest::RequestBuilder, token: &str) -> reqwest::RequestBuilder {
    request.header("Authorization", format!("Bearer {token}"))
}
