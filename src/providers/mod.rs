pub mod codewords;
pub mod dust;
pub mod gemini;
pub mod github;

use reqwest::Client;

use crate::config::HttpConfig;
use crate::error::{Result, SurgeonError};

/// Build the HTTP client shared by one provider.
///
/// Every outbound call gets an explicit deadline; nothing waits on the
/// transport default.
pub(crate) fn build_http_client(http: &HttpConfig) -> Result<Client> {
    Client::builder()
        .user_agent(concat!("repo-surgeon/", env!("CARGO_PKG_VERSION")))
        .timeout(http.timeout())
        .connect_timeout(http.connect_timeout())
        .build()
        .map_err(|e| SurgeonError::Config(format!("Failed to create HTTP client: {e}")))
}

/// Join a base URL and a path without doubling or dropping the slash.
pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Response body for error messages, never failing.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "Unable to read error response".to_string())
}
