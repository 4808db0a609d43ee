use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::auth::Token;
use crate::error::SurgeonError;

/// Runtime configuration for repo-surgeon.
///
/// Built once at startup from an optional config file plus environment
/// overrides, validated, and then handed to every client constructor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Repository host used by the ingest stage
    #[serde(default)]
    pub github: GitHubConfig,

    /// Text-generation model used by the review and action stages
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Conversational agent used by the structuring stage
    #[serde(default)]
    pub dust: DustConfig,

    /// Workflow-automation runtime used by the export stage
    #[serde(default)]
    pub codewords: CodeWordsConfig,

    /// Inbound HTTP service settings
    #[serde(default)]
    pub server: ServerConfig,

    /// Outbound HTTP settings shared by all clients
    #[serde(default)]
    pub http: HttpConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GitHubConfig {
    /// Optional personal access token, raises rate limits and unlocks private repos
    pub token: Option<Token>,

    /// GitHub REST API base URL
    #[serde(default = "default_github_api_base_url")]
    pub api_base_url: String,

    /// Raw file content host
    #[serde(default = "default_github_raw_base_url")]
    pub raw_base_url: String,

    /// How much of a repository is read
    #[serde(default)]
    pub limits: SourceLimits,
}

/// Maximum number of files read from one repository.
pub const DEFAULT_MAX_FILES: usize = 25;
/// Per-file character cap.
pub const DEFAULT_MAX_FILE_CHARS: usize = 4_000;
/// Once the combined text exceeds this many characters, fetching stops.
pub const DEFAULT_MAX_TOTAL_CHARS: usize = 120_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct SourceLimits {
    pub max_files: usize,
    pub max_file_chars: usize,
    pub max_total_chars: usize,
}

impl Default for SourceLimits {
    fn default() -> Self {
        Self {
            max_files: DEFAULT_MAX_FILES,
            max_file_chars: DEFAULT_MAX_FILE_CHARS,
            max_total_chars: DEFAULT_MAX_TOTAL_CHARS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct GeminiConfig {
    pub api_key: Option<Token>,

    #[serde(default = "default_gemini_model")]
    pub model: String,

    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DustConfig {
    pub api_key: Option<Token>,

    pub workspace_id: Option<String>,

    /// Agent configuration id mentioned in every conversation
    pub agent_id: Option<String>,

    #[serde(default = "default_dust_base_url")]
    pub base_url: String,

    /// Username reported in the message context
    #[serde(default = "default_dust_username")]
    pub username: String,

    #[serde(default = "default_dust_timezone")]
    pub timezone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CodeWordsConfig {
    /// Missing credentials are not fatal: export degrades to the CSV fallback
    pub api_key: Option<Token>,

    pub service_id: Option<String>,

    #[serde(default = "default_codewords_base_url")]
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ServerConfig {
    /// Socket address the HTTP service binds to
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Extra origins allowed by the CORS policy
    #[serde(default)]
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct HttpConfig {
    /// Deadline for a whole outbound request, in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
}

impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            token: None,
            api_base_url: default_github_api_base_url(),
            raw_base_url: default_github_raw_base_url(),
            limits: SourceLimits::default(),
        }
    }
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

impl Default for DustConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            workspace_id: None,
            agent_id: None,
            base_url: default_dust_base_url(),
            username: default_dust_username(),
            timezone: default_dust_timezone(),
        }
    }
}

impl Default for CodeWordsConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            service_id: None,
            base_url: default_codewords_base_url(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            cors_allowed_origins: Vec::new(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            connect_timeout_secs: default_connect_timeout_secs(),
        }
    }
}

fn default_github_api_base_url() -> String {
    "https://api.github.com".to_string()
}

fn default_github_raw_base_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_gemini_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com".to_string()
}

fn default_dust_base_url() -> String {
    "https://dust.tt".to_string()
}

fn default_dust_username() -> String {
    "repo-surgeon".to_string()
}

fn default_dust_timezone() -> String {
    "Europe/London".to_string()
}

fn default_codewords_base_url() -> String {
    "https://runtime.codewords.ai".to_string()
}

fn default_bind() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_connect_timeout_secs() -> u64 {
    10
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./repo-surgeon.toml
    /// 3. ./repo-surgeon.json
    /// 4. ./repo-surgeon.yaml
    /// 5. ./repo-surgeon.yml
    /// 6. `<config dir>/repo-surgeon/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "repo-surgeon.toml",
            "repo-surgeon.json",
            "repo-surgeon.yaml",
            "repo-surgeon.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        if let Some(path) = user_config_path().filter(|p| p.exists()) {
            return Self::load_from_path(&path);
        }

        Ok(Self::default())
    }

    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Overlay values from the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// Overlay values from an environment lookup. Blank values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(v) = get("GITHUB_TOKEN") {
            self.github.token = Some(Token::from(v));
        }
        if let Some(v) = get("GITHUB_API_BASE_URL") {
            self.github.api_base_url = v;
        }
        if let Some(v) = get("GITHUB_RAW_BASE_URL") {
            self.github.raw_base_url = v;
        }

        if let Some(v) = get("GEMINI_API_KEY") {
            self.gemini.api_key = Some(Token::from(v));
        }
        if let Some(v) = get("GEMINI_MODEL") {
            self.gemini.model = v;
        }
        if let Some(v) = get("GEMINI_API_BASE_URL") {
            self.gemini.base_url = v;
        }

        if let Some(v) = get("DUST_API_KEY") {
            self.dust.api_key = Some(Token::from(v));
        }
        if let Some(v) = get("DUST_WORKSPACE_ID") {
            self.dust.workspace_id = Some(v);
        }
        if let Some(v) = get("DUST_AGENT_ID") {
            self.dust.agent_id = Some(v);
        }
        if let Some(v) = get("DUST_API_BASE_URL") {
            self.dust.base_url = v;
        }

        if let Some(v) = get("CODEWORDS_API_KEY") {
            self.codewords.api_key = Some(Token::from(v));
        }
        if let Some(v) = get("CODEWORDS_SERVICE_ID") {
            self.codewords.service_id = Some(v);
        }
        if let Some(v) = get("CODEWORDS_API_BASE_URL") {
            self.codewords.base_url = v;
        }

        if let Some(v) = get("CORS_ALLOWED_ORIGINS") {
            self.server.cors_allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|origin| !origin.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(v) = get("REPO_SURGEON_BIND") {
            self.server.bind = v;
        }
        if let Some(secs) = get("REPO_SURGEON_HTTP_TIMEOUT_SECS").and_then(|v| v.parse().ok()) {
            self.http.timeout_secs = secs;
        }
    }

    /// Check that everything the pipeline needs is present.
    ///
    /// The CodeWords credentials are deliberately not required here; without
    /// them the export stage produces its CSV fallback.
    pub fn validate(&self) -> crate::error::Result<()> {
        let mut missing = Vec::new();
        if self.gemini.api_key.as_ref().map_or(true, Token::is_empty) {
            missing.push("GEMINI_API_KEY");
        }
        if self.dust.api_key.as_ref().map_or(true, Token::is_empty) {
            missing.push("DUST_API_KEY");
        }
        if is_blank(self.dust.workspace_id.as_deref()) {
            missing.push("DUST_WORKSPACE_ID");
        }
        if is_blank(self.dust.agent_id.as_deref()) {
            missing.push("DUST_AGENT_ID");
        }
        if !missing.is_empty() {
            return Err(SurgeonError::Config(format!("Missing {}", missing.join(", "))));
        }

        for (name, value) in [
            ("github.api-base-url", &self.github.api_base_url),
            ("github.raw-base-url", &self.github.raw_base_url),
            ("gemini.base-url", &self.gemini.base_url),
            ("dust.base-url", &self.dust.base_url),
            ("codewords.base-url", &self.codewords.base_url),
        ] {
            Url::parse(value)
                .map_err(|e| SurgeonError::Config(format!("Invalid {name} '{value}': {e}")))?;
        }

        if self.http.timeout_secs == 0 {
            return Err(SurgeonError::Config(
                "http.timeout-secs must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("repo-surgeon").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete_env() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GEMINI_API_KEY", "gemini-key"),
            ("DUST_API_KEY", "dust-key"),
            ("DUST_WORKSPACE_ID", "ws-1"),
            ("DUST_AGENT_ID", "agent-1"),
        ]
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.github.api_base_url, "https://api.github.com");
        assert_eq!(config.gemini.model, "gemini-2.0-flash");
        assert_eq!(config.dust.base_url, "https://dust.tt");
        assert_eq!(config.codewords.base_url, "https://runtime.codewords.ai");
        assert_eq!(config.http.timeout_secs, 60);
        assert!(config.server.cors_allowed_origins.is_empty());
    }

    #[test]
    fn test_load_toml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".toml").unwrap();
        let toml_content = r#"
[gemini]
api-key = "toml-key"
model = "gemini-1.5-pro"

[dust]
workspace-id = "ws-toml"

[server]
bind = "127.0.0.1:8080"
cors-allowed-origins = ["https://app.example.com"]

[http]
timeout-secs = 15

[github.limits]
max-total-chars = 50000
"#;
        write!(temp_file, "{}", toml_content).unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.gemini.api_key, Some(Token::from("toml-key")));
        assert_eq!(config.gemini.model, "gemini-1.5-pro");
        assert_eq!(config.dust.workspace_id.as_deref(), Some("ws-toml"));
        assert_eq!(config.server.bind, "127.0.0.1:8080");
        assert_eq!(config.server.cors_allowed_origins, vec!["https://app.example.com"]);
        assert_eq!(config.http.timeout_secs, 15);
        assert_eq!(config.dust.base_url, "https://dust.tt");
        assert_eq!(config.github.limits.max_total_chars, 50_000);
        assert_eq!(config.github.limits.max_files, DEFAULT_MAX_FILES);
    }

    #[test]
    fn test_load_yaml_config() {
        let mut temp_file = NamedTempFile::with_suffix(".yaml").unwrap();
        write!(
            temp_file,
            "codewords:\n  service-id: svc-42\n  base-url: https://codewords.example.com\n"
        )
        .unwrap();

        let config = Config::load_from_path(temp_file.path()).unwrap();
        assert_eq!(config.codewords.service_id.as_deref(), Some("svc-42"));
        assert_eq!(config.codewords.base_url, "https://codewords.example.com");
    }

    #[test]
    fn test_load_missing_explicit_path_fails() {
        let result = Config::load(Some(Path::new("definitely-not-here.toml")));
        assert!(result.is_err());
    }

    #[test]
    fn test_env_overrides_file_values() {
        let mut config = Config::default();
        config.gemini.model = "from-file".to_string();

        config.apply_env(env_from(&[
            ("GEMINI_MODEL", "gemini-2.5-flash"),
            ("GITHUB_TOKEN", "ghp_x"),
            ("CORS_ALLOWED_ORIGINS", " https://a.example.com , ,https://b.example.com"),
            ("REPO_SURGEON_HTTP_TIMEOUT_SECS", "5"),
        ]));

        assert_eq!(config.gemini.model, "gemini-2.5-flash");
        assert_eq!(config.github.token, Some(Token::from("ghp_x")));
        assert_eq!(
            config.server.cors_allowed_origins,
            vec!["https://a.example.com", "https://b.example.com"]
        );
        assert_eq!(config.http.timeout_secs, 5);
    }

    #[test]
    fn test_blank_env_values_are_ignored() {
        let mut config = Config::default();
        config.apply_env(env_from(&[("GEMINI_API_KEY", "   "), ("DUST_API_BASE_URL", "")]));
        assert!(config.gemini.api_key.is_none());
        assert_eq!(config.dust.base_url, "https://dust.tt");
    }

    #[test]
    fn test_validate_reports_every_missing_key() {
        let err = Config::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("GEMINI_API_KEY"));
        assert!(message.contains("DUST_API_KEY"));
        assert!(message.contains("DUST_WORKSPACE_ID"));
        assert!(message.contains("DUST_AGENT_ID"));
        assert!(!message.contains("CODEWORDS"));
    }

    #[test]
    fn test_validate_accepts_missing_codewords_credentials() {
        let mut config = Config::default();
        config.apply_env(env_from(&complete_env()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_base_url() {
        let mut config = Config::default();
        config.apply_env(env_from(&complete_env()));
        config.dust.base_url = "not a url".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("dust.base-url"));
    }
}
