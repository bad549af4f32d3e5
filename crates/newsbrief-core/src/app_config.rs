use std::net::SocketAddr;
use std::path::PathBuf;

/// Hard upper bound on how many article locators one run may consider.
pub const MAX_ARTICLE_CEILING: usize = 10;

/// Browser-like UA; many news sites refuse obvious bot agents.
pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub newsapi_key: Option<String>,
    pub hf_api_token: Option<String>,
    pub hf_base_url: String,
    pub summary_model: String,
    pub sentiment_model: String,
    pub target_language: String,
    pub audio_dir: PathBuf,
    pub max_articles: usize,
    pub max_concurrent_articles: usize,
    pub provider_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field(
                "newsapi_key",
                &self.newsapi_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "hf_api_token",
                &self.hf_api_token.as_ref().map(|_| "[redacted]"),
            )
            .field("hf_base_url", &self.hf_base_url)
            .field("summary_model", &self.summary_model)
            .field("sentiment_model", &self.sentiment_model)
            .field("target_language", &self.target_language)
            .field("audio_dir", &self.audio_dir)
            .field("max_articles", &self.max_articles)
            .field("max_concurrent_articles", &self.max_concurrent_articles)
            .field("provider_timeout_secs", &self.provider_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .finish()
    }
}
