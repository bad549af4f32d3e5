use crate::app_config::{AppConfig, Environment, DEFAULT_USER_AGENT, MAX_ARTICLE_CEILING};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if a value is present but invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so tests can drive it with a `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;
    use std::path::PathBuf;

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let env = parse_environment(&or_default("NEWSBRIEF_ENV", "development"));

    let bind_addr = or_default("NEWSBRIEF_BIND_ADDR", "0.0.0.0:8000")
        .parse::<SocketAddr>()
        .map_err(|e| invalid("NEWSBRIEF_BIND_ADDR", e.to_string()))?;
    let log_level = or_default("NEWSBRIEF_LOG_LEVEL", "info");

    let newsapi_key = optional("NEWSAPI_KEY");
    let hf_api_token = optional("HF_API_TOKEN");
    let hf_base_url = or_default(
        "NEWSBRIEF_HF_BASE_URL",
        "https://api-inference.huggingface.co",
    );
    let summary_model = or_default("NEWSBRIEF_SUMMARY_MODEL", "sshleifer/distilbart-cnn-12-6");
    let sentiment_model = or_default(
        "NEWSBRIEF_SENTIMENT_MODEL",
        "distilbert/distilbert-base-uncased-finetuned-sst-2-english",
    );

    let target_language = or_default("NEWSBRIEF_TARGET_LANGUAGE", "hi");
    if target_language.trim().is_empty() {
        return Err(invalid(
            "NEWSBRIEF_TARGET_LANGUAGE",
            "must not be empty".to_string(),
        ));
    }
    let audio_dir = PathBuf::from(or_default("NEWSBRIEF_AUDIO_DIR", "./audio"));

    let max_articles = parse_usize("NEWSBRIEF_MAX_ARTICLES", "10")?;
    if max_articles == 0 || max_articles > MAX_ARTICLE_CEILING {
        return Err(invalid(
            "NEWSBRIEF_MAX_ARTICLES",
            format!("must be between 1 and {MAX_ARTICLE_CEILING}, got {max_articles}"),
        ));
    }

    let max_concurrent_articles = parse_usize("NEWSBRIEF_MAX_CONCURRENT_ARTICLES", "4")?;
    if max_concurrent_articles == 0 {
        return Err(invalid(
            "NEWSBRIEF_MAX_CONCURRENT_ARTICLES",
            "must be at least 1".to_string(),
        ));
    }
    let max_concurrent_articles = max_concurrent_articles.min(max_articles);

    let provider_timeout_secs = parse_u64("NEWSBRIEF_PROVIDER_TIMEOUT_SECS", "20")?;
    let request_timeout_secs = parse_u64("NEWSBRIEF_REQUEST_TIMEOUT_SECS", "120")?;
    if provider_timeout_secs == 0 {
        return Err(invalid(
            "NEWSBRIEF_PROVIDER_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }
    if request_timeout_secs == 0 {
        return Err(invalid(
            "NEWSBRIEF_REQUEST_TIMEOUT_SECS",
            "must be at least 1".to_string(),
        ));
    }

    let user_agent = or_default("NEWSBRIEF_USER_AGENT", DEFAULT_USER_AGENT);
    let max_retries = parse_u32("NEWSBRIEF_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("NEWSBRIEF_RETRY_BACKOFF_BASE_MS", "500")?;

    Ok(AppConfig {
        env,
        bind_addr,
        log_level,
        newsapi_key,
        hf_api_token,
        hf_base_url,
        summary_model,
        sentiment_model,
        target_language,
        audio_dir,
        max_articles,
        max_concurrent_articles,
        provider_timeout_secs,
        request_timeout_secs,
        user_agent,
        max_retries,
        retry_backoff_base_ms,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
