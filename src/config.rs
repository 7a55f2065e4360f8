use anyhow::{anyhow, Context};
use secrecy::SecretString;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:5000";
const DEFAULT_ANTHROPIC_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_SUMMARY_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OEMBED_BASE_URL: &str = "https://noembed.com/embed";

/// Runtime settings, read from the environment (after `.env` is loaded).
#[derive(Debug)]
pub struct Settings {
    pub bind_address: String,
    /// `None` selects the in-memory store.
    pub database_url: Option<SecretString>,
    pub database_max_connections: u32,
    pub anthropic_api_key: SecretString,
    pub anthropic_base_url: String,
    pub summary_model: String,
    pub summary_max_tokens: u32,
    pub oembed_base_url: String,
    pub transcript_lang: Option<String>,
    pub upstream_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let anthropic_api_key = var("ANTHROPIC_API_KEY")
            .map(SecretString::new)
            .ok_or_else(|| anyhow!("ANTHROPIC_API_KEY must be set"))?;

        Ok(Self {
            bind_address: var("BIND_ADDRESS").unwrap_or_else(|| DEFAULT_BIND_ADDRESS.to_string()),
            database_url: var("DATABASE_URL").map(SecretString::new),
            database_max_connections: parse_or(var("DATABASE_MAX_CONNECTIONS"), "DATABASE_MAX_CONNECTIONS", 5)?,
            anthropic_api_key,
            anthropic_base_url: var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_BASE_URL.to_string()),
            summary_model: var("SUMMARY_MODEL").unwrap_or_else(|| DEFAULT_SUMMARY_MODEL.to_string()),
            summary_max_tokens: parse_or(var("SUMMARY_MAX_TOKENS"), "SUMMARY_MAX_TOKENS", 2048)?,
            oembed_base_url: var("OEMBED_BASE_URL")
                .unwrap_or_else(|| DEFAULT_OEMBED_BASE_URL.to_string()),
            transcript_lang: var("TRANSCRIPT_LANG"),
            upstream_timeout: Duration::from_secs(parse_or(
                var("UPSTREAM_TIMEOUT_SECS"),
                "UPSTREAM_TIMEOUT_SECS",
                60,
            )?),
        })
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", key, raw)),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_only_the_key_is_set() {
        let settings = settings(&[("ANTHROPIC_API_KEY", "sk-test")]).unwrap();

        assert_eq!(settings.anthropic_api_key.expose_secret(), "sk-test");
        assert_eq!(settings.bind_address, "0.0.0.0:5000");
        assert!(settings.database_url.is_none());
        assert_eq!(settings.summary_model, "claude-sonnet-4-20250514");
        assert_eq!(settings.summary_max_tokens, 2048);
        assert_eq!(settings.oembed_base_url, "https://noembed.com/embed");
        assert_eq!(settings.upstream_timeout, Duration::from_secs(60));
        assert!(settings.transcript_lang.is_none());
    }

    #[test]
    fn overrides_are_read() {
        let settings = settings(&[
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("DATABASE_URL", "postgres://localhost/videos"),
            ("SUMMARY_MAX_TOKENS", "1024"),
            ("UPSTREAM_TIMEOUT_SECS", "15"),
            ("TRANSCRIPT_LANG", "de"),
        ])
        .unwrap();

        assert_eq!(
            settings.database_url.as_ref().map(|u| u.expose_secret().as_str()),
            Some("postgres://localhost/videos")
        );
        assert_eq!(settings.summary_max_tokens, 1024);
        assert_eq!(settings.upstream_timeout, Duration::from_secs(15));
        assert_eq!(settings.transcript_lang.as_deref(), Some("de"));
    }

    #[test]
    fn missing_api_key_is_an_error() {
        let err = settings(&[]).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));

        assert!(settings(&[("ANTHROPIC_API_KEY", "  ")]).is_err());
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = settings(&[("ANTHROPIC_API_KEY", "sk"), ("SUMMARY_MAX_TOKENS", "lots")])
            .unwrap_err();
        assert!(err.to_string().contains("SUMMARY_MAX_TOKENS"));
    }
}
