use std::{str::FromStr, time::Duration};

use thiserror::Error;

use crate::gemini::{GenerationConfig, DEFAULT_API_BASE, DEFAULT_MODEL};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub max_upload_bytes: usize,
    pub generation: GenerationConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loggable credential state; never includes any part of the key.
    pub fn credential_status(&self) -> &'static str {
        if self.generation.credential.is_some() { "configured" } else { "missing" }
    }

    /// Build from any key lookup; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let credential = get("GOOGLE_API_KEY").or_else(|| get("GEMINI_API_KEY"));
        let defaults = GenerationConfig::default();

        let generation = GenerationConfig {
            model_id: get("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            temperature: parse(&get, "GENERATION_TEMPERATURE")?.unwrap_or(defaults.temperature),
            max_output_tokens: parse(&get, "GENERATION_MAX_OUTPUT_TOKENS")?,
            timeout: parse::<u64>(&get, "GENERATION_TIMEOUT_SECS")?.map(Duration::from_secs),
            max_retries: parse(&get, "GENERATION_MAX_RETRIES")?.unwrap_or(defaults.max_retries),
            credential,
            base_url: get("GEMINI_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            retry_backoff: defaults.retry_backoff,
        };

        let max_upload_mb: usize = parse(&get, "MAX_UPLOAD_MB")?.unwrap_or(25);
        Ok(Self {
            port: parse(&get, "PORT")?.unwrap_or(8080),
            max_upload_bytes: max_upload_mb.saturating_mul(1024 * 1024),
            generation,
        })
    }
}

fn parse<T: FromStr>(get: &impl Fn(&str) -> Option<String>, key: &'static str) -> Result<Option<T>, ConfigError> {
    get(key)
        .map(|value| value.parse().map_err(|_| ConfigError::Invalid { key, value }))
        .transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_match_deterministic_generation() {
        let cfg = load(&[]).unwrap();
        assert_eq!(cfg.port, 8080);
        assert_eq!(cfg.max_upload_bytes, 25 * 1024 * 1024);
        assert_eq!(cfg.generation.model_id, "gemini-1.5-pro");
        assert_eq!(cfg.generation.temperature, 0.0);
        assert_eq!(cfg.generation.max_output_tokens, None);
        assert_eq!(cfg.generation.timeout, None);
        assert_eq!(cfg.generation.max_retries, 2);
        assert_eq!(cfg.generation.credential, None);
    }

    #[test]
    fn overrides_are_applied() {
        let cfg = load(&[
            ("GOOGLE_API_KEY", "abc"),
            ("GEMINI_MODEL", "gemini-1.5-flash"),
            ("GENERATION_TIMEOUT_SECS", "30"),
            ("GENERATION_MAX_OUTPUT_TOKENS", "4096"),
            ("GENERATION_MAX_RETRIES", "0"),
            ("MAX_UPLOAD_MB", "5"),
            ("PORT", "3000"),
        ])
        .unwrap();
        assert_eq!(cfg.generation.credential.as_deref(), Some("abc"));
        assert_eq!(cfg.generation.model_id, "gemini-1.5-flash");
        assert_eq!(cfg.generation.timeout, Some(Duration::from_secs(30)));
        assert_eq!(cfg.generation.max_output_tokens, Some(4096));
        assert_eq!(cfg.generation.max_retries, 0);
        assert_eq!(cfg.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.port, 3000);
    }

    #[test]
    fn gemini_key_is_a_fallback_and_blank_is_unset() {
        let cfg = load(&[("GOOGLE_API_KEY", "  "), ("GEMINI_API_KEY", "fallback")]).unwrap();
        assert_eq!(cfg.generation.credential.as_deref(), Some("fallback"));
    }

    #[test]
    fn credential_status_reveals_nothing_of_the_key() {
        let cfg = load(&[("GOOGLE_API_KEY", "AIzaSecretValue")]).unwrap();
        assert_eq!(cfg.credential_status(), "configured");
        assert!(!cfg.credential_status().contains("AIza"));
        assert_eq!(load(&[]).unwrap().credential_status(), "missing");
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = load(&[("PORT", "eighty")]).unwrap_err();
        assert_eq!(err, ConfigError::Invalid { key: "PORT", value: "eighty".into() });
    }
}
