//! Service configuration read from the environment at startup

use crate::llm::GeminiConfig;
use crate::state_machine::DEFAULT_MAX_STEPS;
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

const DEFAULT_PORT: u16 = 8000;

#[derive(Debug)]
pub struct Config {
    pub db_path: PathBuf,
    pub port: u16,
    pub gemini: GeminiConfig,
    /// Credential used when the user has not stored one
    pub default_api_key: Option<SecretString>,
    /// `None` means no local limit
    pub max_steps: Option<usize>,
}

impl Config {
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok());
        if config.default_api_key.is_none() {
            config.default_api_key = option_env!("GEMINI_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .map(|k| SecretString::new(k.to_string()));
        }
        config
    }

    fn from_lookup<F>(var: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let db_path = var("REASONING_FLOW_DB_PATH").map_or_else(
            || {
                let home = var("HOME").unwrap_or_else(|| "/tmp".to_string());
                PathBuf::from(format!("{home}/.reasoning-flow/reasoning-flow.db"))
            },
            PathBuf::from,
        );

        let port = var("REASONING_FLOW_PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let mut gemini = GeminiConfig::default();
        if let Some(model) = var("GEMINI_MODEL").filter(|m| !m.trim().is_empty()) {
            gemini.model = model;
        }
        if let Some(base_url) = var("GEMINI_BASE_URL").filter(|u| !u.trim().is_empty()) {
            gemini.base_url = base_url.trim_end_matches('/').to_string();
        }
        if let Some(secs) = var("GEMINI_TIMEOUT_SECS").and_then(|s| s.parse().ok()) {
            gemini.timeout = Duration::from_secs(secs);
        }

        let max_steps = match var("REASONING_FLOW_MAX_STEPS").and_then(|s| s.parse::<usize>().ok()) {
            Some(0) => None,
            Some(n) => Some(n),
            None => Some(DEFAULT_MAX_STEPS),
        };

        Self {
            db_path,
            port,
            gemini,
            default_api_key: var("GEMINI_API_KEY")
                .filter(|k| !k.trim().is_empty())
                .map(SecretString::new),
            max_steps,
        }
    }
}
