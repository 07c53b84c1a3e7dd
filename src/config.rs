/// Build-time configuration for every extension context
use std::time::Duration;

use crate::error::{Error, Result};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1";

/// Polling cadence for note generation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PollConfig {
    pub interval: Duration,
    pub max_attempts: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_secs(2),
            max_attempts: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_base_url: String,
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub poll: PollConfig,
}

impl Config {
    pub fn new(
        api_base_url: Option<&str>,
        supabase_url: Option<&str>,
        supabase_anon_key: Option<&str>,
    ) -> Result<Config> {
        let supabase_url = supabase_url.unwrap_or("").trim();
        let supabase_anon_key = supabase_anon_key.unwrap_or("").trim();

        if supabase_url.is_empty() || supabase_anon_key.is_empty() {
            return Err(Error::Config(format!(
                "Missing Supabase credentials: URL={}, Key={}",
                !supabase_url.is_empty(),
                !supabase_anon_key.is_empty()
            )));
        }

        Ok(Config {
            api_base_url: normalize_base_url(api_base_url),
            supabase_url: normalize_base_url(Some(supabase_url)),
            supabase_anon_key: supabase_anon_key.to_string(),
            poll: PollConfig::default(),
        })
    }

    /// Values baked in by the build (`TUBEWIKI_*` environment variables)
    pub fn from_build_env() -> Result<Config> {
        Config::new(
            option_env!("TUBEWIKI_API_URL"),
            option_env!("TUBEWIKI_SUPABASE_URL"),
            option_env!("TUBEWIKI_SUPABASE_ANON_KEY"),
        )
    }
}

/// Trailing slashes are stripped; an empty value falls back to the local API
pub fn normalize_base_url(url: Option<&str>) -> String {
    let url = url.map(str::trim).filter(|u| !u.is_empty()).unwrap_or(DEFAULT_API_URL);
    url.trim_end_matches('/').to_string()
}
