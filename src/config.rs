// ABOUTME: Configuration module for the bibslide application
// ABOUTME: Provides configuration settings and environment variable handling

use crate::lookup::{LookupConfig, DEFAULT_LOOKUP_URL};
use crate::render::CaptureConfig;
use std::env;
use std::path::PathBuf;

/// Global configuration for the application
#[derive(Debug, Clone)]
pub struct Config {
    pub browser_path: Option<String>,
    pub capture_timeout_ms: u64,
    pub capture_width: u32,
    pub capture_height: u32,
    pub lookup_url: String,
    pub tts_command: String,
    pub preferences_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            browser_path: None,
            capture_timeout_ms: 30000, // 30 seconds
            capture_width: 1280,
            capture_height: 720,
            lookup_url: DEFAULT_LOOKUP_URL.to_string(),
            tts_command: "espeak".to_string(),
            preferences_path: None,
        }
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|s| s.trim().parse::<T>().ok())
}

impl Config {
    /// Create a new configuration instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            browser_path: env::var("BROWSER_PATH").ok().filter(|p| !p.is_empty()),
            capture_timeout_ms: parse_var("BIBSLIDE_CAPTURE_TIMEOUT_MS")
                .unwrap_or(defaults.capture_timeout_ms),
            capture_width: parse_var("BIBSLIDE_CAPTURE_WIDTH").unwrap_or(defaults.capture_width),
            capture_height: parse_var("BIBSLIDE_CAPTURE_HEIGHT")
                .unwrap_or(defaults.capture_height),
            lookup_url: env::var("BIBSLIDE_LOOKUP_URL")
                .ok()
                .filter(|u| !u.is_empty())
                .unwrap_or(defaults.lookup_url),
            tts_command: env::var("BIBSLIDE_TTS_COMMAND")
                .ok()
                .filter(|c| !c.is_empty())
                .unwrap_or(defaults.tts_command),
            preferences_path: env::var("BIBSLIDE_PREFERENCES").ok().map(PathBuf::from),
        }
    }

    /// Get a capture configuration with defaults from this config
    pub fn capture_config(
        &self,
        width: Option<u32>,
        height: Option<u32>,
        timeout_ms: Option<u64>,
    ) -> CaptureConfig {
        CaptureConfig {
            width: width.unwrap_or(self.capture_width),
            height: height.unwrap_or(self.capture_height),
            timeout_ms: timeout_ms.unwrap_or(self.capture_timeout_ms),
            browser_path: self.browser_path.clone(),
        }
    }

    /// Get a lookup configuration with defaults from this config
    pub fn lookup_config(&self, base_url: Option<String>, timeout_ms: Option<u64>) -> LookupConfig {
        let defaults = LookupConfig::default();
        LookupConfig {
            base_url: base_url.unwrap_or_else(|| self.lookup_url.clone()),
            timeout_ms: timeout_ms.unwrap_or(defaults.timeout_ms),
            retries: defaults.retries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_config_overrides() {
        let config = Config {
            browser_path: Some("/usr/bin/chromium".to_string()),
            ..Config::default()
        };
        let capture = config.capture_config(Some(1920), None, Some(5000));
        assert_eq!(capture.width, 1920);
        assert_eq!(capture.height, 720);
        assert_eq!(capture.timeout_ms, 5000);
        assert_eq!(capture.browser_path.as_deref(), Some("/usr/bin/chromium"));
    }

    #[test]
    fn test_lookup_config_defaults() {
        let lookup = Config::new().lookup_config(None, None);
        assert_eq!(lookup.base_url, DEFAULT_LOOKUP_URL);
        assert_eq!(lookup.retries, 3);

        let custom = Config::new().lookup_config(Some("http://localhost:9000/api".to_string()), None);
        assert_eq!(custom.base_url, "http://localhost:9000/api");
    }
}
