//! Client configuration resolved from the environment.
//!
//! Only two things are externally supplied: the backend base URL and the
//! location of the durable token file. Both have local defaults so a fresh
//! checkout talks to a backend on localhost without any setup.

use std::path::{Path, PathBuf};

use reqwest::Url;

use crate::error::{AppError, AppResult};

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const API_URL_ENV: &str = "EVENTSPHERE_API_URL";
pub const TOKEN_FILE_ENV: &str = "EVENTSPHERE_TOKEN_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Always ends with `/` so relative endpoint paths join beneath it.
    pub api_base_url: Url,
    pub token_path: PathBuf,
}

impl ClientConfig {
    pub fn new(api_base_url: &str, token_path: impl Into<PathBuf>) -> AppResult<Self> {
        Ok(Self { api_base_url: parse_base_url(api_base_url)?, token_path: token_path.into() })
    }

    /// Read `EVENTSPHERE_API_URL` and `EVENTSPHERE_TOKEN_FILE`, falling back to defaults when unset or blank.
    pub fn from_env() -> AppResult<Self> {
        let api = std::env::var(API_URL_ENV).ok().filter(|v| !v.trim().is_empty());
        let token = std::env::var(TOKEN_FILE_ENV).ok().filter(|v| !v.trim().is_empty());
        let home = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")).ok();
        Self::new(
            api.as_deref().unwrap_or(DEFAULT_API_URL),
            token.map(PathBuf::from).unwrap_or_else(|| default_token_path(home.as_deref())),
        )
    }

    pub fn with_api_base_url(mut self, url: &str) -> AppResult<Self> {
        self.api_base_url = parse_base_url(url)?;
        Ok(self)
    }

    pub fn with_token_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.token_path = path.into();
        self
    }
}

pub fn default_token_path(home: Option<&str>) -> PathBuf {
    let root = home.map(Path::new).unwrap_or_else(|| Path::new("."));
    root.join(".eventsphere").join("token")
}

fn parse_base_url(raw: &str) -> AppResult<Url> {
    let trimmed = raw.trim();
    let mut url = Url::parse(trimmed)
        .map_err(|e| AppError::config("invalid_api_url".to_string(), format!("{trimmed}: {e}")))?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(AppError::config("invalid_api_url".to_string(), format!("{trimmed}: expected an http or https URL")));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_gets_trailing_slash() {
        let cfg = ClientConfig::new("http://localhost:5000/api", "/tmp/t").unwrap();
        assert_eq!(cfg.api_base_url.as_str(), "http://localhost:5000/api/");
        assert_eq!(cfg.api_base_url.join("auth/me").unwrap().as_str(), "http://localhost:5000/api/auth/me");
    }

    #[test]
    fn already_normalised_url_is_untouched() {
        let cfg = ClientConfig::new("https://events.example.com/api/", "t").unwrap();
        assert_eq!(cfg.api_base_url.as_str(), "https://events.example.com/api/");
    }

    #[test]
    fn rejects_non_http_schemes_and_garbage() {
        assert!(matches!(ClientConfig::new("ftp://x/api", "t"), Err(AppError::Config { .. })));
        assert!(matches!(ClientConfig::new("not a url", "t"), Err(AppError::Config { .. })));
    }

    #[test]
    fn default_token_path_prefers_home() {
        assert_eq!(default_token_path(Some("/home/ana")), PathBuf::from("/home/ana/.eventsphere/token"));
        assert_eq!(default_token_path(None), PathBuf::from("./.eventsphere/token"));
    }

    #[test]
    fn overrides_replace_fields() {
        let cfg = ClientConfig::new(DEFAULT_API_URL, "a").unwrap()
            .with_api_base_url("http://10.0.0.2:8080/v2").unwrap()
            .with_token_path("b");
        assert_eq!(cfg.api_base_url.as_str(), "http://10.0.0.2:8080/v2/");
        assert_eq!(cfg.token_path, PathBuf::from("b"));
    }
}
