use anyhow::{bail, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing::info;

pub const DEFAULT_CATALOG_BASE: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p/w500";
const DEFAULT_FAVORITES_PATH: &str = "data/favorites.json";
const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3146";

/// Everything the process takes from its environment, read once at startup
/// and handed to constructors from there on.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_access_token: String,
    pub catalog_base_url: String,
    pub image_base_url: String,
    pub favorites_path: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let Some(api_access_token) = get("API_ACCESS_TOKEN") else {
            bail!("Missing required environment variable: API_ACCESS_TOKEN");
        };
        let bind_raw = get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = match bind_raw.parse::<SocketAddr>() {
            Ok(addr) => addr,
            Err(e) => bail!("Invalid BIND_ADDR '{}': {}", bind_raw, e),
        };

        let config = Self {
            api_access_token,
            catalog_base_url: get("CATALOG_BASE_URL")
                .unwrap_or_else(|| DEFAULT_CATALOG_BASE.to_string()),
            image_base_url: get("IMAGE_BASE_URL").unwrap_or_else(|| DEFAULT_IMAGE_BASE.to_string()),
            favorites_path: get("FAVORITES_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_FAVORITES_PATH)),
            bind_addr,
        };
        info!(
            "Catalog at {}, favorites in {}",
            config.catalog_base_url,
            config.favorites_path.display()
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn requires_access_token() {
        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("API_ACCESS_TOKEN"));

        let err = Config::from_lookup(lookup(&[("API_ACCESS_TOKEN", "  ")])).unwrap_err();
        assert!(err.to_string().contains("API_ACCESS_TOKEN"));
    }

    #[test]
    fn applies_defaults() {
        let config = Config::from_lookup(lookup(&[("API_ACCESS_TOKEN", "token")])).unwrap();
        assert_eq!(config.api_access_token, "token");
        assert_eq!(config.catalog_base_url, DEFAULT_CATALOG_BASE);
        assert_eq!(config.image_base_url, DEFAULT_IMAGE_BASE);
        assert_eq!(config.favorites_path, PathBuf::from("data/favorites.json"));
        assert_eq!(config.bind_addr.port(), 3146);
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let err = Config::from_lookup(lookup(&[
            ("API_ACCESS_TOKEN", "token"),
            ("BIND_ADDR", "nowhere"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("BIND_ADDR"));
    }
}
