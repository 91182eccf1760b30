use std::path::PathBuf;

use anyhow::{Context, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub page_size: u32,
    pub fixtures: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let jwt_secret = get("FOODGRAM_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("FOODGRAM_JWT_SECRET is unset or still a placeholder; set it in your .env file");
        }

        let port = get("FOODGRAM_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("FOODGRAM_PORT must be a port number")?;
        let page_size: u32 = get("FOODGRAM_PAGE_SIZE")
            .unwrap_or_else(|| "6".into())
            .parse()
            .context("FOODGRAM_PAGE_SIZE must be a positive integer")?;
        if page_size == 0 {
            bail!("FOODGRAM_PAGE_SIZE must be at least 1");
        }

        Ok(Self {
            host: get("FOODGRAM_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("FOODGRAM_DB_PATH").unwrap_or_else(|| "foodgram.db".into()).into(),
            jwt_secret,
            page_size,
            fixtures: get("FOODGRAM_FIXTURES").filter(|p| !p.is_empty()).map(PathBuf::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults() {
        let config = Config::from_lookup(lookup(&[("FOODGRAM_JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 8000);
        assert_eq!(config.db_path, PathBuf::from("foodgram.db"));
        assert_eq!(config.page_size, 6);
        assert!(config.fixtures.is_none());
    }

    #[test]
    fn rejects_placeholder_secret() {
        assert!(Config::from_lookup(lookup(&[])).is_err());
        assert!(Config::from_lookup(lookup(&[("FOODGRAM_JWT_SECRET", "dev-secret-change-me")])).is_err());
    }

    #[test]
    fn rejects_bad_numbers() {
        let secret = ("FOODGRAM_JWT_SECRET", "s3cret");
        assert!(Config::from_lookup(lookup(&[secret, ("FOODGRAM_PORT", "http")])).is_err());
        assert!(Config::from_lookup(lookup(&[secret, ("FOODGRAM_PAGE_SIZE", "0")])).is_err());

        let config = Config::from_lookup(lookup(&[secret, ("FOODGRAM_FIXTURES", "data/catalog.json")])).unwrap();
        assert_eq!(config.fixtures, Some(PathBuf::from("data/catalog.json")));
    }
}
