//! Server configuration from environment variables.

use std::path::PathBuf;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    pub port: u16,
    /// Model weights and `scalers.json`
    pub models_dir: PathBuf,
    /// Served at `/static`; uploads land in `{static_dir}/uploads`
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
    /// Optional JSON overrides for the disease knowledge base
    pub disease_db: Option<PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            models_dir: PathBuf::from("models"),
            static_dir: PathBuf::from("static"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            disease_db: None,
        }
    }
}

impl ServerConfig {
    /// Read `PORT`, `MODELS_DIR`, `STATIC_DIR`, `MAX_UPLOAD_BYTES`, `DISEASE_DB`
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unparseable numbers keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(defaults.port);

        let max_upload_bytes = lookup("MAX_UPLOAD_BYTES")
            .and_then(|b| b.parse().ok())
            .unwrap_or(defaults.max_upload_bytes);

        Self {
            port,
            models_dir: lookup("MODELS_DIR").map(PathBuf::from).unwrap_or(defaults.models_dir),
            static_dir: lookup("STATIC_DIR").map(PathBuf::from).unwrap_or(defaults.static_dir),
            max_upload_bytes,
            disease_db: lookup("DISEASE_DB").filter(|p| !p.is_empty()).map(PathBuf::from),
        }
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.static_dir.join("uploads")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[]));
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.upload_dir(), PathBuf::from("static/uploads"));
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(lookup(&[
            ("PORT", "8080"),
            ("MODELS_DIR", "/opt/advisor/models"),
            ("MAX_UPLOAD_BYTES", "1024"),
            ("DISEASE_DB", "/opt/advisor/diseases.json"),
        ]));
        assert_eq!(config.port, 8080);
        assert_eq!(config.models_dir, PathBuf::from("/opt/advisor/models"));
        assert_eq!(config.max_upload_bytes, 1024);
        assert_eq!(config.disease_db, Some(PathBuf::from("/opt/advisor/diseases.json")));
    }

    #[test]
    fn test_bad_numbers_keep_defaults() {
        let config = ServerConfig::from_lookup(lookup(&[("PORT", "eighty"), ("DISEASE_DB", "")]));
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.disease_db, None);
    }
}
