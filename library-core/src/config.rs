use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder secret shipped in defaults. `library serve` warns while it is in use.
pub const DEV_SESSION_SECRET: &str = "library-dev-secret-change-me";

/// Centralized configuration for the library service
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LibraryConfig {
    pub server: ServerSection,
    pub database: DatabaseSection,
    pub session: SessionSection,
    pub rate_limit: RateLimitSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind: String,
    /// Allow any CORS origin (default: localhost only)
    pub cors_permissive: bool,
    pub request_timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3030".to_string(),
            cors_permissive: false,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSection {
    /// Postgres URL; `${DATABASE_URL}` style references are expanded
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseSection {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/library".to_string(),
            max_connections: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSection {
    pub secret: String,
    pub ttl_secs: u64,
    pub cookie_name: String,
    /// Mark the session cookie `Secure` (requires HTTPS)
    pub secure_cookie: bool,
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            secret: DEV_SESSION_SECRET.to_string(),
            ttl_secs: 60 * 60 * 24 * 7,
            cookie_name: "library_session".to_string(),
            secure_cookie: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitSection {
    pub enabled: bool,
    /// Requests allowed per client per window
    pub max_requests: u32,
    pub window_secs: u64,
    /// How often expired windows are swept from memory
    pub sweep_interval_secs: u64,
    /// Key clients by the first `X-Forwarded-For` hop. Enable only behind
    /// a reverse proxy that sets the header; clients can forge it otherwise.
    pub trust_forwarded_for: bool,
}

impl Default for RateLimitSection {
    fn default() -> Self {
        Self {
            enabled: true,
            max_requests: 120,
            window_secs: 60,
            sweep_interval_secs: 300,
            trust_forwarded_for: false,
        }
    }
}

impl LibraryConfig {
    /// Load `~/.library/config.toml`, falling back to defaults when the
    /// file does not exist, then apply environment overrides.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content).context("Failed to parse config file (invalid TOML)")?
        } else {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            Self::default()
        };

        config.expand_variables();
        config.apply_env_overrides();
        Ok(config)
    }

    /// Get config file path: ~/.library/config.toml
    pub fn config_path() -> PathBuf {
        if let Ok(path) = env::var("LIBRARY_CONFIG") {
            return PathBuf::from(path);
        }
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".library/config.toml")
    }

    /// Environment wins over the file.
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = env::var("DATABASE_URL") {
            self.database.url = url;
        }
        if let Ok(secret) = env::var("LIBRARY_SESSION_SECRET") {
            self.session.secret = secret;
        }
        if let Ok(bind) = env::var("LIBRARY_BIND") {
            self.server.bind = bind;
        }
    }

    /// Expand ${VAR} references against the process environment
    fn expand_variables(&mut self) {
        self.database.url = expand_string(&self.database.url, |key| env::var(key).ok());
        self.session.secret = expand_string(&self.session.secret, |key| env::var(key).ok());
    }

    /// Check values that would otherwise fail at first use.
    pub fn validate(&self) -> Result<()> {
        let mut errors = Vec::new();

        if self.server.bind.parse::<std::net::SocketAddr>().is_err() {
            errors.push(format!("  ✗ server.bind: {:?} is not host:port", self.server.bind));
        }
        if self.database.max_connections == 0 {
            errors.push("  ✗ database.max_connections must be > 0".to_string());
        }
        if self.session.secret.len() < 16 {
            errors.push("  ✗ session.secret must be at least 16 bytes".to_string());
        }
        if self.session.ttl_secs == 0 {
            errors.push("  ✗ session.ttl_secs must be > 0".to_string());
        }
        if self.rate_limit.enabled && (self.rate_limit.max_requests == 0 || self.rate_limit.window_secs == 0) {
            errors.push("  ✗ rate_limit needs max_requests and window_secs > 0".to_string());
        }

        if !errors.is_empty() {
            anyhow::bail!("Config validation failed:\n{}", errors.join("\n"));
        }
        Ok(())
    }

    pub fn uses_dev_secret(&self) -> bool {
        self.session.secret == DEV_SESSION_SECRET
    }

    /// Save config to file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config to TOML")?;
        fs::write(path, toml_str).with_context(|| format!("Failed to write config file: {:?}", path))?;
        Ok(())
    }
}

/// Replace each `${KEY}` with `lookup(KEY)`; unknown keys expand to "".
fn expand_string(s: &str, lookup: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(start) = rest.find("${") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find('}') {
            Some(end) => {
                out.push_str(&lookup(&after[..end]).unwrap_or_default());
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn expands_placeholders() {
        let lookup = |key: &str| (key == "PGHOST").then(|| "db.internal".to_string());
        assert_eq!(
            expand_string("postgres://${PGHOST}/library", lookup),
            "postgres://db.internal/library"
        );
        assert_eq!(expand_string("${MISSING}x", lookup), "x");
        assert_eq!(expand_string("no-close ${PGHOST", lookup), "no-close ${PGHOST");
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
            [rate_limit]
            max_requests = 5
            "#,
        )
        .unwrap();

        let config = LibraryConfig::load_from(&path).unwrap();
        assert_eq!(config.rate_limit.max_requests, 5);
        assert_eq!(config.rate_limit.window_secs, 60);
        assert!(!config.rate_limit.trust_forwarded_for);
        assert_eq!(config.session.cookie_name, "library_session");
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/config.toml");
        let mut config = LibraryConfig::default();
        config.server.request_timeout_secs = 5;
        config.save_to(&path).unwrap();

        let loaded = LibraryConfig::load_from(&path).unwrap();
        assert_eq!(loaded.server.request_timeout_secs, 5);
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[server\nbind = ").unwrap();
        assert!(LibraryConfig::load_from(&path).is_err());
    }

    #[test]
    fn validate_catches_bad_values() {
        let mut config = LibraryConfig::default();
        assert!(config.validate().is_ok());

        config.server.bind = "not-an-addr".into();
        config.session.secret = "short".into();
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("server.bind"));
        assert!(err.contains("session.secret"));
    }
}
