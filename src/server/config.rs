use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    pub database_url: String,
    pub jwt_secret: String,

    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    /// Rows per page on list views.
    #[serde(default = "default_per_page")]
    pub per_page: u64,

    #[serde(default = "default_locale")]
    pub default_locale: String,

    /// Free-form reference attached to anomaly log lines (deployment id, ticket, ...).
    #[serde(default)]
    pub debug_ref: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    database_url: Option<String>,
    jwt_secret: Option<String>,
    listen_addr: Option<String>,
    log_dir: Option<String>,
    per_page: Option<u64>,
    default_locale: Option<String>,
    debug_ref: Option<String>,
}

fn default_listen_addr() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_per_page() -> u64 {
    20
}

fn default_locale() -> String {
    "en".to_string()
}

impl ServerConfig {
    /// A configuration with every optional setting at its default.
    pub fn new(database_url: impl Into<String>, jwt_secret: impl Into<String>) -> Self {
        ServerConfig {
            database_url: database_url.into(),
            jwt_secret: jwt_secret.into(),
            listen_addr: default_listen_addr(),
            log_dir: default_log_dir(),
            per_page: default_per_page(),
            default_locale: default_locale(),
            debug_ref: String::new(),
        }
    }

    pub fn load(config_path: Option<&str>) -> Result<Self, String> {
        dotenv::dotenv().ok();

        // 1. Load from file (optional)
        let file_config: PartialServerConfig = if let Some(path_str) = config_path {
            let path = Path::new(path_str);
            if path.exists() {
                let contents = fs::read_to_string(path)
                    .map_err(|e| format!("Failed to read config file at {path:?}: {e}"))?;
                toml::from_str(&contents)
                    .map_err(|e| format!("Failed to parse TOML from config file at {path:?}: {e}"))?
            } else {
                PartialServerConfig::default()
            }
        } else {
            PartialServerConfig::default()
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_env::<PartialServerConfig>()
            .map_err(|e| format!("Failed to load config from environment: {e}"))?;

        // 3. Merge: environment overrides file
        Self::merge(env_config, file_config)
    }

    fn merge(env_config: PartialServerConfig, file_config: PartialServerConfig) -> Result<Self, String> {
        Ok(ServerConfig {
            database_url: env_config.database_url.or(file_config.database_url)
                .ok_or("DATABASE_URL is required")?,
            jwt_secret: env_config.jwt_secret.or(file_config.jwt_secret)
                .ok_or("JWT_SECRET is required")?,
            listen_addr: env_config.listen_addr.or(file_config.listen_addr)
                .unwrap_or_else(default_listen_addr),
            log_dir: env_config.log_dir.or(file_config.log_dir)
                .unwrap_or_else(default_log_dir),
            per_page: env_config.per_page.or(file_config.per_page)
                .unwrap_or_else(default_per_page)
                .max(1),
            default_locale: env_config.default_locale.or(file_config.default_locale)
                .unwrap_or_else(default_locale),
            debug_ref: env_config.debug_ref.or(file_config.debug_ref)
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_overrides_file() {
        let file: PartialServerConfig = toml::from_str(
            r#"
            database_url = "postgres://file/crm"
            jwt_secret = "file-secret"
            per_page = 50
            "#,
        )
        .unwrap();
        let env = PartialServerConfig {
            jwt_secret: Some("env-secret".to_string()),
            ..Default::default()
        };

        let config = ServerConfig::merge(env, file).unwrap();
        assert_eq!(config.database_url, "postgres://file/crm");
        assert_eq!(config.jwt_secret, "env-secret");
        assert_eq!(config.per_page, 50);
        assert_eq!(config.listen_addr, "0.0.0.0:8080");
        assert_eq!(config.default_locale, "en");
    }

    #[test]
    fn missing_required_settings_are_reported() {
        let err = ServerConfig::merge(PartialServerConfig::default(), PartialServerConfig::default())
            .unwrap_err();
        assert_eq!(err, "DATABASE_URL is required");
    }

    #[test]
    fn zero_page_size_is_clamped() {
        let env = PartialServerConfig {
            database_url: Some("sqlite::memory:".to_string()),
            jwt_secret: Some("s".to_string()),
            per_page: Some(0),
            ..Default::default()
        };
        let config = ServerConfig::merge(env, PartialServerConfig::default()).unwrap();
        assert_eq!(config.per_page, 1);
    }
}
