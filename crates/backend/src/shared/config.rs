use once_cell::sync::OnceCell;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub database: DatabaseConfig,
    /// SMTP settings for report delivery. Absent section disables mail.
    pub mail: Option<MailConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct MailConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[database]
path = "target/db/app.db"
"#;

static CONFIG: OnceCell<Config> = OnceCell::new();

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// `EMAIL_HOST` / `EMAIL_PORT` / `EMAIL_USER` / `EMAIL_PASSWORD` environment
/// variables override (or stand in for) the `[mail]` section, so credentials
/// never have to live in the config file.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    apply_mail_env_overrides(&mut config);
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

fn apply_mail_env_overrides(config: &mut Config) {
    let host = std::env::var("EMAIL_HOST").ok();
    let port = std::env::var("EMAIL_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok());
    let username = std::env::var("EMAIL_USER").ok();
    let password = std::env::var("EMAIL_PASSWORD").ok();

    match config.mail.as_mut() {
        Some(mail) => {
            if let Some(host) = host {
                mail.host = host;
            }
            if let Some(port) = port {
                mail.port = port;
            }
            if let Some(username) = username {
                mail.username = username;
            }
            if let Some(password) = password {
                mail.password = password;
            }
        }
        None => {
            // A complete set of env vars forms a mail section on its own
            if let (Some(host), Some(username), Some(password)) = (host, username, password) {
                config.mail = Some(MailConfig {
                    host,
                    port: port.unwrap_or(465),
                    username,
                    password,
                });
            }
        }
    }
}

/// Store the loaded configuration for the lifetime of the process.
pub fn set_config(config: Config) -> anyhow::Result<()> {
    CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("Configuration already initialized"))
}

pub fn get_config() -> Option<&'static Config> {
    CONFIG.get()
}

/// Get the database file path from configuration
/// Resolves relative paths relative to the executable directory
pub fn get_database_path(config: &Config) -> anyhow::Result<PathBuf> {
    let db_path_str = &config.database.path;
    let db_path = Path::new(db_path_str);

    // If absolute path, use as is
    if db_path.is_absolute() {
        return Ok(db_path.to_path_buf());
    }

    // If relative path, resolve it relative to the executable directory
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let resolved_path = exe_dir.join(db_path);
            return Ok(resolved_path);
        }
    }

    // Fallback: use relative to current directory
    Ok(PathBuf::from(db_path_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.database.path, "target/db/app.db");
        assert!(config.mail.is_none());
    }

    #[test]
    fn test_mail_section_parses() {
        let config: Config = toml::from_str(
            r#"
[database]
path = "target/db/app.db"

[mail]
host = "smtp.example.com"
port = 465
username = "reports@example.com"
password = "secret"
"#,
        )
        .unwrap();
        let mail = config.mail.unwrap();
        assert_eq!(mail.host, "smtp.example.com");
        assert_eq!(mail.port, 465);
    }
}
