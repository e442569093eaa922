use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to parse TOML from config file at {path}: {source}")]
    Parse {
        path: String,
        source: toml::de::Error,
    },
    #[error("Failed to load config from environment: {0}")]
    Env(#[from] envy::Error),
    #[error("{0} is required")]
    Missing(&'static str),
    #[error("Invalid listen address {addr}: {source}")]
    InvalidAddr {
        addr: String,
        source: std::net::AddrParseError,
    },
}

#[derive(Deserialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,

    #[serde(default = "default_postgres_host")]
    pub postgres_host: String,

    #[serde(default = "default_postgres_port")]
    pub postgres_port: u16,

    pub postgres_user: String,
    pub postgres_password: String,
    pub postgres_db: String,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_env")]
    pub env: String,
}

// Partial config for layering
#[derive(Deserialize, Default, Debug)]
struct PartialServerConfig {
    addr: Option<String>,
    postgres_host: Option<String>,
    postgres_port: Option<u16>,
    postgres_user: Option<String>,
    postgres_password: Option<String>,
    postgres_db: Option<String>,
    max_connections: Option<u32>,
    log_dir: Option<String>,
    env: Option<String>,
}

fn default_addr() -> String {
    "0.0.0.0:3000".to_string()
}

fn default_postgres_host() -> String {
    "localhost".to_string()
}

fn default_postgres_port() -> u16 {
    5432
}

fn default_max_connections() -> u32 {
    10
}

fn default_log_dir() -> String {
    "logs".to_string()
}

fn default_env() -> String {
    "production".to_string()
}

impl ServerConfig {
    /// Loads `.env`, then the optional TOML file, then lets the process
    /// environment override whatever the file set.
    pub fn load(config_path: Option<&str>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::load_from(config_path, std::env::vars())
    }

    pub fn load_from<I>(config_path: Option<&str>, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        // 1. Load from file (optional)
        let file_config: PartialServerConfig = match config_path {
            Some(path_str) if Path::new(path_str).exists() => {
                let contents = fs::read_to_string(path_str).map_err(|source| ConfigError::Read {
                    path: path_str.to_string(),
                    source,
                })?;
                toml::from_str(&contents).map_err(|source| ConfigError::Parse {
                    path: path_str.to_string(),
                    source,
                })?
            }
            _ => PartialServerConfig::default(),
        };

        // 2. Load from environment variables
        let env_config: PartialServerConfig = envy::from_iter(vars)?;

        // 3. Merge: environment overrides file
        Ok(ServerConfig {
            addr: env_config.addr.or(file_config.addr).unwrap_or_else(default_addr),
            postgres_host: env_config.postgres_host.or(file_config.postgres_host)
                .unwrap_or_else(default_postgres_host),
            postgres_port: env_config.postgres_port.or(file_config.postgres_port)
                .unwrap_or_else(default_postgres_port),
            postgres_user: env_config.postgres_user.or(file_config.postgres_user)
                .ok_or(ConfigError::Missing("POSTGRES_USER"))?,
            postgres_password: env_config.postgres_password.or(file_config.postgres_password)
                .ok_or(ConfigError::Missing("POSTGRES_PASSWORD"))?,
            postgres_db: env_config.postgres_db.or(file_config.postgres_db)
                .ok_or(ConfigError::Missing("POSTGRES_DB"))?,
            max_connections: env_config.max_connections.or(file_config.max_connections)
                .unwrap_or_else(default_max_connections),
            log_dir: env_config.log_dir.or(file_config.log_dir).unwrap_or_else(default_log_dir),
            env: env_config.env.or(file_config.env).unwrap_or_else(default_env),
        })
    }

    pub fn database_url(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            urlencoding::encode(&self.postgres_user),
            urlencoding::encode(&self.postgres_password),
            self.postgres_host,
            self.postgres_port,
            urlencoding::encode(&self.postgres_db),
        )
    }

    /// Accepts `host:port` as well as the bare `:port` form.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        let addr = if self.addr.starts_with(':') {
            format!("0.0.0.0{}", self.addr)
        } else {
            self.addr.clone()
        };
        addr.parse().map_err(|source| ConfigError::InvalidAddr {
            addr: self.addr.clone(),
            source,
        })
    }

    pub fn is_dev(&self) -> bool {
        self.env == "dev"
    }
}
