use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub packet: PacketConfig,
    #[serde(default)]
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PacketConfig {
    /// 单份最小金额 (美分)
    #[serde(default = "default_min_share_cents")]
    pub min_share_cents: i64,
    /// 未指定 ttl 时的默认有效期 (秒)
    #[serde(default = "default_ttl_seconds")]
    pub default_ttl_seconds: i64,
    /// 过期扫描间隔 (秒)
    #[serde(default = "default_sweep_interval_seconds")]
    pub sweep_interval_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NotifyConfig {
    /// 事件通知 webhook 地址, 为空时仅记日志
    #[serde(default)]
    pub webhook_url: Option<String>,
}

fn default_min_share_cents() -> i64 {
    1
}

fn default_ttl_seconds() -> i64 {
    86_400
}

fn default_sweep_interval_seconds() -> u64 {
    60
}

impl Default for PacketConfig {
    fn default() -> Self {
        Self {
            min_share_cents: default_min_share_cents(),
            default_ttl_seconds: default_ttl_seconds(),
            sweep_interval_seconds: default_sweep_interval_seconds(),
        }
    }
}

impl Config {
    pub fn from_toml() -> anyhow::Result<Self> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 尝试读取配置文件，如果不存在则完全依赖环境变量
        let mut config: Config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => {
                // 有配置文件：先解析再用环境变量覆盖
                toml::from_str(&config_str)
                    .with_context(|| format!("Failed to parse config file {config_path}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // 无配置文件：使用环境变量与默认值构建
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                // 数据库 URL 在无配置文件时必须提供
                let database_url = get_env("DATABASE_URL").with_context(|| {
                    format!("DATABASE_URL is not set and config file {config_path} is missing")
                })?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    packet: PacketConfig::default(),
                    notify: NotifyConfig::default(),
                }
            }
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read config file {config_path}"));
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("PACKET_MIN_SHARE_CENTS")
            && let Ok(n) = v.parse()
        {
            config.packet.min_share_cents = n;
        }
        if let Ok(v) = env::var("PACKET_DEFAULT_TTL_SECONDS")
            && let Ok(n) = v.parse()
        {
            config.packet.default_ttl_seconds = n;
        }
        if let Ok(v) = env::var("PACKET_SWEEP_INTERVAL_SECONDS")
            && let Ok(n) = v.parse()
        {
            config.packet.sweep_interval_seconds = n;
        }
        if let Ok(v) = env::var("NOTIFY_WEBHOOK_URL") {
            config.notify.webhook_url = Some(v);
        }

        Ok(config)
    }
}
