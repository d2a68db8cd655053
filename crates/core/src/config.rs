use std::path::Path;

use anyhow::{Context, Result};
use config::{Config as ConfigBuilder, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

/// 系统配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub dispatcher: DispatcherConfig,
    pub notifier: NotifierConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherConfig {
    /// 单次派发后等待Worker接单的时限（秒）
    pub offer_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifierConfig {
    /// 通知网关地址，Worker与来源消息都经由它送出
    pub endpoint: String,
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub enabled: bool,
    pub bind_address: String,
    pub cors_enabled: bool,
    pub request_timeout_seconds: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database: DatabaseConfig {
                url: "sqlite://courier.db".to_string(),
                max_connections: 10,
                min_connections: 1,
                connection_timeout_seconds: 30,
            },
            dispatcher: DispatcherConfig {
                offer_timeout_seconds: 30,
            },
            notifier: NotifierConfig {
                endpoint: "http://localhost:9090/notify".to_string(),
                request_timeout_seconds: 10,
            },
            api: ApiConfig {
                enabled: true,
                bind_address: "0.0.0.0:8080".to_string(),
                cors_enabled: true,
                request_timeout_seconds: 30,
            },
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序：
    /// 1. 默认值
    /// 2. 配置文件（TOML格式）
    /// 3. 环境变量覆盖（前缀: COURIER_）
    pub fn load(config_path: Option<&str>) -> Result<Self> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_path {
            if Path::new(path).exists() {
                builder = builder.add_source(File::new(path, FileFormat::Toml));
            } else {
                return Err(anyhow::anyhow!("配置文件不存在: {path}"));
            }
        } else {
            let default_paths = [
                "config/courier.toml",
                "courier.toml",
                "/etc/courier/config.toml",
            ];

            let mut config_file_found = false;
            for path in &default_paths {
                if Path::new(path).exists() {
                    builder = builder.add_source(File::new(path, FileFormat::Toml));
                    config_file_found = true;
                    break;
                }
            }

            if !config_file_found {
                builder = builder
                    .set_default("database.url", "sqlite://courier.db")?
                    .set_default("database.max_connections", 10)?
                    .set_default("database.min_connections", 1)?
                    .set_default("database.connection_timeout_seconds", 30)?
                    .set_default("dispatcher.offer_timeout_seconds", 30)?
                    .set_default("notifier.endpoint", "http://localhost:9090/notify")?
                    .set_default("notifier.request_timeout_seconds", 10)?
                    .set_default("api.enabled", true)?
                    .set_default("api.bind_address", "0.0.0.0:8080")?
                    .set_default("api.cors_enabled", true)?
                    .set_default("api.request_timeout_seconds", 30)?;
            }
        }

        // 环境变量覆盖具有最高优先级
        builder = builder.add_source(
            Environment::with_prefix("COURIER")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = builder
            .build()
            .context("构建配置失败")?
            .try_deserialize()
            .context("反序列化配置失败")?;

        config.validate()?;
        Ok(config)
    }

    /// 校验配置的合法性
    pub fn validate(&self) -> Result<()> {
        self.database.validate()?;
        self.dispatcher.validate()?;
        self.notifier.validate()?;
        self.api.validate()?;
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn validate(&self) -> Result<()> {
        if self.url.is_empty() {
            return Err(anyhow::anyhow!("数据库地址不能为空"));
        }
        if self.max_connections == 0 {
            return Err(anyhow::anyhow!("最大连接数必须大于0"));
        }
        if self.min_connections > self.max_connections {
            return Err(anyhow::anyhow!("最小连接数不能大于最大连接数"));
        }
        Ok(())
    }
}

impl DispatcherConfig {
    pub fn validate(&self) -> Result<()> {
        if self.offer_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("接单时限必须大于0"));
        }
        Ok(())
    }
}

impl NotifierConfig {
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(anyhow::anyhow!("通知网关地址不能为空"));
        }
        if self.request_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("通知请求超时必须大于0"));
        }
        Ok(())
    }
}

impl ApiConfig {
    pub fn validate(&self) -> Result<()> {
        if self.bind_address.is_empty() {
            return Err(anyhow::anyhow!("API监听地址不能为空"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.dispatcher.offer_timeout_seconds, 30);
    }

    #[test]
    fn load_without_file_uses_defaults() {
        let config = AppConfig::load(None).unwrap();
        assert_eq!(config.database.url, "sqlite://courier.db");
        assert!(config.api.enabled);
    }

    #[test]
    fn load_missing_file_fails() {
        let result = AppConfig::load(Some("/nonexistent/courier.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn load_from_toml_file() {
        let mut file = tempfile::NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[database]
url = "sqlite::memory:"
max_connections = 2
min_connections = 1
connection_timeout_seconds = 5

[dispatcher]
offer_timeout_seconds = 15

[notifier]
endpoint = "http://gateway:9090/notify"
request_timeout_seconds = 3

[api]
enabled = false
bind_address = "127.0.0.1:9000"
cors_enabled = false
request_timeout_seconds = 10
"#
        )
        .unwrap();

        let config = AppConfig::load(Some(file.path().to_str().unwrap())).unwrap();
        assert_eq!(config.dispatcher.offer_timeout_seconds, 15);
        assert_eq!(config.api.bind_address, "127.0.0.1:9000");
        assert!(!config.api.enabled);
    }

    #[test]
    fn zero_offer_timeout_is_rejected() {
        let mut config = AppConfig::default();
        config.dispatcher.offer_timeout_seconds = 0;
        assert!(config.validate().is_err());
    }
}
