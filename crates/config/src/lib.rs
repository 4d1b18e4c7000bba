//! cuba-config - 配置加载库

use figment::{
    Figment,
    providers::{Env, Format, Toml},
};
use secrecy::Secret;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] Box<figment::Error>),
}

impl From<figment::Error> for ConfigError {
    fn from(e: figment::Error) -> Self {
        Self::Load(Box::new(e))
    }
}

/// 数据库配置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: Secret<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// 启动时是否执行迁移
    #[serde(default = "default_true")]
    pub run_migrations: bool,
}

fn default_max_connections() -> u32 {
    // 开发环境: 10, 生产环境: 50
    match std::env::var("APP_ENV").as_deref() {
        Ok("production") => 50,
        _ => 10,
    }
}

fn default_true() -> bool {
    true
}

/// 遥测配置
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 输出 JSON 格式日志
    #[serde(default)]
    pub json: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            json: false,
        }
    }
}

/// 授权配置
///
/// `claim_type` 同时交给声明物化方与权限处理器，两端必须一致。
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthorizationConfig {
    #[serde(default = "default_claim_type")]
    pub claim_type: String,
    /// 动态策略缓存容量
    #[serde(default = "default_policy_cache_capacity")]
    pub policy_cache_capacity: u64,
}

fn default_claim_type() -> String {
    "permission".to_string()
}

fn default_policy_cache_capacity() -> u64 {
    1024
}

impl Default for AuthorizationConfig {
    fn default() -> Self {
        Self {
            claim_type: default_claim_type(),
            policy_cache_capacity: default_policy_cache_capacity(),
        }
    }
}

/// 权限目录中声明的权限
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionSeed {
    pub name: String,
    pub display_name: Option<String>,
    pub description: Option<String>,
}

/// 权限目录中声明的权限组
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PermissionGroupSeed {
    pub name: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub permissions: Vec<PermissionSeed>,
}

/// 启动时同步的权限目录
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CatalogConfig {
    #[serde(default)]
    pub groups: Vec<PermissionGroupSeed>,
    /// 不属于任何组的权限
    #[serde(default)]
    pub permissions: Vec<PermissionSeed>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub app_name: String,
    #[serde(default = "default_app_env")]
    pub app_env: String,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub authorization: AuthorizationConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
}

fn default_app_env() -> String {
    "development".to_string()
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 合并顺序：`default.toml` < `{APP_ENV}.toml` < `APP_` 前缀环境变量 (`__` 分隔层级)
    pub fn load(config_dir: &str) -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| default_app_env());

        let figment = Figment::new()
            .merge(Toml::file(format!("{}/default.toml", config_dir)))
            .merge(Toml::file(format!("{}/{}.toml", config_dir, env)))
            .merge(Env::prefixed("APP_").split("__"));

        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.app_env == "production"
    }
}
