// ==========================================
// MCA 线索管理系统 - 配置层错误类型
// ==========================================

use crate::domain::field::RegistryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("配置数据库错误: {0}")]
    Database(String),

    #[error("锁获取失败: {0}")]
    LockPoisoned(String),

    #[error("配置序列化失败: {0}")]
    Serialization(String),

    #[error("字段注册表无效: {0}")]
    InvalidRegistry(#[from] RegistryError),

    #[error("配置值无效: {key}={value}")]
    InvalidValue { key: String, value: String },
}

impl From<rusqlite::Error> for ConfigError {
    fn from(err: rusqlite::Error) -> Self {
        ConfigError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Serialization(err.to_string())
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
