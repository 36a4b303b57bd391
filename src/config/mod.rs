// ==========================================
// MCA 线索管理系统 - 配置层
// ==========================================
// 职责: 字段注册表与导入默认值的存取
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod error;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, MAX_FOLLOW_UP_DEFAULT_DAYS};
pub use error::{ConfigError, ConfigResult};
pub use import_config_trait::{ConfigSnapshot, ImportConfigReader, DEFAULT_ASSIGNEE};
