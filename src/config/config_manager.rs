// ==========================================
// MCA 线索管理系统 - 配置管理器
// ==========================================
// 职责: 字段注册表与导入默认值的加载、保存、重置
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::error::{ConfigError, ConfigResult};
use crate::config::import_config_trait::{ImportConfigReader, DEFAULT_ASSIGNEE};
use crate::db::{configure_sqlite_connection, ensure_schema, open_sqlite_connection};
use crate::domain::field::{FieldDescriptor, FieldRegistry};
use crate::importer::row_grouping::DEFAULT_FOLLOW_UP_OFFSET_DAYS;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info, warn};

/// 当前仅使用全局作用域
const GLOBAL_SCOPE: &str = "global";

/// 默认跟进偏移天数上限（10 年）
pub const MAX_FOLLOW_UP_DEFAULT_DAYS: i64 = 3650;

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例（自动建表）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> ConfigResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        ensure_schema(&conn)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：会对传入连接再次应用统一 PRAGMA 并建表（均幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> ConfigResult<Self> {
        {
            let guard = lock(&conn)?;
            configure_sqlite_connection(&guard)?;
            ensure_schema(&guard)?;
        }

        Ok(Self { conn })
    }

    fn get_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        let conn = lock(&self.conn)?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_config_value(&self, key: &str, value: &str) -> ConfigResult<()> {
        let conn = lock(&self.conn)?;
        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value) VALUES (?1, ?2, ?3)
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?3, updated_at = datetime('now')",
            params![GLOBAL_SCOPE, key, value],
        )?;
        debug!(config_key = key, "配置已写入");
        Ok(())
    }

    fn delete_config_value(&self, key: &str) -> ConfigResult<bool> {
        let conn = lock(&self.conn)?;
        let affected = conn.execute(
            "DELETE FROM config_kv WHERE scope_id = ?1 AND key = ?2",
            params![GLOBAL_SCOPE, key],
        )?;
        Ok(affected > 0)
    }

    /// 读取 global scope 的配置值
    pub fn get_global_config_value(&self, key: &str) -> ConfigResult<Option<String>> {
        self.get_config_value(key)
    }

    /// 获取所有配置的快照（key → value）
    pub fn get_config_snapshot(&self) -> ConfigResult<BTreeMap<String, String>> {
        let conn = lock(&self.conn)?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut snapshot = BTreeMap::new();
        for row in rows {
            let (key, value) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    // ===== 字段注册表 =====

    /// 读取字段注册表
    ///
    /// 未配置时返回默认注册表；已存储内容损坏时告警并回退默认
    pub fn load_field_registry(&self) -> ConfigResult<FieldRegistry> {
        let raw = match self.get_config_value(config_keys::FIELD_REGISTRY)? {
            Some(raw) => raw,
            None => return Ok(FieldRegistry::default()),
        };

        match serde_json::from_str::<FieldRegistry>(&raw) {
            Ok(registry) => Ok(registry),
            Err(e) => {
                warn!(
                    config_key = config_keys::FIELD_REGISTRY,
                    error = %e,
                    "字段注册表配置无效，使用默认注册表"
                );
                Ok(FieldRegistry::default())
            }
        }
    }

    /// 保存字段注册表（先校验再写入）
    ///
    /// # 校验
    /// - companyName 存在、必填、表单可见
    /// - 字段键唯一且非空
    pub fn save_field_descriptors(
        &self,
        descriptors: Vec<FieldDescriptor>,
    ) -> ConfigResult<FieldRegistry> {
        let registry = FieldRegistry::new(descriptors)?;
        self.save_field_registry(&registry)?;
        Ok(registry)
    }

    /// 保存已校验的字段注册表
    pub fn save_field_registry(&self, registry: &FieldRegistry) -> ConfigResult<()> {
        let duplicates = registry.duplicate_export_headers();
        if !duplicates.is_empty() {
            warn!(?duplicates, "导出列名重复，导出时后写入的字段会覆盖先写入的字段");
        }

        let json = serde_json::to_string(registry)?;
        self.set_config_value(config_keys::FIELD_REGISTRY, &json)?;
        info!(field_count = registry.len(), "字段注册表已保存");
        Ok(())
    }

    /// 重置字段注册表为默认值
    pub fn reset_field_registry(&self) -> ConfigResult<FieldRegistry> {
        self.delete_config_value(config_keys::FIELD_REGISTRY)?;
        info!("字段注册表已重置为默认值");
        Ok(FieldRegistry::default())
    }

    // ===== 导入默认值 =====

    /// 设置默认跟进偏移天数（0 ~ MAX_FOLLOW_UP_DEFAULT_DAYS）
    pub fn set_follow_up_default_days(&self, days: i64) -> ConfigResult<()> {
        if !(0..=MAX_FOLLOW_UP_DEFAULT_DAYS).contains(&days) {
            return Err(ConfigError::InvalidValue {
                key: config_keys::FOLLOW_UP_DEFAULT_DAYS.to_string(),
                value: days.to_string(),
            });
        }
        self.set_config_value(config_keys::FOLLOW_UP_DEFAULT_DAYS, &days.to_string())
    }

    /// 设置默认负责人（不得为空）
    pub fn set_default_assignee(&self, user_id: &str) -> ConfigResult<()> {
        let user_id = user_id.trim();
        if user_id.is_empty() {
            return Err(ConfigError::InvalidValue {
                key: config_keys::DEFAULT_ASSIGNEE.to_string(),
                value: String::new(),
            });
        }
        self.set_config_value(config_keys::DEFAULT_ASSIGNEE, user_id)
    }
}

fn lock(conn: &Arc<Mutex<Connection>>) -> ConfigResult<MutexGuard<'_, Connection>> {
    conn.lock()
        .map_err(|e| ConfigError::LockPoisoned(e.to_string()))
}

// ==========================================
// ImportConfigReader Trait 实现
// ==========================================
#[async_trait]
impl ImportConfigReader for ConfigManager {
    async fn get_field_registry(&self) -> ConfigResult<FieldRegistry> {
        self.load_field_registry()
    }

    async fn get_follow_up_default_days(&self) -> ConfigResult<i64> {
        let value = self.get_config_value(config_keys::FOLLOW_UP_DEFAULT_DAYS)?;
        Ok(value
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|days| (0..=MAX_FOLLOW_UP_DEFAULT_DAYS).contains(days))
            .unwrap_or(DEFAULT_FOLLOW_UP_OFFSET_DAYS))
    }

    async fn get_default_assignee(&self) -> ConfigResult<String> {
        let value = self.get_config_value(config_keys::DEFAULT_ASSIGNEE)?;
        Ok(value
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_ASSIGNEE.to_string()))
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    pub const FIELD_REGISTRY: &str = "field_registry";
    pub const FOLLOW_UP_DEFAULT_DAYS: &str = "follow_up_default_days";
    pub const DEFAULT_ASSIGNEE: &str = "default_assignee";
}
