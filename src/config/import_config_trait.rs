// ==========================================
// MCA 线索管理系统 - 导入导出配置读取 Trait
// ==========================================
// 职责: 定义导入/导出所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// 说明: 每次导入/导出开始时重新读取，作为不可变快照向下传递
// ==========================================

use crate::config::error::ConfigResult;
use crate::domain::field::FieldRegistry;
use crate::importer::row_grouping::DEFAULT_FOLLOW_UP_OFFSET_DAYS;
use async_trait::async_trait;

/// 默认负责人（用户 ID）
pub const DEFAULT_ASSIGNEE: &str = "1";

// ==========================================
// ImportConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）、ConfigSnapshot（内存）
#[async_trait]
pub trait ImportConfigReader: Send + Sync {
    /// 获取字段注册表
    ///
    /// # 默认值
    /// - FieldRegistry::default()（16 个 MCA 字段）
    async fn get_field_registry(&self) -> ConfigResult<FieldRegistry>;

    /// 获取默认跟进偏移天数
    ///
    /// # 默认值
    /// - 7
    async fn get_follow_up_default_days(&self) -> ConfigResult<i64>;

    /// 获取默认负责人（用户 ID）
    ///
    /// # 默认值
    /// - "1"
    async fn get_default_assignee(&self) -> ConfigResult<String>;
}

// ==========================================
// ConfigSnapshot - 单次操作的配置快照
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSnapshot {
    pub registry: FieldRegistry,
    pub follow_up_default_days: i64,
    pub default_assignee: String,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            registry: FieldRegistry::default(),
            follow_up_default_days: DEFAULT_FOLLOW_UP_OFFSET_DAYS,
            default_assignee: DEFAULT_ASSIGNEE.to_string(),
        }
    }
}

impl ConfigSnapshot {
    /// 从配置读取器加载一份完整快照
    pub async fn load<C: ImportConfigReader + ?Sized>(reader: &C) -> ConfigResult<Self> {
        Ok(Self {
            registry: reader.get_field_registry().await?,
            follow_up_default_days: reader.get_follow_up_default_days().await?,
            default_assignee: reader.get_default_assignee().await?,
        })
    }
}

#[async_trait]
impl ImportConfigReader for ConfigSnapshot {
    async fn get_field_registry(&self) -> ConfigResult<FieldRegistry> {
        Ok(self.registry.clone())
    }

    async fn get_follow_up_default_days(&self) -> ConfigResult<i64> {
        Ok(self.follow_up_default_days)
    }

    async fn get_default_assignee(&self) -> ConfigResult<String> {
        Ok(self.default_assignee.clone())
    }
}

#[async_trait]
impl<T: ImportConfigReader + ?Sized> ImportConfigReader for std::sync::Arc<T> {
    async fn get_field_registry(&self) -> ConfigResult<FieldRegistry> {
        (**self).get_field_registry().await
    }

    async fn get_follow_up_default_days(&self) -> ConfigResult<i64> {
        (**self).get_follow_up_default_days().await
    }

    async fn get_default_assignee(&self) -> ConfigResult<String> {
        (**self).get_default_assignee().await
    }
}
