// ==========================================
// MCA 线索管理系统 - 配置管理 API
// ==========================================
// 职责: 字段注册表维护、导入默认值设置、配置快照查询
// ==========================================

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::api::error::ApiResult;
use crate::config::{ConfigManager, ConfigSnapshot};
use crate::domain::field::FieldDescriptor;

/// 字段注册表视图
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldRegistryView {
    pub fields: Vec<FieldDescriptor>,
    /// 重复的导出列名（允许保存，导出时后者覆盖前者）
    pub duplicate_export_headers: Vec<String>,
}

/// 导入默认值
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportDefaults {
    pub follow_up_default_days: i64,
    pub default_assignee: String,
}

// ==========================================
// ConfigApi - 配置管理 API
// ==========================================
pub struct ConfigApi {
    config_manager: Arc<ConfigManager>,
}

impl ConfigApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self { config_manager }
    }

    /// 查询当前字段注册表（未配置时为默认注册表）
    pub fn list_fields(&self) -> ApiResult<FieldRegistryView> {
        let registry = self.config_manager.load_field_registry()?;
        Ok(FieldRegistryView {
            duplicate_export_headers: registry.duplicate_export_headers(),
            fields: registry.fields().to_vec(),
        })
    }

    /// 保存字段注册表
    ///
    /// # 返回
    /// - Err(ApiError::ValidationError): companyName 缺失/非必填/表单隐藏，或字段键重复
    pub fn save_fields(&self, fields: Vec<FieldDescriptor>) -> ApiResult<FieldRegistryView> {
        let registry = self.config_manager.save_field_descriptors(fields)?;
        Ok(FieldRegistryView {
            duplicate_export_headers: registry.duplicate_export_headers(),
            fields: registry.fields().to_vec(),
        })
    }

    pub fn reset_fields(&self) -> ApiResult<FieldRegistryView> {
        self.config_manager.reset_field_registry()?;
        self.list_fields()
    }

    pub async fn get_import_defaults(&self) -> ApiResult<ImportDefaults> {
        let snapshot = ConfigSnapshot::load(self.config_manager.as_ref()).await?;
        Ok(ImportDefaults {
            follow_up_default_days: snapshot.follow_up_default_days,
            default_assignee: snapshot.default_assignee,
        })
    }

    pub fn set_follow_up_default_days(&self, days: i64) -> ApiResult<()> {
        Ok(self.config_manager.set_follow_up_default_days(days)?)
    }

    pub fn set_default_assignee(&self, user_id: &str) -> ApiResult<()> {
        Ok(self.config_manager.set_default_assignee(user_id)?)
    }

    /// 已存储配置的原始快照（key → value）
    pub fn config_snapshot(&self) -> ApiResult<BTreeMap<String, String>> {
        Ok(self.config_manager.get_config_snapshot()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::error::ApiError;
    use crate::domain::types::FieldDataType;
    use rusqlite::Connection;
    use std::sync::Mutex;

    fn api() -> ConfigApi {
        let conn = Connection::open_in_memory().unwrap();
        let manager = ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap();
        ConfigApi::new(Arc::new(manager))
    }

    #[test]
    fn test_save_and_reset_fields() {
        let api = api();
        let mut fields = api.list_fields().unwrap().fields;
        fields.push(FieldDescriptor::new("website", "Website", FieldDataType::Text));

        let saved = api.save_fields(fields).unwrap();
        assert!(saved.fields.iter().any(|f| f.key == "website"));
        assert!(api.list_fields().unwrap().fields.iter().any(|f| f.key == "website"));
        assert!(api.config_snapshot().unwrap().contains_key("field_registry"));

        let reset = api.reset_fields().unwrap();
        assert!(!reset.fields.iter().any(|f| f.key == "website"));
    }

    #[test]
    fn test_save_without_company_name_rejected() {
        let api = api();
        let fields: Vec<FieldDescriptor> = api
            .list_fields()
            .unwrap()
            .fields
            .into_iter()
            .filter(|f| f.key != "companyName")
            .collect();

        let err = api.save_fields(fields).unwrap_err();
        assert!(matches!(err, ApiError::ValidationError(_)));
    }

    #[tokio::test]
    async fn test_import_defaults_roundtrip() {
        let api = api();
        let defaults = api.get_import_defaults().await.unwrap();
        assert_eq!(defaults.follow_up_default_days, 7);
        assert_eq!(defaults.default_assignee, "1");

        api.set_follow_up_default_days(3).unwrap();
        api.set_default_assignee("5").unwrap();
        let defaults = api.get_import_defaults().await.unwrap();
        assert_eq!(defaults.follow_up_default_days, 3);
        assert_eq!(defaults.default_assignee, "5");

        assert!(matches!(
            api.set_follow_up_default_days(-1),
            Err(ApiError::ValidationError(_))
        ));
    }
}
