// ==========================================
// MCA 线索管理系统 - 领域类型定义
// ==========================================
// 职责: 线索状态、字段数据类型等枚举
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 线索状态 (Lead Status)
// ==========================================
// 序列化格式: 与导出表格一致（Hot/Warm/Cold/Converted/Lost）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum LeadStatus {
    Hot,       // 高意向
    Warm,      // 跟进中
    #[default]
    Cold,      // 冷线索（导入默认值）
    Converted, // 已成交
    Lost,      // 已流失
}

impl LeadStatus {
    /// 全部状态（按展示顺序）
    pub const ALL: [LeadStatus; 5] = [
        LeadStatus::Hot,
        LeadStatus::Warm,
        LeadStatus::Cold,
        LeadStatus::Converted,
        LeadStatus::Lost,
    ];

    /// 大小写不敏感地匹配状态文本
    ///
    /// # 返回
    /// - Some(LeadStatus): 匹配成功
    /// - None: 空值或未知状态
    pub fn from_label(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
    }

    /// 导入口径: 未知状态回退为 Cold
    pub fn parse_or_cold(value: &str) -> Self {
        Self::from_label(value).unwrap_or_default()
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeadStatus::Hot => "Hot",
            LeadStatus::Warm => "Warm",
            LeadStatus::Cold => "Cold",
            LeadStatus::Converted => "Converted",
            LeadStatus::Lost => "Lost",
        }
    }
}

impl fmt::Display for LeadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==========================================
// 字段数据类型 (Field Data Type)
// ==========================================
// 决定表单控件以及导入时的值处理方式（date 走日期标准化）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldDataType {
    Text,
    Email,
    Phone,
    Date,
    LongText,
    Enum,
}

impl fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldDataType::Text => write!(f, "text"),
            FieldDataType::Email => write!(f, "email"),
            FieldDataType::Phone => write!(f, "phone"),
            FieldDataType::Date => write!(f, "date"),
            FieldDataType::LongText => write!(f, "longtext"),
            FieldDataType::Enum => write!(f, "enum"),
        }
    }
}
