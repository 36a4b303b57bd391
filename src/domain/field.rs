// ==========================================
// MCA 线索管理系统 - 字段注册表
// ==========================================
// 职责: 有序字段描述符列表（表单布局 / 导入列匹配 / 导出列顺序）
// 红线: companyName 必须存在、必填且在表单中可见
// ==========================================

use crate::domain::types::FieldDataType;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

// ===== 固定字段键 =====
pub const CIN_KEY: &str = "cin";
pub const COMPANY_NAME_KEY: &str = "companyName";
pub const STATUS_KEY: &str = "status";
pub const FOLLOW_UP_DATE_KEY: &str = "followUpDate";
pub const ASSIGNED_TO_KEY: &str = "assignedTo";

/// 导出时固定追加的创建日期列
pub const CREATED_DATE_HEADER: &str = "Created Date";

// ==========================================
// DirectorField - 董事级字段
// ==========================================
// 这些字段属于董事子记录，不属于线索主体
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DirectorField {
    ExternalId, // din
    FirstName,  // directorFirstName
    LastName,   // directorLastName
    Phone,      // mobile
    Email,      // directorEmail
}

impl DirectorField {
    pub const ALL: [DirectorField; 5] = [
        DirectorField::ExternalId,
        DirectorField::FirstName,
        DirectorField::LastName,
        DirectorField::Phone,
        DirectorField::Email,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            DirectorField::ExternalId => "din",
            DirectorField::FirstName => "directorFirstName",
            DirectorField::LastName => "directorLastName",
            DirectorField::Phone => "mobile",
            DirectorField::Email => "directorEmail",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }
}

/// 判断字段键是否为董事级字段
pub fn is_director_key(key: &str) -> bool {
    DirectorField::from_key(key).is_some()
}

// ==========================================
// FieldDescriptor - 字段描述符
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDescriptor {
    pub key: String,              // 唯一且稳定的字段标识
    pub label: String,            // 表单显示名
    pub data_type: FieldDataType, // 数据类型
    pub required: bool,           // 是否必填
    pub visible_in_form: bool,    // 表单中可见
    pub visible_in_export: bool,  // 导出中可见
    pub export_header: String,    // 导出列名（同时作为导入首选列名）
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,     // enum 类型的可选值
}

impl FieldDescriptor {
    /// 创建默认可见、非必填的字段，导出列名默认与 label 相同
    pub fn new(key: &str, label: &str, data_type: FieldDataType) -> Self {
        Self {
            key: key.to_string(),
            label: label.to_string(),
            data_type,
            required: false,
            visible_in_form: true,
            visible_in_export: true,
            export_header: label.to_string(),
            options: Vec::new(),
        }
    }

    pub fn with_export_header(mut self, header: &str) -> Self {
        self.export_header = header.to_string();
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn hidden_in_form(mut self) -> Self {
        self.visible_in_form = false;
        self
    }

    pub fn hidden_in_export(mut self) -> Self {
        self.visible_in_export = false;
        self
    }

    pub fn with_options(mut self, options: &[&str]) -> Self {
        self.options = options.iter().map(|o| o.to_string()).collect();
        self
    }

    pub fn is_director_scoped(&self) -> bool {
        is_director_key(&self.key)
    }

    /// 董事级字段对应的董事属性
    pub fn director_field(&self) -> Option<DirectorField> {
        DirectorField::from_key(&self.key)
    }
}

// ==========================================
// 注册表错误
// ==========================================
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("字段注册表缺少 companyName 字段")]
    MissingCompanyName,

    #[error("companyName 字段必须为必填且在表单中可见")]
    CompanyNameNotEnforced,

    #[error("字段键重复: {0}")]
    DuplicateKey(String),

    #[error("字段键为空 (位置 {0})")]
    EmptyKey(usize),
}

// ==========================================
// FieldRegistry - 字段注册表
// ==========================================
// 顺序决定表单布局与导出列顺序；查询按 key
// 每次导入/导出由调用方取一次快照并显式传入
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<FieldDescriptor>", into = "Vec<FieldDescriptor>")]
pub struct FieldRegistry {
    fields: Vec<FieldDescriptor>,
    index: HashMap<String, usize>,
}

impl FieldRegistry {
    /// 从描述符列表构建注册表（校验不变量）
    pub fn new(fields: Vec<FieldDescriptor>) -> Result<Self, RegistryError> {
        let mut index = HashMap::with_capacity(fields.len());
        for (pos, field) in fields.iter().enumerate() {
            if field.key.trim().is_empty() {
                return Err(RegistryError::EmptyKey(pos));
            }
            if index.insert(field.key.clone(), pos).is_some() {
                return Err(RegistryError::DuplicateKey(field.key.clone()));
            }
        }

        let company = index
            .get(COMPANY_NAME_KEY)
            .map(|&pos| &fields[pos])
            .ok_or(RegistryError::MissingCompanyName)?;
        if !company.required || !company.visible_in_form {
            return Err(RegistryError::CompanyNameNotEnforced);
        }

        Ok(Self { fields, index })
    }

    pub fn get(&self, key: &str) -> Option<&FieldDescriptor> {
        self.index.get(key).map(|&pos| &self.fields[pos])
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter()
    }

    /// 线索主体字段（排除董事级字段）
    pub fn core_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| !f.is_director_scoped())
    }

    /// 导出可见字段（保持注册表顺序）
    pub fn export_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.visible_in_export)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.required)
    }

    /// 导出可见字段中重复的导出列名
    ///
    /// 重复列名会导致导出时后写覆盖先写，此处仅报告不拒绝
    pub fn duplicate_export_headers(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut duplicates = Vec::new();
        for field in self.export_fields() {
            if !seen.insert(field.export_header.as_str())
                && !duplicates.contains(&field.export_header)
            {
                duplicates.push(field.export_header.clone());
            }
        }
        duplicates
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl TryFrom<Vec<FieldDescriptor>> for FieldRegistry {
    type Error = RegistryError;

    fn try_from(fields: Vec<FieldDescriptor>) -> Result<Self, Self::Error> {
        Self::new(fields)
    }
}

impl From<FieldRegistry> for Vec<FieldDescriptor> {
    fn from(registry: FieldRegistry) -> Self {
        registry.fields
    }
}

impl Default for FieldRegistry {
    /// MCA 数据默认字段配置
    fn default() -> Self {
        use FieldDataType::*;

        let fields = vec![
            FieldDescriptor::new(CIN_KEY, "CIN", Text),
            FieldDescriptor::new(COMPANY_NAME_KEY, "Company Name", Text).required(),
            FieldDescriptor::new("authorisedCapital", "Authorised Capital", Text)
                .with_export_header("Authorised Capital(₹)"),
            FieldDescriptor::new("paidUpCapital", "Paid up Capital", Text)
                .with_export_header("Paid up Capital(₹)"),
            FieldDescriptor::new("dateOfIncorporation", "Date of Incorporation", Date),
            FieldDescriptor::new("registeredAddress", "Registered Address", LongText),
            FieldDescriptor::new("companyEmail", "Company Email", Email)
                .with_export_header("Company E-mail id"),
            FieldDescriptor::new("din", "DIN", Text),
            FieldDescriptor::new("directorFirstName", "Director First Name", Text)
                .with_export_header("F Name"),
            FieldDescriptor::new("directorLastName", "Director Last Name", Text)
                .with_export_header("L Name"),
            FieldDescriptor::new("mobile", "Mobile", Phone),
            FieldDescriptor::new("directorEmail", "Director Email", Email)
                .with_export_header("Director E-mail id"),
            FieldDescriptor::new(STATUS_KEY, "Status", Enum)
                .required()
                .with_options(&["Hot", "Warm", "Cold", "Converted", "Lost"]),
            FieldDescriptor::new(FOLLOW_UP_DATE_KEY, "Follow-up Date", Date).required(),
            FieldDescriptor::new("notes", "Notes", LongText),
            FieldDescriptor::new(ASSIGNED_TO_KEY, "Assigned To", Text).hidden_in_form(),
        ];

        let index = fields
            .iter()
            .enumerate()
            .map(|(pos, f)| (f.key.clone(), pos))
            .collect();
        Self { fields, index }
    }
}
