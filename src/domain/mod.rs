// ==========================================
// MCA 线索管理系统 - 领域模型层
// ==========================================
// 职责: 定义字段注册表、线索实体、表格行模型
// 红线: 不含文件读写逻辑,不含导入导出流程
// ==========================================

pub mod field;
pub mod lead;
pub mod sheet;
pub mod types;

// 重导出核心类型
pub use field::{
    is_director_key, DirectorField, FieldDescriptor, FieldRegistry, RegistryError,
    ASSIGNED_TO_KEY, CIN_KEY, COMPANY_NAME_KEY, CREATED_DATE_HEADER, FOLLOW_UP_DATE_KEY,
    STATUS_KEY,
};
pub use lead::{
    director_id, Director, FollowUpEvent, Lead, LeadError, LegacyDirectorView, LostLead,
};
pub use sheet::{ExportSheet, ImportSummary, RawRow};
pub use types::{FieldDataType, LeadStatus};
