// ==========================================
// MCA 线索管理系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供 CLI 调用
// ==========================================

pub mod config_api;
pub mod error;
pub mod import_api;
pub mod lead_api;

// 重导出核心类型
pub use config_api::{ConfigApi, FieldRegistryView, ImportDefaults};
pub use error::{ApiError, ApiResult};
pub use import_api::{ExportApiResponse, ImportApi, ImportApiResponse};
pub use lead_api::{CreateLeadRequest, FollowUpCalendar, LeadApi, UPCOMING_WINDOW_DAYS};
