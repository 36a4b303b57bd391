// ==========================================
// MCA 线索管理系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite（配置）+ xlsx/csv 表格
// 系统定位: 线索表格导入导出与生命周期管理
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 字段注册表与线索实体
pub mod domain;

// 引擎层 - 线索生命周期规则
pub mod engine;

// 导入层 - 表格 → 线索
pub mod importer;

// 导出层 - 线索 → 表格
pub mod exporter;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::{
    Director, ExportSheet, FieldDataType, FieldDescriptor, FieldRegistry, ImportSummary, Lead,
    LeadStatus, LostLead, RawRow,
};

// 引擎
pub use engine::{LeadBook, LeadBookError, LeadFilter, LeadPatch};

// 导入导出
pub use exporter::{EntityFlattener, LeadExporter, XlsxWriter};
pub use importer::{LeadImporter, LeadImporterImpl, RowGroupingEngine};

// API
pub use api::{ApiError, ApiResult, ConfigApi, ImportApi, LeadApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "MCA 线索管理系统";
