// ==========================================
// MCA 线索管理系统 - 导入层
// ==========================================
// 职责: 外部表格导入，生成线索
// 支持: Excel (.xlsx/.xls), CSV
// ==========================================

// 模块声明
pub mod date_normalizer;
pub mod error;
pub mod file_parser;
pub mod header_resolver;
pub mod lead_importer_impl;
pub mod lead_importer_trait;
pub mod row_grouping;

// 重导出核心类型
pub use date_normalizer::DateNormalizer;
pub use error::{ImportError, ImportResult};
pub use file_parser::{CsvParser, ExcelParser, SourceFormat, UniversalFileParser};
pub use header_resolver::{normalize_header, synonyms_for, HeaderResolver};
pub use lead_importer_impl::LeadImporterImpl;
pub use row_grouping::{
    GroupingAccumulator, GroupingOptions, GroupingOutcome, RowGroupingEngine,
    DEFAULT_FOLLOW_UP_OFFSET_DAYS,
};

// 重导出 Trait 接口
pub use lead_importer_trait::{FileParser, ImportOutcome, LeadImporter};
