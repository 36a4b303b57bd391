// ==========================================
// MCA 线索管理系统 - 导出层
// ==========================================
// 职责: 线索展开为表格行并写出 .xlsx；导入模板
// ==========================================

pub mod error;
pub mod flattener;
pub mod lead_exporter;
pub mod template;
pub mod xlsx_writer;

pub use error::{ExportError, ExportResult};
pub use flattener::{AssigneeNameLookup, EntityFlattener, UNASSIGNED_LABEL};
pub use lead_exporter::{export_file_name, ExportOutcome, LeadExporter};
pub use template::{template_lead, TEMPLATE_FILE_NAME};
pub use xlsx_writer::{XlsxWriter, EXPORT_SHEET_NAME, TEMPLATE_SHEET_NAME};
