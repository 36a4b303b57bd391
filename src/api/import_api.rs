// ==========================================
// MCA 线索管理系统 - 导入导出 API
// ==========================================
// 职责: 表格导入（合并进线索簿）、线索导出、导入模板
// 说明: 每次调用重新读取配置；导入失败时线索簿保持不变
// ==========================================

use crate::api::error::ApiResult;
use crate::config::ConfigManager;
use crate::domain::lead::Lead;
use crate::engine::LeadBook;
use crate::exporter::{AssigneeNameLookup, ExportOutcome, LeadExporter};
use crate::importer::{LeadImporter, LeadImporterImpl};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// 导入API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportApiResponse {
    /// 导入批次ID
    pub batch_id: String,
    pub file_name: String,
    /// 解析出的数据行数
    pub total_rows: usize,
    /// 新增线索数
    pub imported_leads: usize,
    /// 新增董事数（含占位董事）
    pub imported_directors: usize,
    /// 跳过的行数（空白行 / 无法确定公司）
    pub skipped_rows: usize,
    /// 导入耗时（毫秒）
    pub elapsed_ms: u64,
    pub message: String,
}

/// 导出API响应
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportApiResponse {
    pub file_path: PathBuf,
    pub exported_leads: usize,
    pub exported_rows: usize,
    pub message: String,
}

impl ExportApiResponse {
    fn from_outcome(outcome: ExportOutcome, message: &str) -> Self {
        Self {
            file_path: outcome.file_path,
            exported_leads: outcome.exported_leads,
            exported_rows: outcome.exported_rows,
            message: message.to_string(),
        }
    }
}

/// 导入导出API
pub struct ImportApi {
    config_manager: Arc<ConfigManager>,
    today: Option<NaiveDate>,
}

impl ImportApi {
    pub fn new(config_manager: Arc<ConfigManager>) -> Self {
        Self {
            config_manager,
            today: None,
        }
    }

    /// 固定业务日期（导入 createdAt / 导出文件名）
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn importer(&self) -> LeadImporterImpl<Arc<ConfigManager>> {
        let importer = LeadImporterImpl::new(self.config_manager.clone());
        match self.today {
            Some(today) => importer.with_today(today),
            None => importer,
        }
    }

    fn exporter(&self) -> LeadExporter<Arc<ConfigManager>> {
        let exporter = LeadExporter::new(self.config_manager.clone());
        match self.today {
            Some(today) => exporter.with_today(today),
            None => exporter,
        }
    }

    /// 导入表格并合并进线索簿
    ///
    /// # 参数
    /// - book: 目标线索簿
    /// - file_path: .xlsx / .xls / .csv 文件路径
    /// - default_assignee: 新线索负责人（None 时取配置默认值）
    pub async fn import_leads(
        &self,
        book: &mut LeadBook,
        file_path: &Path,
        default_assignee: Option<&str>,
    ) -> ApiResult<ImportApiResponse> {
        let outcome = self
            .importer()
            .import_file(file_path, default_assignee)
            .await?;
        let summary = outcome.summary;

        book.merge_imported(outcome.leads)?;

        let message = if summary.skipped_rows > 0 {
            format!(
                "Successfully imported {} leads. {} rows skipped (empty or invalid data).",
                summary.imported_leads, summary.skipped_rows
            )
        } else {
            format!("Successfully imported {} leads!", summary.imported_leads)
        };
        info!(batch_id = %outcome.batch_id, %message, "导入完成");

        Ok(ImportApiResponse {
            batch_id: outcome.batch_id,
            file_name: outcome.file_name,
            total_rows: summary.total_rows,
            imported_leads: summary.imported_leads,
            imported_directors: summary.imported_directors,
            skipped_rows: summary.skipped_rows,
            elapsed_ms: outcome.elapsed_ms,
            message,
        })
    }

    /// 导出线索到目录（文件名 mca_leads_export_{日期}.xlsx）
    pub async fn export_leads(
        &self,
        leads: &[Lead],
        users: &(dyn AssigneeNameLookup + Sync),
        output_dir: &Path,
    ) -> ApiResult<ExportApiResponse> {
        let outcome = self.exporter().export_to_dir(leads, users, output_dir).await?;
        Ok(ExportApiResponse::from_outcome(
            outcome,
            "Leads exported successfully!",
        ))
    }

    /// 写出导入模板
    pub async fn export_template(&self, output_dir: &Path) -> ApiResult<ExportApiResponse> {
        let outcome = self.exporter().export_template(output_dir).await?;
        Ok(ExportApiResponse::from_outcome(
            outcome,
            "Template downloaded successfully! Use this format for imports.",
        ))
    }
}
