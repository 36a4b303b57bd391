// ==========================================
// MCA 线索管理系统 - 线索导出器
// ==========================================
// 职责: 线索列表 → 展开行 → .xlsx 文件；导入模板生成
// 说明: 每次导出重新读取字段注册表快照
// ==========================================

use crate::config::ImportConfigReader;
use crate::domain::lead::Lead;
use crate::domain::sheet::ExportSheet;
use crate::exporter::error::ExportResult;
use crate::exporter::flattener::{AssigneeNameLookup, EntityFlattener};
use crate::exporter::template::{template_lead, BlankAssignee, TEMPLATE_FILE_NAME};
use crate::exporter::xlsx_writer::{XlsxWriter, EXPORT_SHEET_NAME, TEMPLATE_SHEET_NAME};
use chrono::{Local, NaiveDate};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};

/// 导出文件名: mca_leads_export_{YYYY-MM-DD}.xlsx
pub fn export_file_name(date: NaiveDate) -> String {
    format!("mca_leads_export_{}.xlsx", date.format("%Y-%m-%d"))
}

// ==========================================
// ExportOutcome - 单次导出结果
// ==========================================
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportOutcome {
    pub file_path: PathBuf,
    pub exported_leads: usize,
    pub exported_rows: usize,
    pub file_size: usize,
}

// ==========================================
// LeadExporter - 线索导出器
// ==========================================
pub struct LeadExporter<C>
where
    C: ImportConfigReader,
{
    config: C,
    today: Option<NaiveDate>,
}

impl<C> LeadExporter<C>
where
    C: ImportConfigReader,
{
    pub fn new(config: C) -> Self {
        Self {
            config,
            today: None,
        }
    }

    /// 固定导出日期（文件名与模板 createdAt）
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    /// 生成导出表（不写文件）
    pub async fn build_sheet(
        &self,
        leads: &[Lead],
        lookup: &(dyn AssigneeNameLookup + Sync),
    ) -> ExportResult<ExportSheet> {
        let registry = self.config.get_field_registry().await?;
        Ok(EntityFlattener::new().flatten(leads, &registry, lookup))
    }

    /// 导出到目录，文件名按当天日期生成
    pub async fn export_to_dir(
        &self,
        leads: &[Lead],
        lookup: &(dyn AssigneeNameLookup + Sync),
        output_dir: &Path,
    ) -> ExportResult<ExportOutcome> {
        let path = output_dir.join(export_file_name(self.today()));
        self.export_to_path(leads, lookup, &path).await
    }

    /// 导出到指定路径
    #[instrument(skip(self, leads, lookup), fields(lead_count = leads.len()))]
    pub async fn export_to_path(
        &self,
        leads: &[Lead],
        lookup: &(dyn AssigneeNameLookup + Sync),
        path: &Path,
    ) -> ExportResult<ExportOutcome> {
        let sheet = self.build_sheet(leads, lookup).await?;
        let file_size = XlsxWriter::new(EXPORT_SHEET_NAME)
            .write_file(&sheet, path)
            .await?;

        info!(exported_rows = sheet.rows.len(), "线索导出完成");
        Ok(ExportOutcome {
            file_path: path.to_path_buf(),
            exported_leads: leads.len(),
            exported_rows: sheet.rows.len(),
            file_size,
        })
    }

    /// 生成导入模板表（无 Created Date 列）
    pub async fn build_template_sheet(&self) -> ExportResult<ExportSheet> {
        let registry = self.config.get_field_registry().await?;
        Ok(EntityFlattener::new().without_created_date().flatten(
            &[template_lead(self.today())],
            &registry,
            &BlankAssignee,
        ))
    }

    /// 写出导入模板到目录
    #[instrument(skip(self))]
    pub async fn export_template(&self, output_dir: &Path) -> ExportResult<ExportOutcome> {
        let sheet = self.build_template_sheet().await?;
        let path = output_dir.join(TEMPLATE_FILE_NAME);
        let file_size = XlsxWriter::new(TEMPLATE_SHEET_NAME)
            .write_file(&sheet, &path)
            .await?;

        Ok(ExportOutcome {
            file_path: path,
            exported_leads: 1,
            exported_rows: sheet.rows.len(),
            file_size,
        })
    }
}
