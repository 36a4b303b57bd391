// ==========================================
// MCA 线索管理系统 - 线索导入器实现
// ==========================================
// 职责: 整合导入流程，从文件到线索列表
// 流程: 格式检查 → 读取 → 解析 → 配置快照 → 行归并 → 汇总
// 说明: 不直接写入线索簿，由调用方整体合并（全有或全无）
// ==========================================

use crate::config::{ConfigSnapshot, ImportConfigReader};
use crate::importer::error::ImportResult;
use crate::importer::file_parser::SourceFormat;
use crate::importer::lead_importer_trait::{ImportOutcome, LeadImporter};
use crate::importer::row_grouping::{GroupingOptions, RowGroupingEngine};
use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

// ==========================================
// LeadImporterImpl - 线索导入器实现
// ==========================================
pub struct LeadImporterImpl<C>
where
    C: ImportConfigReader,
{
    // 配置读取器（每次导入重新读取）
    config: C,

    // 固定导入日期；None 时取本地当天
    today: Option<NaiveDate>,
}

impl<C> LeadImporterImpl<C>
where
    C: ImportConfigReader,
{
    pub fn new(config: C) -> Self {
        Self {
            config,
            today: None,
        }
    }

    /// 固定导入日期（createdAt 与默认跟进日期的基准）
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Local::now().date_naive())
    }

    async fn import_parsed(
        &self,
        format: SourceFormat,
        file_name: &str,
        bytes: &[u8],
        default_assignee: Option<&str>,
    ) -> ImportResult<ImportOutcome> {
        let start_time = Instant::now();
        let batch_id = Uuid::new_v4().to_string();

        // === 步骤 1: 解析文件 ===
        let rows = format.parser().parse_to_raw_rows(bytes)?;
        debug!(batch_id = %batch_id, rows = rows.len(), "文件解析完成");

        // === 步骤 2: 读取配置快照 ===
        let snapshot = ConfigSnapshot::load(&self.config).await?;
        let duplicates = snapshot.registry.duplicate_export_headers();
        if !duplicates.is_empty() {
            warn!(?duplicates, "字段注册表存在重复的导出列名");
        }

        let assignee = default_assignee
            .map(str::trim)
            .filter(|a| !a.is_empty())
            .map(str::to_string)
            .unwrap_or(snapshot.default_assignee);

        // === 步骤 3: 行归并 ===
        let options = GroupingOptions::new(assignee, self.today())
            .with_follow_up_offset_days(snapshot.follow_up_default_days);
        let outcome = RowGroupingEngine::new(&snapshot.registry, options).group(&rows);
        let summary = outcome.summary();

        let elapsed_ms = start_time.elapsed().as_millis() as u64;
        info!(
            batch_id = %batch_id,
            total_rows = summary.total_rows,
            imported_leads = summary.imported_leads,
            imported_directors = summary.imported_directors,
            skipped_rows = summary.skipped_rows,
            elapsed_ms,
            "线索导入完成"
        );

        Ok(ImportOutcome {
            batch_id,
            file_name: file_name.to_string(),
            leads: outcome.leads,
            summary,
            elapsed_ms,
        })
    }
}

#[async_trait]
impl<C> LeadImporter for LeadImporterImpl<C>
where
    C: ImportConfigReader,
{
    #[instrument(skip(self, file_path), fields(file_path = %file_path.display()))]
    async fn import_file(
        &self,
        file_path: &Path,
        default_assignee: Option<&str>,
    ) -> ImportResult<ImportOutcome> {
        // 扩展名不支持时在读取前拒绝
        let format = SourceFormat::from_path(file_path)?;
        let bytes = tokio::fs::read(file_path).await?;

        let file_name = file_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        info!(file_name = %file_name, size = bytes.len(), "开始导入线索");

        self.import_parsed(format, &file_name, &bytes, default_assignee)
            .await
    }

    #[instrument(skip(self, bytes))]
    async fn import_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        default_assignee: Option<&str>,
    ) -> ImportResult<ImportOutcome> {
        let format = SourceFormat::from_path(Path::new(file_name))?;
        info!(size = bytes.len(), "开始导入线索");
        self.import_parsed(format, file_name, bytes, default_assignee)
            .await
    }
}
