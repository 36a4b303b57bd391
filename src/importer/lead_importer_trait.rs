// ==========================================
// MCA 线索管理系统 - 线索导入 Trait
// ==========================================
// 职责: 定义线索导入接口（不包含实现）
// 流程: 格式检查 → 读取字节 → 解析原始行 → 读取配置快照 → 行归并
// ==========================================

use crate::domain::lead::Lead;
use crate::domain::sheet::{ImportSummary, RawRow};
use crate::importer::error::ImportResult;
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;

// ==========================================
// ImportOutcome - 单次导入结果
// ==========================================
// 导入要么整体成功（线索可能为空，附跳过计数），要么整体失败
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportOutcome {
    pub batch_id: String,
    pub file_name: String,
    pub leads: Vec<Lead>,
    pub summary: ImportSummary,
    pub elapsed_ms: u64,
}

// ==========================================
// LeadImporter Trait
// ==========================================
// 用途: 线索导入主接口
// 实现者: LeadImporterImpl
#[async_trait]
pub trait LeadImporter: Send + Sync {
    /// 从文件导入线索
    ///
    /// # 参数
    /// - file_path: .xlsx / .xls / .csv 文件路径
    /// - default_assignee: 新线索负责人；None 时使用配置中的默认负责人
    ///
    /// # 返回
    /// - Ok(ImportOutcome): 归并后的线索与汇总
    /// - Err: 格式不支持（读取前拒绝）、读取失败、解析失败、配置读取失败
    async fn import_file(
        &self,
        file_path: &Path,
        default_assignee: Option<&str>,
    ) -> ImportResult<ImportOutcome>;

    /// 从内存字节导入线索（文件名仅用于格式识别）
    async fn import_bytes(
        &self,
        file_name: &str,
        bytes: &[u8],
        default_assignee: Option<&str>,
    ) -> ImportResult<ImportOutcome>;
}

// ==========================================
// FileParser Trait
// ==========================================
// 用途: 文件解析接口（阶段 0）
// 实现者: CsvParser, ExcelParser
pub trait FileParser: Send + Sync {
    /// 解析文件字节为原始行（列顺序与源文件一致）
    fn parse_to_raw_rows(&self, bytes: &[u8]) -> ImportResult<Vec<RawRow>>;
}
