// ==========================================
// MCA 线索管理系统 - 导出模块错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 导出模块错误类型
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("文件写入失败: {0}")]
    FileWriteError(String),

    #[error("工作簿打包失败: {0}")]
    ArchiveError(String),

    #[error("工作表 XML 生成失败: {0}")]
    XmlError(String),

    #[error("字段配置读取失败: {0}")]
    ConfigReadError(String),
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::FileWriteError(err.to_string())
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::ArchiveError(err.to_string())
    }
}

impl From<crate::config::ConfigError> for ExportError {
    fn from(err: crate::config::ConfigError) -> Self {
        ExportError::ConfigReadError(err.to_string())
    }
}

/// Result 类型别名
pub type ExportResult<T> = Result<T, ExportError>;
