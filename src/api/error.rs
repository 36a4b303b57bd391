// ==========================================
// MCA 线索管理系统 - API层错误类型
// ==========================================
// 职责: 将各层错误转换为单条用户可读的错误消息
// ==========================================

use crate::config::ConfigError;
use crate::engine::LeadBookError;
use crate::exporter::ExportError;
use crate::importer::ImportError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 导入导出错误
    // ==========================================
    #[error("文件导入失败: {0}")]
    ImportError(String),

    #[error("文件导出失败: {0}")]
    ExportError(String),

    // ==========================================
    // 配置错误
    // ==========================================
    #[error("配置错误: {0}")]
    ConfigError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<ImportError> for ApiError {
    fn from(err: ImportError) -> Self {
        match err {
            ImportError::UnsupportedFormat(_) => ApiError::InvalidInput(err.to_string()),
            _ => ApiError::ImportError(err.to_string()),
        }
    }
}

impl From<ExportError> for ApiError {
    fn from(err: ExportError) -> Self {
        ApiError::ExportError(err.to_string())
    }
}

impl From<ConfigError> for ApiError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::InvalidRegistry(_) | ConfigError::InvalidValue { .. } => {
                ApiError::ValidationError(err.to_string())
            }
            _ => ApiError::ConfigError(err.to_string()),
        }
    }
}

impl From<LeadBookError> for ApiError {
    fn from(err: LeadBookError) -> Self {
        match err {
            LeadBookError::LeadNotFound(_) | LeadBookError::LostLeadNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            LeadBookError::MissingRequiredField(_) | LeadBookError::EmptyRemark => {
                ApiError::ValidationError(err.to_string())
            }
            _ => ApiError::BusinessRuleViolation(err.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::field::RegistryError;
    use crate::domain::lead::LeadError;

    #[test]
    fn test_import_error_conversion() {
        let api_err: ApiError = ImportError::UnsupportedFormat("pdf".to_string()).into();
        assert!(matches!(api_err, ApiError::InvalidInput(msg) if msg.contains("pdf")));

        let api_err: ApiError = ImportError::CsvParseError("bad quote".to_string()).into();
        assert!(matches!(api_err, ApiError::ImportError(_)));
    }

    #[test]
    fn test_lead_book_error_conversion() {
        let api_err: ApiError = LeadBookError::LeadNotFound("L1".to_string()).into();
        match api_err {
            ApiError::NotFound(msg) => assert!(msg.contains("L1")),
            other => panic!("Expected NotFound, got {:?}", other),
        }

        let api_err: ApiError = LeadBookError::EmptyRemark.into();
        assert!(matches!(api_err, ApiError::ValidationError(_)));

        let api_err: ApiError = LeadBookError::Director(LeadError::LastDirector).into();
        assert!(matches!(api_err, ApiError::BusinessRuleViolation(_)));
    }

    #[test]
    fn test_config_error_conversion() {
        let api_err: ApiError = ConfigError::InvalidRegistry(RegistryError::MissingCompanyName).into();
        assert!(matches!(api_err, ApiError::ValidationError(_)));

        let api_err: ApiError = ConfigError::Database("disk I/O error".to_string()).into();
        assert!(matches!(api_err, ApiError::ConfigError(_)));
    }
}
