// ==========================================
// MCA 线索管理系统 - 引擎层
// ==========================================
// 职责: 线索生命周期规则（活跃集合 + 流失池）
// 红线: 引擎不做文件读写，不读取配置
// ==========================================

pub mod lead_book;

pub use lead_book::{LeadBook, LeadBookError, LeadBookResult, LeadFilter, LeadPatch};
